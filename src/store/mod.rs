//! Client-side state for the records browser
//!
//! The list of patients (paginated, searchable, optionally cached in full)
//! and the single-patient detail session, plus the orchestrator that keeps
//! both in step with the remote API.

pub mod details;
pub mod errors;
pub mod list_cache;
pub mod orchestrator;
pub mod pagination;

pub use details::DetailSession;
pub use errors::StoreError;
pub use orchestrator::{ListMode, ListState, LoadOptions, PatientsStore};
pub use pagination::{compute, PageMarker, Pagination, PaginationInfo, DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};
