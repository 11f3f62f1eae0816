//! Records API abstractions and the HTTP client
//!
//! This module defines the remote collaborator the store talks to: the
//! patients and visits collections, their wire types, and the error
//! taxonomy surfaced to the user.

pub mod errors;
pub mod http;
pub mod provider;
pub mod types;

#[cfg(test)]
pub mod memory;

pub use errors::*;
pub use http::ApiClient;
pub use provider::*;
pub use types::*;
