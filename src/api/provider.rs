//! Remote collaborator traits for the records API

use async_trait::async_trait;

use crate::api::{
    errors::ApiResult,
    types::{PageQuery, Paginated, Patient, PatientInput, Visit, VisitInput},
};

/// Access to the patients collection of the system of record
#[async_trait]
pub trait PatientsApi: Send + Sync {
    /// Fetch one page, optionally narrowed by a search term
    async fn fetch_page(&self, query: &PageQuery) -> ApiResult<Paginated<Patient>>;

    /// Fetch the whole collection, however large
    async fn fetch_all(&self) -> ApiResult<Vec<Patient>>;

    /// Fetch a single patient; fails with `NotFound` when absent
    async fn fetch_by_id(&self, id: &str) -> ApiResult<Patient>;

    async fn create(&self, input: &PatientInput) -> ApiResult<Patient>;

    async fn update(&self, id: &str, input: &PatientInput) -> ApiResult<Patient>;

    async fn delete(&self, id: &str) -> ApiResult<()>;
}

/// Access to the visits nested under a patient
#[async_trait]
pub trait VisitsApi: Send + Sync {
    async fn fetch_visits(
        &self,
        patient_id: &str,
        page: usize,
        limit: usize,
    ) -> ApiResult<Paginated<Visit>>;

    async fn create_visit(&self, patient_id: &str, input: &VisitInput) -> ApiResult<Visit>;

    async fn update_visit(
        &self,
        patient_id: &str,
        id: &str,
        input: &VisitInput,
    ) -> ApiResult<Visit>;
}
