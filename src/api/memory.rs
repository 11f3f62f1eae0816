//! In-memory records API used by the store tests

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use uuid::Uuid;

use super::{
    errors::{ApiError, ApiResult},
    provider::{PatientsApi, VisitsApi},
    types::{PageMeta, PageQuery, Paginated, Patient, PatientInput, Record, Visit, VisitInput},
};

/// A patients/visits server held in memory. Every call is counted, a
/// failure can be armed for the next call, and a gate can hold calls in
/// flight until the test releases them.
#[derive(Default)]
pub struct MemoryApi {
    patients: Mutex<Vec<Patient>>,
    visits: Mutex<Vec<Visit>>,
    calls: AtomicUsize,
    fail_next: Mutex<Option<ApiError>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

pub fn patient(id: &str, first: &str, last: &str, phone: &str) -> Patient {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Patient {
        id: id.to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        date_of_birth: Utc.with_ymd_and_hms(1990, 1, 15, 0, 0, 0).unwrap(),
        phone_number: phone.to_string(),
        email: None,
        created_at: at,
        updated_at: at,
        visits: Vec::new(),
    }
}

pub fn visit(id: &str, patient_id: &str, diagnosis: &str) -> Visit {
    let at = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
    Visit {
        id: id.to_string(),
        patient_id: patient_id.to_string(),
        visit_date: at,
        diagnosis: diagnosis.to_string(),
        treatment: "Rest".to_string(),
        status: Default::default(),
        notes: None,
        created_at: at,
        updated_at: at,
        patient: None,
    }
}

/// `count` patients named "First{n} Last{n}" with ids "p{n}"
pub fn numbered_patients(count: usize) -> Vec<Patient> {
    (1..=count)
        .map(|n| {
            patient(
                &format!("p{}", n),
                &format!("First{}", n),
                &format!("Last{}", n),
                &format!("+7900{:04}", n),
            )
        })
        .collect()
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patients(patients: Vec<Patient>) -> Self {
        let api = Self::new();
        *api.patients.lock().unwrap() = patients;
        api
    }

    pub fn with_visits(self, visits: Vec<Visit>) -> Self {
        *self.visits.lock().unwrap() = visits;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: ApiError) {
        *self.fail_next.lock().unwrap() = Some(error);
    }

    /// Hold every following call in flight until `release`
    pub fn hold(&self) {
        *self.gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let every held call through and stop holding new ones
    pub fn release(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }
    }

    async fn enter(&self) -> ApiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        match self.fail_next.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn page_of<T: Clone>(items: Vec<T>, page: usize, limit: usize) -> Paginated<T> {
        let total = items.len();
        let data = items
            .into_iter()
            .skip(page.saturating_sub(1) * limit)
            .take(limit)
            .collect();
        Paginated {
            data,
            meta: PageMeta {
                page,
                limit,
                total,
                total_pages: total.div_ceil(limit.max(1)),
            },
        }
    }

    fn not_found(id: &str) -> ApiError {
        ApiError::NotFound(format!("Patient with ID {} not found", id))
    }
}

#[async_trait]
impl PatientsApi for MemoryApi {
    async fn fetch_page(&self, query: &PageQuery) -> ApiResult<Paginated<Patient>> {
        self.enter().await?;
        let term = query.search.to_lowercase();
        let matching: Vec<Patient> = self
            .patients
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                p.search_fields()
                    .iter()
                    .any(|f| f.to_lowercase().contains(&term))
            })
            .cloned()
            .collect();
        Ok(Self::page_of(matching, query.page, query.limit))
    }

    async fn fetch_all(&self) -> ApiResult<Vec<Patient>> {
        self.enter().await?;
        Ok(self.patients.lock().unwrap().clone())
    }

    async fn fetch_by_id(&self, id: &str) -> ApiResult<Patient> {
        self.enter().await?;
        self.patients
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }

    async fn create(&self, input: &PatientInput) -> ApiResult<Patient> {
        self.enter().await?;
        let mut created = patient(
            &Uuid::new_v4().to_string(),
            input.first_name.as_deref().unwrap_or_default(),
            input.last_name.as_deref().unwrap_or_default(),
            input.phone_number.as_deref().unwrap_or_default(),
        );
        created.email = input.email.clone().flatten();
        self.patients.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn update(&self, id: &str, input: &PatientInput) -> ApiResult<Patient> {
        self.enter().await?;
        let mut patients = self.patients.lock().unwrap();
        let existing = patients
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        if let Some(first) = &input.first_name {
            existing.first_name = first.clone();
        }
        if let Some(last) = &input.last_name {
            existing.last_name = last.clone();
        }
        if let Some(phone) = &input.phone_number {
            existing.phone_number = phone.clone();
        }
        if let Some(email) = &input.email {
            existing.email = email.clone();
        }
        Ok(existing.clone())
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        self.enter().await?;
        let mut patients = self.patients.lock().unwrap();
        let before = patients.len();
        patients.retain(|p| p.id != id);
        if patients.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }
}

#[async_trait]
impl VisitsApi for MemoryApi {
    async fn fetch_visits(
        &self,
        patient_id: &str,
        page: usize,
        limit: usize,
    ) -> ApiResult<Paginated<Visit>> {
        self.enter().await?;
        let visits: Vec<Visit> = self
            .visits
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.patient_id == patient_id)
            .cloned()
            .collect();
        Ok(Self::page_of(visits, page, limit))
    }

    async fn create_visit(&self, patient_id: &str, input: &VisitInput) -> ApiResult<Visit> {
        self.enter().await?;
        let mut created = visit(
            &Uuid::new_v4().to_string(),
            patient_id,
            input.diagnosis.as_deref().unwrap_or_default(),
        );
        if let Some(status) = input.status {
            created.status = status;
        }
        created.notes = input.notes.clone();
        self.visits.lock().unwrap().insert(0, created.clone());
        Ok(created)
    }

    async fn update_visit(
        &self,
        patient_id: &str,
        id: &str,
        input: &VisitInput,
    ) -> ApiResult<Visit> {
        self.enter().await?;
        let mut visits = self.visits.lock().unwrap();
        let existing = visits
            .iter_mut()
            .find(|v| v.id == id && v.patient_id == patient_id)
            .ok_or_else(|| ApiError::NotFound(format!("Visit with ID {} not found", id)))?;
        if let Some(diagnosis) = &input.diagnosis {
            existing.diagnosis = diagnosis.clone();
        }
        if let Some(status) = input.status {
            existing.status = status;
        }
        if input.notes.is_some() {
            existing.notes = input.notes.clone();
        }
        Ok(existing.clone())
    }
}
