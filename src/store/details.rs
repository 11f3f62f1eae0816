//! Single-patient detail session

use crate::api::{Paginated, Patient, Visit};

/// The patient being viewed and one server page of their visits.
///
/// The session is keyed by the patient id. Switching to another id clears
/// what is shown; fetching the same id again keeps the old data visible
/// until the new data arrives.
#[derive(Debug, Clone)]
pub struct DetailSession {
    key: Option<String>,
    current: Option<Patient>,
    visits: Vec<Visit>,
    visits_total: usize,
    visits_page: usize,
    visits_page_size: usize,
    default_visits_page_size: usize,
    error: Option<String>,
    /// Detail and visit fetches currently awaiting a response
    pending: usize,
    /// Patient id of the in-flight detail fetch, if any
    detail_in_flight: Option<String>,
}

impl DetailSession {
    pub fn new(visits_page_size: usize) -> Self {
        let visits_page_size = visits_page_size.max(1);
        Self {
            key: None,
            current: None,
            visits: Vec::new(),
            visits_total: 0,
            visits_page: 1,
            visits_page_size,
            default_visits_page_size: visits_page_size,
            error: None,
            pending: 0,
            detail_in_flight: None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn current(&self) -> Option<&Patient> {
        self.current.as_ref()
    }

    pub fn visits(&self) -> &[Visit] {
        &self.visits
    }

    pub fn visits_total(&self) -> usize {
        self.visits_total
    }

    pub fn visits_page(&self) -> usize {
        self.visits_page
    }

    pub fn visits_page_size(&self) -> usize {
        self.visits_page_size
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn loading(&self) -> bool {
        self.pending > 0
    }

    pub fn is_viewing(&self, id: &str) -> bool {
        self.key.as_deref() == Some(id)
    }

    /// Point the session at `id`. Returns true when that cleared the data of
    /// a different patient.
    pub(crate) fn focus(&mut self, id: &str) -> bool {
        if self.is_viewing(id) {
            return false;
        }
        let had_other = self.key.is_some();
        self.clear();
        self.key = Some(id.to_string());
        had_other
    }

    /// Forget the viewed patient entirely
    pub(crate) fn clear(&mut self) {
        self.key = None;
        self.current = None;
        self.visits.clear();
        self.visits_total = 0;
        self.visits_page = 1;
        self.visits_page_size = self.default_visits_page_size;
    }

    pub(crate) fn detail_in_flight(&self) -> Option<&str> {
        self.detail_in_flight.as_deref()
    }

    pub(crate) fn begin_fetch(&mut self, detail_of: Option<&str>) {
        self.pending += 1;
        self.error = None;
        if let Some(id) = detail_of {
            self.detail_in_flight = Some(id.to_string());
        }
    }

    pub(crate) fn end_fetch(&mut self, detail_of: Option<&str>) {
        self.pending = self.pending.saturating_sub(1);
        if detail_of.is_some() && self.detail_in_flight.as_deref() == detail_of {
            self.detail_in_flight = None;
        }
    }

    pub(crate) fn set_current(&mut self, patient: Patient) {
        self.current = Some(patient);
    }

    pub(crate) fn set_visits(&mut self, page: Paginated<Visit>, page_number: usize, page_size: usize) {
        self.visits = page.data;
        self.visits_total = page.meta.total;
        self.visits_page = page_number;
        self.visits_page_size = page_size;
    }

    /// Fold a saved visit into the visible page: a new visit goes on top,
    /// an edited one replaces its old copy.
    pub(crate) fn apply_saved_visit(&mut self, visit: Visit, created: bool) {
        if created {
            self.visits.insert(0, visit);
            self.visits_total += 1;
        } else if let Some(existing) = self.visits.iter_mut().find(|v| v.id == visit.id) {
            *existing = visit;
        }
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
    }
}
