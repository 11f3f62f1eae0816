//! Async orchestration of the patients list and the detail session.
//!
//! `PatientsStore` owns both state slices and is the only thing that
//! mutates them. Every remote call follows the same shape: take the lock,
//! check and mark the slice, release the lock, await the collaborator, take
//! the lock again and apply the result. Locks are never held across a
//! network round-trip, so the list and the detail session make progress
//! independently.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::{
    details::DetailSession,
    errors::{StoreError, StoreResult},
    list_cache::{ListCache, View},
    pagination::{compute, PaginationInfo},
};
use crate::api::{
    PageQuery, Patient, PatientInput, PatientsApi, Visit, VisitInput, VisitsApi,
};
use crate::config::Config;

/// Where the list's rows come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Each page is fetched from the server as-is
    Direct,
    /// The whole collection is cached and filtered locally
    FullCache,
}

/// What a load action did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The fetch ran and its result was applied
    Loaded,
    /// A fetch for the same resource was already in flight; nothing was sent
    Skipped,
    /// The response arrived for a record no longer being viewed and was dropped
    Discarded,
}

/// Arguments of a direct page load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Defaults to 1
    pub page: Option<usize>,
    /// Required
    pub page_size: Option<usize>,
    /// Defaults to the current search term
    pub search: Option<String>,
}

impl LoadOptions {
    pub fn page(page: usize, page_size: usize) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
            search: None,
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Read-only copy of the list slice handed to the UI
#[derive(Debug, Clone, PartialEq)]
pub struct ListState {
    pub items: Vec<Patient>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub search: String,
    pub mode: ListMode,
    pub loading: bool,
    pub error: Option<String>,
}

impl ListState {
    pub fn info(&self) -> PaginationInfo {
        compute(self.total, self.page_size, self.page)
    }
}

#[derive(Debug)]
struct ListSlice {
    cache: ListCache<Patient>,
    mode: ListMode,
    /// Last server page, shown in `Direct` mode
    remote: View<Patient>,
    loading: bool,
    error: Option<String>,
}

impl ListSlice {
    fn new(page_size: usize) -> Self {
        Self {
            cache: ListCache::new(page_size),
            mode: ListMode::Direct,
            remote: View {
                items: Vec::new(),
                total: 0,
                page: 1,
                page_size,
            },
            loading: false,
            error: None,
        }
    }

    fn view(&self) -> &View<Patient> {
        match self.mode {
            ListMode::Direct => &self.remote,
            ListMode::FullCache => self.cache.view(),
        }
    }

    fn state(&self) -> ListState {
        let view = self.view();
        ListState {
            items: view.items.clone(),
            total: view.total,
            page: view.page,
            page_size: view.page_size,
            search: self.cache.search().to_string(),
            mode: self.mode,
            loading: self.loading,
            error: self.error.clone(),
        }
    }

    fn apply_create(&mut self, patient: Patient) {
        self.cache.apply_create(patient);
    }

    fn apply_update(&mut self, patient: Patient) {
        if let Some(row) = self.remote.items.iter_mut().find(|p| p.id == patient.id) {
            *row = patient.clone();
        }
        self.cache.apply_update(patient);
    }

    fn apply_delete(&mut self, id: &str) {
        let before = self.remote.items.len();
        self.remote.items.retain(|p| p.id != id);
        if self.remote.items.len() != before {
            self.remote.total = self.remote.total.saturating_sub(1);
        }
        self.cache.apply_delete(id);
    }
}

/// Coordinates the records API with the locally held list and detail state
pub struct PatientsStore {
    patients: Arc<dyn PatientsApi>,
    visits: Arc<dyn VisitsApi>,
    list: RwLock<ListSlice>,
    details: RwLock<DetailSession>,
}

impl PatientsStore {
    /// Create a store with empty slices
    pub fn new(
        patients: Arc<dyn PatientsApi>,
        visits: Arc<dyn VisitsApi>,
        page_size: usize,
        visits_page_size: usize,
    ) -> Self {
        Self {
            patients,
            visits,
            list: RwLock::new(ListSlice::new(page_size.max(1))),
            details: RwLock::new(DetailSession::new(visits_page_size)),
        }
    }

    /// Create a store whose page sizes come from configuration
    pub fn from_config<A>(api: Arc<A>, config: &Config) -> Self
    where
        A: PatientsApi + VisitsApi + 'static,
    {
        Self::new(
            api.clone(),
            api,
            config.default_page_size,
            config.visits_page_size,
        )
    }

    fn invalid(action: &str, reason: &str) -> StoreError {
        error!("Rejected {}: {}", action, reason);
        StoreError::InvalidRequest(format!("{}: {}", action, reason))
    }

    /// Copy of the list slice
    pub async fn list(&self) -> ListState {
        self.list.read().await.state()
    }

    /// Copy of the cached snapshot
    #[cfg(test)]
    pub async fn snapshot(&self) -> Vec<Patient> {
        self.list.read().await.cache.snapshot().to_vec()
    }

    /// Copy of the detail session
    pub async fn details(&self) -> DetailSession {
        self.details.read().await.clone()
    }

    /// Update the search term without filtering yet
    pub async fn set_search(&self, term: impl Into<String>) {
        self.list.write().await.cache.set_search(term);
    }

    pub async fn clear_error(&self) {
        self.list.write().await.error = None;
        self.details.write().await.clear_error();
    }

    /// Fetch one server page into the list
    pub async fn load_patients(&self, options: LoadOptions) -> StoreResult<LoadOutcome> {
        let query = {
            let mut list = self.list.write().await;
            if list.loading {
                debug!("Patients list already loading, skipping page load");
                return Ok(LoadOutcome::Skipped);
            }

            let page_size = match options.page_size {
                Some(size) if size > 0 => size,
                Some(_) => return Err(Self::invalid("load_patients", "page_size must be positive")),
                None => return Err(Self::invalid("load_patients", "page_size is required")),
            };
            let page = options.page.unwrap_or(1);
            if page == 0 {
                return Err(Self::invalid("load_patients", "page must be positive"));
            }
            let search = options
                .search
                .unwrap_or_else(|| list.cache.search().to_string());

            list.loading = true;
            list.error = None;
            PageQuery::new(page, page_size).with_search(search)
        };

        let result = self.patients.fetch_page(&query).await;

        let mut list = self.list.write().await;
        list.loading = false;
        match result {
            Ok(response) => {
                debug!(
                    "Loaded patients page {} ({} of {})",
                    query.page,
                    response.data.len(),
                    response.meta.total
                );
                list.mode = ListMode::Direct;
                list.cache.set_search(query.search.clone());
                list.remote = View {
                    items: response.data,
                    total: response.meta.total,
                    page: query.page,
                    page_size: query.limit,
                };
                Ok(LoadOutcome::Loaded)
            }
            Err(e) => {
                warn!("Failed to load patients page {}: {}", query.page, e);
                list.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Fetch the whole collection into the cache and show page 1
    pub async fn load_all_patients(&self) -> StoreResult<LoadOutcome> {
        {
            let mut list = self.list.write().await;
            if list.loading {
                debug!("Patients list already loading, skipping full load");
                return Ok(LoadOutcome::Skipped);
            }
            list.loading = true;
            list.error = None;
        }

        let result = self.patients.fetch_all().await;

        let mut list = self.list.write().await;
        list.loading = false;
        match result {
            Ok(patients) => {
                list.cache.load(patients);
                list.mode = ListMode::FullCache;
                info!("Cached {} patients", list.cache.snapshot().len());
                Ok(LoadOutcome::Loaded)
            }
            Err(e) => {
                warn!("Failed to load all patients: {}", e);
                list.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Recompute the cached list for the current search term. `page`
    /// defaults to 1, `page_size` to the current one.
    pub async fn filter_patients(
        &self,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> StoreResult<()> {
        if page == Some(0) {
            return Err(Self::invalid("filter_patients", "page must be positive"));
        }
        if page_size == Some(0) {
            return Err(Self::invalid("filter_patients", "page_size must be positive"));
        }

        let mut list = self.list.write().await;
        list.mode = ListMode::FullCache;
        list.cache.refilter(page, page_size);
        Ok(())
    }

    /// Create a patient, or update the one with `id`. The list only changes
    /// once the server has accepted the change.
    pub async fn save_patient(
        &self,
        id: Option<&str>,
        input: &PatientInput,
    ) -> StoreResult<Patient> {
        if id.is_some_and(|id| id.trim().is_empty()) {
            return Err(Self::invalid("save_patient", "id must not be blank"));
        }

        let result = match id {
            Some(id) => self.patients.update(id, input).await,
            None => self.patients.create(input).await,
        };

        let saved = match result {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Failed to save patient: {}", e);
                self.list.write().await.error = Some(e.to_string());
                return Err(e.into());
            }
        };

        {
            let mut list = self.list.write().await;
            if id.is_some() {
                list.apply_update(saved.clone());
            } else {
                list.apply_create(saved.clone());
            }
        }

        let mut details = self.details.write().await;
        if details.is_viewing(&saved.id) {
            details.set_current(saved.clone());
        }

        info!("Saved patient {}", saved.id);
        Ok(saved)
    }

    /// Delete a patient and drop it from the list
    pub async fn delete_patient(&self, id: &str) -> StoreResult<()> {
        if id.trim().is_empty() {
            return Err(Self::invalid("delete_patient", "id must not be blank"));
        }

        if let Err(e) = self.patients.delete(id).await {
            warn!("Failed to delete patient {}: {}", id, e);
            self.list.write().await.error = Some(e.to_string());
            return Err(e.into());
        }

        self.list.write().await.apply_delete(id);

        let mut details = self.details.write().await;
        if details.is_viewing(id) {
            details.clear();
        }

        info!("Deleted patient {}", id);
        Ok(())
    }

    /// Load a single patient into the detail session
    pub async fn load_patient_details(&self, id: &str) -> StoreResult<LoadOutcome> {
        if id.trim().is_empty() {
            return Err(Self::invalid("load_patient_details", "id must not be blank"));
        }

        {
            let mut details = self.details.write().await;
            if details.detail_in_flight() == Some(id) {
                debug!("Patient {} already loading, skipping", id);
                return Ok(LoadOutcome::Skipped);
            }
            if details.focus(id) {
                debug!("Switched detail session to patient {}", id);
            }
            details.begin_fetch(Some(id));
        }

        let result = self.patients.fetch_by_id(id).await;

        let mut details = self.details.write().await;
        details.end_fetch(Some(id));
        if !details.is_viewing(id) {
            debug!("Dropping details of patient {} no longer viewed", id);
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(patient) => {
                details.set_current(patient);
                Ok(LoadOutcome::Loaded)
            }
            Err(e) => {
                warn!("Failed to load patient {}: {}", id, e);
                details.set_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Fetch one server page of a patient's visits. Always hits the server;
    /// `page` and `page_size` default to the session's current ones.
    pub async fn load_visits(
        &self,
        patient_id: &str,
        page: Option<usize>,
        page_size: Option<usize>,
    ) -> StoreResult<LoadOutcome> {
        if patient_id.trim().is_empty() {
            return Err(Self::invalid("load_visits", "patient id must not be blank"));
        }
        if page == Some(0) || page_size == Some(0) {
            return Err(Self::invalid("load_visits", "page and page_size must be positive"));
        }

        let (page, page_size) = {
            let mut details = self.details.write().await;
            details.focus(patient_id);
            let page = page.unwrap_or(details.visits_page());
            let page_size = page_size.unwrap_or(details.visits_page_size());
            details.begin_fetch(None);
            (page, page_size)
        };

        let result = self.visits.fetch_visits(patient_id, page, page_size).await;

        let mut details = self.details.write().await;
        details.end_fetch(None);
        if !details.is_viewing(patient_id) {
            debug!("Dropping visits of patient {} no longer viewed", patient_id);
            return Ok(LoadOutcome::Discarded);
        }

        match result {
            Ok(response) => {
                debug!(
                    "Loaded visits page {} of patient {} ({} of {})",
                    page,
                    patient_id,
                    response.data.len(),
                    response.meta.total
                );
                details.set_visits(response, page, page_size);
                Ok(LoadOutcome::Loaded)
            }
            Err(e) => {
                warn!("Failed to load visits of patient {}: {}", patient_id, e);
                details.set_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Create a visit for `patient_id`, or update the visit with `visit_id`
    pub async fn save_visit(
        &self,
        patient_id: &str,
        visit_id: Option<&str>,
        input: &VisitInput,
    ) -> StoreResult<Visit> {
        if patient_id.trim().is_empty() {
            return Err(Self::invalid("save_visit", "patient id must not be blank"));
        }

        let result = match visit_id {
            Some(id) => self.visits.update_visit(patient_id, id, input).await,
            None => self.visits.create_visit(patient_id, input).await,
        };

        let mut details = self.details.write().await;
        match result {
            Ok(visit) => {
                if details.is_viewing(patient_id) {
                    details.apply_saved_visit(visit.clone(), visit_id.is_none());
                }
                info!("Saved visit {} of patient {}", visit.id, patient_id);
                Ok(visit)
            }
            Err(e) => {
                warn!("Failed to save visit of patient {}: {}", patient_id, e);
                if details.is_viewing(patient_id) {
                    details.set_error(e.to_string());
                }
                Err(e.into())
            }
        }
    }
}
