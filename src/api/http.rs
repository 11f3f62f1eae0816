//! JSON-over-HTTP client for the records API

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, trace};

use super::{
    errors::{ApiError, ApiResult},
    provider::{PatientsApi, VisitsApi},
    types::{PageQuery, Paginated, Patient, PatientInput, Visit, VisitInput},
};
use crate::config::Config;

/// reqwest-backed client implementing both collections
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    fetch_all_page_size: usize,
}

/// Visit bodies carry the owning patient next to the editable fields
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VisitBody<'a> {
    patient_id: &'a str,
    #[serde(flatten)]
    input: &'a VisitInput,
}

impl ApiClient {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> ApiResult<Self> {
        if config.fetch_all_page_size == 0 {
            return Err(ApiError::ConfigError(
                "fetch_all_page_size must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("clinic-records/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/api", config.api_base_url.trim_end_matches('/')),
            fetch_all_page_size: config.fetch_all_page_size,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ApiResult<T> {
        let request = self.client.get(self.url(endpoint)).query(params);
        self.send(request).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.client.post(self.url(endpoint)).json(body);
        self.send(request).await
    }

    async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ApiResult<T> {
        let request = self.client.patch(self.url(endpoint)).json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let response = Self::checked(request).await?;
        let text = response.text().await?;
        trace!("Response body: {} bytes", text.len());
        Ok(serde_json::from_str(&text)?)
    }

    /// Send a request and turn non-success statuses into `ApiError`
    async fn checked(request: RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        debug!("Request failed with {}: {}", status, message);

        if status == StatusCode::NOT_FOUND {
            Err(ApiError::NotFound(message))
        } else {
            Err(ApiError::Transport {
                status: Some(status.as_u16()),
                message,
            })
        }
    }

    async fn patients_page(&self, query: &PageQuery) -> ApiResult<Paginated<Patient>> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
        ];

        // The plain listing ignores search terms, the search endpoint honours them
        let term = query.search.trim();
        if term.is_empty() {
            self.get("/patients", &params).await
        } else {
            params.push(("q", term.to_string()));
            self.get("/patients/search", &params).await
        }
    }
}

/// Extract the human-readable message from an error response body
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    let json = match serde_json::from_str::<Value>(body) {
        Ok(json) => json,
        Err(_) => return "Request failed".to_string(),
    };

    match json.get("message") {
        Some(Value::String(message)) if !message.is_empty() => message.clone(),
        Some(Value::Array(messages)) if !messages.is_empty() => messages
            .iter()
            .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
            .collect::<Vec<_>>()
            .join(", "),
        _ => format!("HTTP {}", status.as_u16()),
    }
}

#[async_trait]
impl PatientsApi for ApiClient {
    async fn fetch_page(&self, query: &PageQuery) -> ApiResult<Paginated<Patient>> {
        debug!(
            "Fetching patients page {} (limit {}, search {:?})",
            query.page, query.limit, query.search
        );
        self.patients_page(query).await
    }

    async fn fetch_all(&self) -> ApiResult<Vec<Patient>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let response = self
                .patients_page(&PageQuery::new(page, self.fetch_all_page_size))
                .await?;
            let received = response.data.len();
            all.extend(response.data);

            if received == 0 || page >= response.meta.total_pages {
                break;
            }
            page += 1;
        }

        debug!("Fetched {} patients in {} page(s)", all.len(), page);
        Ok(all)
    }

    async fn fetch_by_id(&self, id: &str) -> ApiResult<Patient> {
        self.get(&format!("/patients/{}", id), &[]).await
    }

    async fn create(&self, input: &PatientInput) -> ApiResult<Patient> {
        self.post("/patients", input).await
    }

    async fn update(&self, id: &str, input: &PatientInput) -> ApiResult<Patient> {
        self.patch(&format!("/patients/{}", id), input).await
    }

    async fn delete(&self, id: &str) -> ApiResult<()> {
        let request = self.client.delete(self.url(&format!("/patients/{}", id)));
        Self::checked(request).await?;
        Ok(())
    }
}

#[async_trait]
impl VisitsApi for ApiClient {
    async fn fetch_visits(
        &self,
        patient_id: &str,
        page: usize,
        limit: usize,
    ) -> ApiResult<Paginated<Visit>> {
        let params = [("page", page.to_string()), ("limit", limit.to_string())];
        self.get(&format!("/patients/{}/visits", patient_id), &params)
            .await
    }

    async fn create_visit(&self, patient_id: &str, input: &VisitInput) -> ApiResult<Visit> {
        self.post("/visits", &VisitBody { patient_id, input }).await
    }

    async fn update_visit(
        &self,
        patient_id: &str,
        id: &str,
        input: &VisitInput,
    ) -> ApiResult<Visit> {
        self.patch(&format!("/visits/{}", id), &VisitBody { patient_id, input })
            .await
    }
}
