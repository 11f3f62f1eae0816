//! Wire types for the records API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record that can live in a list cache: it has a stable identifier and
/// a fixed set of fields the search box looks at.
pub trait Record: Clone + Send + Sync {
    /// Stable unique identifier
    fn id(&self) -> &str;

    /// Fields matched by the search predicate
    fn search_fields(&self) -> Vec<&str>;
}

/// A patient as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: DateTime<Utc>,
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Embedded visits, newest first. Only present on some endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visits: Vec<Visit>,
}

impl Patient {
    /// "Last First", the way the list shows names
    pub fn display_name(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }
}

impl Record for Patient {
    fn id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.phone_number.as_str(),
        ];
        if let Some(email) = &self.email {
            fields.push(email.as_str());
        }
        fields
    }
}

/// Lifecycle of a visit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    #[default]
    Scheduled,
    Completed,
    #[serde(alias = "CANCELED")]
    Cancelled,
}

impl VisitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitStatus::Scheduled => "SCHEDULED",
            VisitStatus::Completed => "COMPLETED",
            VisitStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for VisitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SCHEDULED" => Ok(VisitStatus::Scheduled),
            "COMPLETED" => Ok(VisitStatus::Completed),
            "CANCELLED" | "CANCELED" => Ok(VisitStatus::Cancelled),
            other => Err(format!("unknown visit status: {}", other)),
        }
    }
}

/// A visit of a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: String,
    pub patient_id: String,
    pub visit_date: DateTime<Utc>,
    pub diagnosis: String,
    pub treatment: String,
    #[serde(default)]
    pub status: VisitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<Box<Patient>>,
}


/// Body for creating or patching a patient. Absent fields are left out of
/// the request so a PATCH only touches what was given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// `Some(None)` is sent as `null` and clears the stored email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<String>>,
}

/// Body for creating or patching a visit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub treatment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VisitStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Paging metadata attached to every list response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// One server-side page of records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

/// Parameters of a single page fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: usize,
    pub limit: usize,
    pub search: String,
}

impl PageQuery {
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page,
            limit,
            search: String::new(),
        }
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }
}
