use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::store::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root URL of the records server, without the `/api` prefix
    pub api_base_url: String,

    /// Page size of the patients list
    pub default_page_size: usize,

    /// Page sizes offered when browsing
    pub page_size_options: Vec<usize>,

    /// Page size of a patient's visit history
    pub visits_page_size: usize,

    /// Page size used when fetching the whole collection
    pub fetch_all_page_size: usize,

    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            visits_page_size: 10,
            fetch_all_page_size: 500,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Initialize configuration from various sources
    pub async fn init() -> Result<Self> {
        Self::init_from(&Self::config_paths()).await
    }

    /// Defaults, then the first of `paths` that exists, then environment.
    /// A missing file is fine; an unreadable or malformed one is an error.
    pub async fn init_from(paths: &[PathBuf]) -> Result<Self> {
        debug!("Initializing configuration");

        let mut config = Self::default();

        if let Some(file_config) = Self::load_from_paths(paths).await? {
            config.merge_with(file_config);
        }

        // Environment wins over files
        config.load_from_env();

        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(&mut self) {
        if let Ok(url) = std::env::var("CLINIC_API_BASE_URL") {
            self.api_base_url = url;
        }

        if let Some(size) = env_number("CLINIC_PAGE_SIZE") {
            self.default_page_size = size;
        }

        if let Some(size) = env_number("CLINIC_VISITS_PAGE_SIZE") {
            self.visits_page_size = size;
        }

        if let Some(size) = env_number("CLINIC_FETCH_ALL_PAGE_SIZE") {
            self.fetch_all_page_size = size;
        }

        if let Some(secs) = env_number("CLINIC_TIMEOUT_SECS") {
            self.request_timeout_secs = secs;
        }
    }

    /// Candidate clinic.json files, highest priority first
    fn config_paths() -> Vec<PathBuf> {
        // 1. ./.clinic.json
        // 2. ./clinic.json
        // 3. $CONFIG_DIR/clinic/clinic.json
        let mut config_paths = vec![
            PathBuf::from("./.clinic.json"),
            PathBuf::from("./clinic.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("clinic").join("clinic.json"));
        }

        config_paths
    }

    /// Load the first of `paths` that exists, or `None` when none does
    pub async fn load_from_paths(paths: &[PathBuf]) -> Result<Option<Self>> {
        for path in paths {
            if path.exists() {
                return Self::load_path(path).await.map(Some);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    async fn load_path(path: &Path) -> Result<Self> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid configuration in {}: {}", path.display(), e))?;
        Ok(config)
    }

    /// Merge another configuration into this one. Fields left at their
    /// default in `other` do not override.
    pub fn merge_with(&mut self, other: Self) {
        let defaults = Self::default();

        if other.api_base_url != defaults.api_base_url {
            self.api_base_url = other.api_base_url;
        }
        if other.default_page_size != defaults.default_page_size {
            self.default_page_size = other.default_page_size;
        }
        if other.page_size_options != defaults.page_size_options {
            self.page_size_options = other.page_size_options;
        }
        if other.visits_page_size != defaults.visits_page_size {
            self.visits_page_size = other.visits_page_size;
        }
        if other.fetch_all_page_size != defaults.fetch_all_page_size {
            self.fetch_all_page_size = other.fetch_all_page_size;
        }
        if other.request_timeout_secs != defaults.request_timeout_secs {
            self.request_timeout_secs = other.request_timeout_secs;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(anyhow::anyhow!(
                "No API base URL configured. Set CLINIC_API_BASE_URL or api_base_url in clinic.json"
            ));
        }

        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "api_base_url must start with http:// or https://, got {}",
                url
            ));
        }

        if self.default_page_size == 0 {
            return Err(anyhow::anyhow!("default_page_size must be greater than 0"));
        }

        if self.page_size_options.iter().any(|&size| size == 0) {
            return Err(anyhow::anyhow!("page_size_options must all be greater than 0"));
        }

        if self.visits_page_size == 0 {
            return Err(anyhow::anyhow!("visits_page_size must be greater than 0"));
        }

        if self.fetch_all_page_size == 0 {
            return Err(anyhow::anyhow!("fetch_all_page_size must be greater than 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}

fn env_number<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}: {:?} is not a number", name, raw);
            None
        }
    }
}
