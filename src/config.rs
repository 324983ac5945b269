//! Application configuration
//!
//! All values are defaulted so the tool runs with no config file at all; an
//! optional `repricer.yaml` next to the working directory (or passed with
//! `--config`) overrides the service endpoint and the extraction layout.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RepricerResult;
use crate::extract::ExtractionConfig;

/// Default config filename looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "repricer.yaml";

/// Remote service endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the backend exposing the reconciliation and price-search
    /// endpoints.
    pub base_url: String,
    /// Hard timeout in seconds for file reconciliation and one-shot search.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> RepricerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_yaml::from_str(&contents)?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load from an explicit path, else from `repricer.yaml` when present,
    /// else defaults.
    pub fn load_or_default(path: Option<&Path>) -> RepricerResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
