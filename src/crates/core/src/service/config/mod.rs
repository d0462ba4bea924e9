//! Configuration
//!
//! Loaded from a TOML file (by default `<config dir>/datapilot/config.toml`)
//! and then overridden from `DATAPILOT_*` environment variables.

use crate::agentic::goals::RunOptions;
use crate::util::errors::{DataPilotError, DataPilotResult};
use datapilot_transport::HttpTransportConfig;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BASE_URL: &str = "DATAPILOT_BASE_URL";
pub const ENV_AUTH_TOKEN: &str = "DATAPILOT_AUTH_TOKEN";
pub const ENV_USER_ID: &str = "DATAPILOT_USER_ID";

const CONFIG_DIR_NAME: &str = "datapilot";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPilotConfig {
    pub backend: BackendConfig,
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub stream_path: String,
    pub auth_token: Option<String>,
    pub user_id: Option<String>,
    /// Extra request headers.
    pub headers: HashMap<String, String>,
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            stream_path: "/api/task/stream".to_string(),
            auth_token: None,
            user_id: None,
            headers: HashMap::new(),
            connect_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Keep running the remaining goals after one fails.
    pub continue_on_failure: bool,
    /// Fail a goal whose stream delivers nothing for this long. Disabled when unset.
    pub idle_timeout_secs: Option<u64>,
    /// Buffer size of the goal event channel.
    pub event_capacity: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            continue_on_failure: false,
            idle_timeout_secs: None,
            event_capacity: 256,
        }
    }
}

impl DataPilotConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn from_toml_str(text: &str) -> DataPilotResult<Self> {
        toml::from_str(text).map_err(|e| DataPilotError::config(format!("Invalid config: {}", e)))
    }

    pub async fn load(path: &Path) -> DataPilotResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            DataPilotError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        debug!("Loaded config file: path={}", path.display());
        Self::from_toml_str(&text)
    }

    /// Loads `path` when given, otherwise the default file if it exists, otherwise
    /// defaults. Environment overrides are applied and the result validated.
    pub async fn resolve(path: Option<&Path>) -> DataPilotResult<Self> {
        let mut config = match path {
            Some(path) => Self::load(path).await?,
            None => match Self::default_path() {
                Some(default) if default.exists() => Self::load(&default).await?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(base_url) = value(ENV_BASE_URL) {
            self.backend.base_url = base_url;
        }
        if let Some(token) = value(ENV_AUTH_TOKEN) {
            self.backend.auth_token = Some(token);
        }
        if let Some(user_id) = value(ENV_USER_ID) {
            self.backend.user_id = Some(user_id);
        }
    }

    pub fn validate(&self) -> DataPilotResult<()> {
        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            return Err(DataPilotError::config("backend.base_url is empty"));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(DataPilotError::config(format!(
                "backend.base_url must be an http(s) URL: {}",
                base_url
            )));
        }
        if self.execution.idle_timeout_secs == Some(0) {
            return Err(DataPilotError::config(
                "execution.idle_timeout_secs must be greater than 0",
            ));
        }
        if self.execution.event_capacity == 0 {
            return Err(DataPilotError::config(
                "execution.event_capacity must be greater than 0",
            ));
        }
        Ok(())
    }

    pub fn http_transport_config(&self) -> HttpTransportConfig {
        let mut config = HttpTransportConfig::new(self.backend.base_url.clone());
        config.stream_path = self.backend.stream_path.clone();
        config.auth_token = self.backend.auth_token.clone();
        config.user_id = self.backend.user_id.clone();
        config.headers = self.backend.headers.clone();
        config.connect_timeout = Duration::from_secs(self.backend.connect_timeout_secs);
        config
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.execution.idle_timeout_secs.map(Duration::from_secs)
    }

    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            continue_on_failure: self.execution.continue_on_failure,
            event_capacity: self.execution.event_capacity,
        }
    }
}
