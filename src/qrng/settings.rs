//! Where to fetch random bytes from, and how long to wait.
use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_ENDPOINT: &str = "https://qrng.anu.edu.au/API/jsonI.php";
pub const DEFAULT_TIMEOUT_SECS: f64 = 5.0;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub endpoint: String,
    pub timeout_secs: f64,
    /// Honour `HTTP_PROXY` and friends.
    pub system_proxy: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        SourceSettings {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            system_proxy: true,
        }
    }
}

impl SourceSettings {
    pub fn from_json(json: &str) -> Result<SourceSettings, ConfigError> {
        let settings: SourceSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<SourceSettings, ConfigError> {
        let contents = fs::read_to_string(path)?;
        SourceSettings::from_json(&contents)
    }

    /// Applies command line overrides on top of whatever was loaded.
    pub fn with_overrides(
        mut self,
        endpoint: Option<String>,
        timeout_secs: Option<f64>,
    ) -> Result<SourceSettings, ConfigError> {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(timeout_secs) = timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "timeout_secs must be positive, got {}",
                self.timeout_secs
            )));
        }
        Ok(())
    }
}
