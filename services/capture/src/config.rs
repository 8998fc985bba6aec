//! Capture client configuration.

use serde::Deserialize;

/// Capture client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    /// Upload endpoint of the selfie service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_endpoint() -> String {
    "http://localhost:6005/api/upload".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            log_level: default_log_level(),
        }
    }
}

impl CaptureConfig {
    /// Load configuration from an optional config file and the environment
    pub fn load() -> anyhow::Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/capture").required(false))
            // CAPTURE__ENDPOINT -> endpoint
            .add_source(config::Environment::with_prefix("CAPTURE").separator("__"))
            .build()?;

        config.try_deserialize().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_matches_service_defaults() {
        let config = CaptureConfig::default();
        assert_eq!(config.endpoint, "http://localhost:6005/api/upload");
        assert_eq!(config.log_level, "info");
    }
}
