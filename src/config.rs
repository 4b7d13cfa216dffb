use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Device label on the telemetry service
    #[serde(default = "default_device_label")]
    pub device_label: String,

    /// Variable receiving numeric action codes
    #[serde(default = "default_action_label")]
    pub action_label: String,

    /// Variable holding the heading target angle
    #[serde(default = "default_target_label")]
    pub target_label: String,

    /// Variable reporting the rover's compass reading
    #[serde(default = "default_compass_label")]
    pub compass_label: String,

    /// Telemetry API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Auth token sent with every request (no default)
    #[serde(default)]
    pub auth_token: String,

    /// Source tag stamped into every write context
    #[serde(default = "default_source_tag")]
    pub source_tag: String,

    /// Heading-completion poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum heading-completion poll attempts before timing out
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// Per-request HTTP timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_device_label() -> String {
    "wroom".to_string()
}

fn default_action_label() -> String {
    "action".to_string()
}

fn default_target_label() -> String {
    "target".to_string()
}

fn default_compass_label() -> String {
    "compass".to_string()
}

fn default_api_url() -> String {
    "https://industrial.api.ubidots.com/api/v1.6".to_string()
}

fn default_source_tag() -> String {
    "rover-console".to_string()
}

fn default_poll_interval_ms() -> u64 {
    5000
}

fn default_poll_max_attempts() -> u32 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_label: default_device_label(),
            action_label: default_action_label(),
            target_label: default_target_label(),
            compass_label: default_compass_label(),
            api_url: default_api_url(),
            auth_token: String::new(),
            source_tag: default_source_tag(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_attempts: default_poll_max_attempts(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(device = %config.device_label, api = %config.api_url, "configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.device_label, "wroom");
        assert_eq!(config.action_label, "action");
        assert_eq!(config.target_label, "target");
        assert_eq!(config.compass_label, "compass");
        assert_eq!(config.poll_interval_ms, 5000);
        assert_eq!(config.poll_max_attempts, 30);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.auth_token.is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
device_label = "rover-01"
auth_token = "BBUS-test"
poll_interval_ms = 100
request_timeout_secs = 5
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.device_label, "rover-01");
        assert_eq!(config.auth_token, "BBUS-test");
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.request_timeout_secs, 5);
        // Unspecified fields fall back to defaults
        assert_eq!(config.action_label, "action");
        assert_eq!(config.poll_max_attempts, 30);
    }

    #[test]
    fn test_from_file_missing() {
        assert!(Config::from_file("/nonexistent/rover.toml").is_err());
    }
}
