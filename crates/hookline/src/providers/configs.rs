use serde::{Deserialize, Serialize};

/// Local converse-stream gateway; see [`super::converse::ConverseProvider`]
/// for the protocol it must speak.
pub const DEFAULT_HOST: &str = "http://127.0.0.1:8080";
pub const DEFAULT_MODEL_ID: &str = "mistral.mistral-large-2402-v1:0";
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverseProviderConfig {
    pub host: String,
    pub model_id: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ConverseProviderConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_gateway() {
        let config = ConverseProviderConfig::default();
        assert_eq!(config.host, "http://127.0.0.1:8080");
        assert!(!config.host.contains("amazonaws.com"));
        assert_eq!(config.api_key, None);
    }
}
