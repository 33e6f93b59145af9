use crate::error::ConfigError;
use config::{Config, Environment, File};
use hookline::providers::configs::{
    ConverseProviderConfig, DEFAULT_HOST, DEFAULT_MODEL_ID, DEFAULT_TIMEOUT_SECS,
};
use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|source| ConfigError::InvalidAddress { addr, source })
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_host")]
    pub host: String,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            host: default_provider_host(),
            model_id: default_model_id(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ProviderSettings {
    // Convert to the hookline provider config
    pub fn into_config(self) -> ConverseProviderConfig {
        ConverseProviderConfig {
            host: self.host,
            model_id: self.model_id,
            api_key: self.api_key,
            timeout_secs: self.timeout_secs,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub provider: ProviderSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Provider defaults
            .set_default("provider.host", default_provider_host())?
            .set_default("provider.model_id", default_model_id())?
            .set_default("provider.timeout_secs", default_timeout_secs())?
            // Optional hookline.toml in the working directory
            .add_source(File::with_name("hookline").required(false))
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("HOOKLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = config.try_deserialize().map_err(|err| {
            tracing::debug!("Configuration error: {:?}", &err);
            ConfigError::Other(err)
        })?;
        Ok(settings)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_provider_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
