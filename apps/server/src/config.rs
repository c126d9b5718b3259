//! Configuration management for the MPI service.

use serde::Deserialize;
use std::net::SocketAddr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub clinical: ClinicalStoreConfig,
    pub otp: OtpConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Downstream clinical resource server (FHIR REST API).
#[derive(Debug, Clone, Deserialize)]
pub struct ClinicalStoreConfig {
    #[serde(default = "default_clinical_base_url")]
    pub base_url: String,
}

/// One-time-code issuance/validation service.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    #[serde(default = "default_otp_base_url")]
    pub base_url: String,
    /// Per-call timeout; 0 disables the explicit timeout and the caller's
    /// deadline applies alone.
    #[serde(default = "default_otp_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON formatting for logs (recommended for production)
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_clinical_base_url() -> String {
    "http://localhost:8090/fhir".to_string()
}

fn default_otp_base_url() -> String {
    "http://localhost:8091/otp".to_string()
}

fn default_otp_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from defaults, an optional `config.*` file and
    /// `MPI__`-prefixed environment variables (double underscore maps to
    /// nesting: `MPI__CLINICAL__BASE_URL` → `clinical.base_url`).
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("clinical.base_url", default_clinical_base_url())?
            .set_default("otp.base_url", default_otp_base_url())?
            .set_default("otp.request_timeout_seconds", default_otp_timeout() as i64)?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("MPI")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        Ok(addr.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.clinical.base_url.is_empty() {
            return Err("clinical.base_url must be set".to_string());
        }
        if self.otp.base_url.is_empty() {
            return Err("otp.base_url must be set".to_string());
        }
        Ok(())
    }
}
