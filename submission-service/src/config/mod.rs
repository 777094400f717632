//! Configuration module for submission-service.

use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_FBR_BASE_URL: &str = "https://gw.fbr.gov.pk/di_data/v1/di";
pub const DEFAULT_PRODUCTION_PATH: &str = "/postinvoicedata";
pub const DEFAULT_SANDBOX_PATH: &str = "/postinvoicedata_sb";

#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub fbr: FbrConfig,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct FbrConfig {
    pub base_url: String,
    pub production_path: String,
    pub sandbox_path: String,
    /// `None` leaves the HTTP client's default in place.
    pub timeout: Option<Duration>,
    /// Send `scenarioId` on production submissions too. FBR only requires it in sandbox.
    pub include_scenario_in_production: bool,
}

impl Default for FbrConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FBR_BASE_URL.to_string(),
            production_path: DEFAULT_PRODUCTION_PATH.to_string(),
            sandbox_path: DEFAULT_SANDBOX_PATH.to_string(),
            timeout: None,
            include_scenario_in_production: false,
        }
    }
}

impl SubmissionConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        Ok(Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "submission-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: Secret::new(env::var("DATABASE_URL").map_err(|_| {
                    AppError::ConfigError(anyhow::anyhow!("DATABASE_URL is required"))
                })?),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2),
            },
            fbr: FbrConfig {
                base_url: env::var("FBR_BASE_URL")
                    .unwrap_or_else(|_| DEFAULT_FBR_BASE_URL.to_string()),
                production_path: env::var("FBR_PRODUCTION_PATH")
                    .unwrap_or_else(|_| DEFAULT_PRODUCTION_PATH.to_string()),
                sandbox_path: env::var("FBR_SANDBOX_PATH")
                    .unwrap_or_else(|_| DEFAULT_SANDBOX_PATH.to_string()),
                timeout: parse_timeout(env::var("FBR_TIMEOUT_SECS").ok().as_deref())?,
                include_scenario_in_production: env::var("FBR_INCLUDE_SCENARIO_IN_PRODUCTION")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
            },
        })
    }
}

fn parse_timeout(raw: Option<&str>) -> Result<Option<Duration>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!(
                    "FBR_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    value
                ))
            }),
    }
}
