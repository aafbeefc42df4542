use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::workflows::prioritization::{
    Category, PrioritizationEngine, SlaTable, DEFAULT_SLA_DAYS, DEFAULT_URGENT_THRESHOLD_DAYS,
};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub prioritization: PrioritizationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            prioritization: PrioritizationConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// SLA table and queue thresholds used when ranking requests.
///
/// `APP_SLA_DAYS` takes `code=days` pairs separated by commas and is applied
/// on top of the standard municipal table, e.g.
/// `APP_SLA_DAYS=aviz_preliminar=10,altele=45`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrioritizationConfig {
    pub default_sla_days: u32,
    pub sla_overrides: Vec<(Category, u32)>,
    pub urgent_threshold_days: i64,
}

impl Default for PrioritizationConfig {
    fn default() -> Self {
        Self {
            default_sla_days: DEFAULT_SLA_DAYS,
            sla_overrides: Vec::new(),
            urgent_threshold_days: DEFAULT_URGENT_THRESHOLD_DAYS,
        }
    }
}

impl PrioritizationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let default_sla_days = match env::var("APP_SLA_DEFAULT_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidSlaDays { value: raw })?,
            Err(_) => DEFAULT_SLA_DAYS,
        };

        let sla_overrides = match env::var("APP_SLA_DAYS") {
            Ok(raw) => parse_sla_overrides(&raw)?,
            Err(_) => Vec::new(),
        };

        let urgent_threshold_days = match env::var("APP_URGENT_THRESHOLD_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 0)
                .ok_or(ConfigError::InvalidUrgentThreshold { value: raw })?,
            Err(_) => DEFAULT_URGENT_THRESHOLD_DAYS,
        };

        Ok(Self {
            default_sla_days,
            sla_overrides,
            urgent_threshold_days,
        })
    }

    pub fn sla_table(&self) -> SlaTable {
        self.sla_overrides.iter().fold(
            SlaTable::standard().with_default_days(self.default_sla_days),
            |table, (category, days)| table.with_category(category.clone(), *days),
        )
    }

    pub fn engine(&self) -> PrioritizationEngine {
        PrioritizationEngine::new(self.sla_table())
    }
}

fn parse_sla_overrides(raw: &str) -> Result<Vec<(Category, u32)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let invalid = || ConfigError::InvalidSlaEntry {
                entry: entry.to_string(),
            };
            let (code, days) = entry.split_once('=').ok_or_else(invalid)?;
            if code.trim().is_empty() {
                return Err(invalid());
            }
            let days = days.trim().parse::<u32>().map_err(|_| invalid())?;
            Ok((Category::from_code(code), days))
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSlaDays { value: String },
    InvalidSlaEntry { entry: String },
    InvalidUrgentThreshold { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSlaDays { value } => {
                write!(
                    f,
                    "APP_SLA_DEFAULT_DAYS must be a whole number of days, got '{value}'"
                )
            }
            ConfigError::InvalidSlaEntry { entry } => {
                write!(f, "APP_SLA_DAYS entry '{entry}' must look like code=days")
            }
            ConfigError::InvalidUrgentThreshold { value } => {
                write!(
                    f,
                    "APP_URGENT_THRESHOLD_DAYS must be a non-negative number of days, got '{value}'"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidSlaDays { .. }
            | ConfigError::InvalidSlaEntry { .. }
            | ConfigError::InvalidUrgentThreshold { .. } => None,
        }
    }
}
