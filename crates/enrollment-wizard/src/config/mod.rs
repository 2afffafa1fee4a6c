use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_SUBMISSION_URL: &str = "http://127.0.0.1:5000/api/v1/enrollment/submissions";
const DEFAULT_COUNTRIES_URL: &str = "https://restcountries.com/v3.1/all?fields=name";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

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

/// Top-level configuration for the enrollment service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub integrations: IntegrationConfig,
    pub sessions: SessionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            integrations: IntegrationConfig::from_env()?,
            sessions: SessionConfig::from_env()?,
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Outbound collaborators: submission endpoint, relay webhook, and country list source.
#[derive(Debug, Clone)]
pub struct IntegrationConfig {
    pub submission_url: String,
    pub webhook_url: Option<String>,
    pub countries_url: String,
    pub request_timeout: Duration,
}

impl IntegrationConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let submission_url = env::var("ENROLLMENT_SUBMISSION_URL")
            .unwrap_or_else(|_| DEFAULT_SUBMISSION_URL.to_string());
        let webhook_url = env::var("ENROLLMENT_WEBHOOK_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let countries_url = env::var("ENROLLMENT_COUNTRIES_URL")
            .unwrap_or_else(|_| DEFAULT_COUNTRIES_URL.to_string());

        let timeout_secs = match env::var("ENROLLMENT_HTTP_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout { value: raw })?,
            Err(_) => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        Ok(Self {
            submission_url,
            webhook_url,
            countries_url,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Lifetime of in-memory wizard sessions.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub idle_timeout: Duration,
}

impl SessionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let idle_secs = match env::var("ENROLLMENT_SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidSessionIdle { value: raw })?,
            Err(_) => DEFAULT_SESSION_IDLE_SECS,
        };

        Ok(Self {
            idle_timeout: Duration::from_secs(idle_secs),
        })
    }
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            submission_url: DEFAULT_SUBMISSION_URL.to_string(),
            webhook_url: None,
            countries_url: DEFAULT_COUNTRIES_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout { value: String },
    InvalidSessionIdle { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "ENROLLMENT_HTTP_TIMEOUT_SECS must be a positive number of seconds (found '{value}')"
            ),
            ConfigError::InvalidSessionIdle { value } => write!(
                f,
                "ENROLLMENT_SESSION_IDLE_SECS must be a positive number of seconds (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout { .. }
            | ConfigError::InvalidSessionIdle { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
