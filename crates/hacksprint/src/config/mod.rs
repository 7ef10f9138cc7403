use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::registration::MAX_ATTACHMENT_BYTES;

const DEFAULT_EVENT_NAME: &str = "Hacksprint 5.0";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

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
    pub registration: RegistrationSettings,
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

        let registration = RegistrationSettings::from_env()?;
        if environment == AppEnvironment::Production && registration.script_url.is_none() {
            return Err(ConfigError::MissingScriptUrl);
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            registration,
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

/// Where registrations go and what teams are told afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationSettings {
    /// Apps Script web app endpoint. `None` selects the in-memory collaborator.
    pub script_url: Option<String>,
    pub sheet_id: String,
    pub drive_folder_id: String,
    pub follow_up_link: Option<String>,
    pub event_name: String,
    pub fallback_enabled: bool,
    pub http_timeout: Duration,
    pub max_attachment_bytes: u64,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            script_url: None,
            sheet_id: String::new(),
            drive_folder_id: String::new(),
            follow_up_link: None,
            event_name: DEFAULT_EVENT_NAME.to_string(),
            fallback_enabled: true,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_attachment_bytes: MAX_ATTACHMENT_BYTES,
        }
    }
}

impl RegistrationSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let fallback_enabled = match non_empty_var("HACKSPRINT_TRANSPORT_FALLBACK") {
            Some(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "HACKSPRINT_TRANSPORT_FALLBACK",
                value: raw,
            })?,
            None => defaults.fallback_enabled,
        };

        let http_timeout = match non_empty_var("HACKSPRINT_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout { value: raw })?,
            None => defaults.http_timeout,
        };

        Ok(Self {
            script_url: non_empty_var("HACKSPRINT_SCRIPT_URL"),
            sheet_id: non_empty_var("HACKSPRINT_SHEET_ID").unwrap_or_default(),
            drive_folder_id: non_empty_var("HACKSPRINT_DRIVE_FOLDER_ID").unwrap_or_default(),
            follow_up_link: non_empty_var("HACKSPRINT_FOLLOW_UP_LINK"),
            event_name: non_empty_var("HACKSPRINT_EVENT_NAME").unwrap_or(defaults.event_name),
            fallback_enabled,
            http_timeout,
            max_attachment_bytes: defaults.max_attachment_bytes,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    MissingScriptUrl,
    InvalidFlag { name: &'static str, value: String },
    InvalidTimeout { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::MissingScriptUrl => {
                write!(f, "HACKSPRINT_SCRIPT_URL is required in production")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false (found '{value}')")
            }
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "HACKSPRINT_HTTP_TIMEOUT_SECS must be a positive number of seconds (found '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::MissingScriptUrl
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidTimeout { .. } => None,
        }
    }
}
