use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use time::{format_description::FormatItem, macros::format_description, UtcOffset};

const UTC_OFFSET_FORMAT: &[FormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

#[derive(Debug, Clone, Deserialize)]
#[allow(unused)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub app: AppConfig,
    pub scheduling: SchedulingConfig,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(unused)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub cors_allow_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(unused)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[allow(unused)]
pub struct AppConfig {
    pub name: String,
    pub environment: Environment,
}

/// Settings for the booking rule evaluator.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulingConfig {
    /// Offset in which booking windows (day of week, time of day) are read.
    pub booking_utc_offset: UtcOffset,
    /// Reload the scheduling tables on this interval. `None` disables it.
    pub refresh_interval: Option<Duration>,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            booking_utc_offset: UtcOffset::UTC,
            refresh_interval: None,
        }
    }
}

/// OpenTelemetry export settings. Without an endpoint only console logs are written.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    pub otlp_endpoint: Option<String>,
    pub traces_enabled: bool,
    pub export_timeout: Duration,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            traces_enabled: true,
            export_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Server configuration
        let host = env::var("SERVER_HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .context("Failed to parse SERVER_HOST")?;

        let port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("Failed to parse SERVER_PORT")?;

        let cors_allow_origin = env::var("CORS_ALLOW_ORIGIN").ok().filter(|v| !v.is_empty());

        // Database configuration
        let db_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let db_max_connections = match env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MAX_CONNECTIONS")?),
            Err(_) => Some(10),
        };
        let db_min_connections = match env::var("DATABASE_MIN_CONNECTIONS") {
            Ok(val) => Some(val.parse().context("Failed to parse DATABASE_MIN_CONNECTIONS")?),
            Err(_) => Some(1),
        };

        // App configuration
        let environment = env::var("APP_ENVIRONMENT")
            .ok()
            .and_then(|v| v.parse::<Environment>().ok())
            .unwrap_or_default();
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "Mentorship Backend".to_string());

        // Scheduling configuration
        let booking_utc_offset = match env::var("BOOKING_UTC_OFFSET") {
            Ok(val) => parse_utc_offset(&val).context("Failed to parse BOOKING_UTC_OFFSET")?,
            Err(_) => UtcOffset::UTC,
        };
        let refresh_interval = match env::var("SCHEDULING_REFRESH_SECS") {
            Ok(val) => {
                let secs: u64 = val.parse().context("Failed to parse SCHEDULING_REFRESH_SECS")?;
                (secs > 0).then(|| Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        // Telemetry configuration
        let otlp_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok().filter(|v| !v.is_empty());
        let traces_enabled = match env::var("OTEL_TRACES_ENABLED") {
            Ok(val) => val.parse().context("Failed to parse OTEL_TRACES_ENABLED")?,
            Err(_) => true,
        };
        let export_timeout = match env::var("OTEL_EXPORT_TIMEOUT_SECS") {
            Ok(val) => Duration::from_secs(val.parse().context("Failed to parse OTEL_EXPORT_TIMEOUT_SECS")?),
            Err(_) => Duration::from_secs(30),
        };

        Ok(Config {
            server: ServerConfig {
                host,
                port,
                cors_allow_origin,
            },
            database: DatabaseConfig {
                url: db_url,
                max_connections: db_max_connections,
                min_connections: db_min_connections,
            },
            app: AppConfig {
                name: app_name,
                environment,
            },
            scheduling: SchedulingConfig {
                booking_utc_offset,
                refresh_interval,
            },
            telemetry: TelemetrySettings {
                otlp_endpoint,
                traces_enabled,
                export_timeout,
            },
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }
}

/// Parses offsets written as `+03:00` or `-05:30`.
pub fn parse_utc_offset(value: &str) -> Result<UtcOffset> {
    UtcOffset::parse(value.trim(), UTC_OFFSET_FORMAT)
        .with_context(|| format!("invalid UTC offset: {value}"))
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Environment::Production),
            "staging" => Ok(Environment::Staging),
            "development" => Ok(Environment::Development),
            _ => Err(format!("Unknown environment: {}", s)),
        }
    }
}

use once_cell::sync::OnceCell;

static CONFIG: OnceCell<Config> = OnceCell::new();

pub fn init() -> Result<&'static Config> {
    CONFIG.get_or_try_init(Config::from_env)
}
