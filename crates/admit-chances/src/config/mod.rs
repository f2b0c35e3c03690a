use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cohort::CacheConfig;
use crate::engine::{EngineConfig, EngineConfigError};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;

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
    pub engine: EngineConfig,
    pub cache: CacheConfig,
    pub data: DataConfig,
    pub request_timeout: Duration,
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

        let defaults = EngineConfig::default();
        let engine = EngineConfig {
            adjustment_scale: parse_or("CHANCES_ADJUSTMENT_SCALE", defaults.adjustment_scale)?,
            min_confident_sample: parse_or(
                "CHANCES_MIN_CONFIDENT_SAMPLE",
                defaults.min_confident_sample,
            )?,
            min_display_confidence: parse_or(
                "CHANCES_MIN_DISPLAY_CONFIDENCE",
                defaults.min_display_confidence,
            )?,
            global_prior: parse_or("CHANCES_GLOBAL_PRIOR", defaults.global_prior)?,
            ..defaults
        };
        engine.validate().map_err(ConfigError::Engine)?;

        let cache_defaults = CacheConfig::default();
        let cache = CacheConfig {
            school_ttl: Duration::from_secs(parse_or(
                "CHANCES_SCHOOL_CACHE_TTL_SECS",
                cache_defaults.school_ttl.as_secs(),
            )?),
            cohort_ttl: Duration::from_secs(parse_or(
                "CHANCES_COHORT_CACHE_TTL_SECS",
                cache_defaults.cohort_ttl.as_secs(),
            )?),
            ..cache_defaults
        };

        let request_timeout = Duration::from_millis(parse_or(
            "CHANCES_REQUEST_TIMEOUT_MS",
            DEFAULT_REQUEST_TIMEOUT_MS,
        )?);

        let data = DataConfig {
            schools_csv: path_var("CHANCES_SCHOOLS_CSV"),
            submissions_csv: path_var("CHANCES_SUBMISSIONS_CSV"),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            engine,
            cache,
            data,
            request_timeout,
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

/// Optional CSV files seeding the in-memory admissions store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataConfig {
    pub schools_csv: Option<PathBuf>,
    pub submissions_csv: Option<PathBuf>,
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { key, value: raw })
        }
        _ => Ok(default),
    }
}

fn path_var(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("{key} must be numeric, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
    #[error("invalid engine configuration: {0}")]
    Engine(#[from] EngineConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "CHANCES_ADJUSTMENT_SCALE",
            "CHANCES_MIN_CONFIDENT_SAMPLE",
            "CHANCES_MIN_DISPLAY_CONFIDENCE",
            "CHANCES_GLOBAL_PRIOR",
            "CHANCES_SCHOOL_CACHE_TTL_SECS",
            "CHANCES_COHORT_CACHE_TTL_SECS",
            "CHANCES_REQUEST_TIMEOUT_MS",
            "CHANCES_SCHOOLS_CSV",
            "CHANCES_SUBMISSIONS_CSV",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.cache, CacheConfig::default());
        assert_eq!(config.request_timeout, Duration::from_millis(2_000));
        assert_eq!(config.data, DataConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn unparseable_host_keeps_the_parse_error() {
        let server = ServerConfig {
            host: "not-a-host".to_string(),
            port: 3000,
        };
        let error = server.socket_addr().expect_err("host is rejected");
        assert_eq!(
            error.to_string(),
            "APP_HOST must parse to an IPv4 or IPv6 address"
        );
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn engine_overrides_are_read_and_validated() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("CHANCES_MIN_CONFIDENT_SAMPLE", "12");
        env::set_var("CHANCES_COHORT_CACHE_TTL_SECS", "60");
        env::set_var("CHANCES_SCHOOLS_CSV", "data/schools.csv");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.engine.min_confident_sample, 12);
        assert_eq!(config.cache.cohort_ttl, Duration::from_secs(60));
        assert_eq!(
            config.data.schools_csv,
            Some(PathBuf::from("data/schools.csv"))
        );

        env::set_var("CHANCES_GLOBAL_PRIOR", "1.5");
        assert!(matches!(AppConfig::load(), Err(ConfigError::Engine(_))));

        env::set_var("CHANCES_GLOBAL_PRIOR", "often");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidNumber {
                key: "CHANCES_GLOBAL_PRIOR",
                ..
            })
        ));
        reset_env();
    }
}
