use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::engine::EngineConfig;

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
            engine: engine_from_env()?,
        })
    }
}

fn setting<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidSetting { name, value }),
        _ => Ok(default),
    }
}

/// Engine tunables. Unset variables keep the engine defaults; a zero
/// `WARDROBE_ENUMERATION_BUDGET_MS` disables the wall-clock budget.
fn engine_from_env() -> Result<EngineConfig, ConfigError> {
    let defaults = EngineConfig::default();

    let default_budget = defaults
        .enumeration_time_budget
        .map(|budget| u64::try_from(budget.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0);
    let budget_ms = setting("WARDROBE_ENUMERATION_BUDGET_MS", default_budget)?;

    let min_pair_score = setting("WARDROBE_MIN_PAIR_SCORE", defaults.min_pair_score)?;
    if !(0.0..1.0).contains(&min_pair_score) {
        return Err(ConfigError::InvalidSetting {
            name: "WARDROBE_MIN_PAIR_SCORE",
            value: min_pair_score.to_string(),
        });
    }

    let default_capsule_size =
        setting("WARDROBE_DEFAULT_CAPSULE_SIZE", defaults.default_capsule_size)?;
    if default_capsule_size <= 0 {
        return Err(ConfigError::InvalidSetting {
            name: "WARDROBE_DEFAULT_CAPSULE_SIZE",
            value: default_capsule_size.to_string(),
        });
    }

    let mut insights = defaults.insights.clone();
    insights.high_compatibility_avg = setting(
        "WARDROBE_HIGH_COMPATIBILITY_AVG",
        insights.high_compatibility_avg,
    )?;
    insights.minimum_catalog_size =
        setting("WARDROBE_MIN_CATALOG_SIZE", insights.minimum_catalog_size)?;

    Ok(EngineConfig {
        enumeration_ceiling: setting("WARDROBE_ENUMERATION_CEILING", defaults.enumeration_ceiling)?,
        enumeration_time_budget: (budget_ms > 0).then(|| Duration::from_millis(budget_ms)),
        min_pair_score,
        top_outfit_limit: setting("WARDROBE_TOP_OUTFITS", defaults.top_outfit_limit)?,
        default_capsule_size,
        selection_evaluation_limit: setting(
            "WARDROBE_SELECTION_LIMIT",
            defaults.selection_evaluation_limit,
        )?,
        capsule_restarts: setting("WARDROBE_CAPSULE_RESTARTS", defaults.capsule_restarts)?,
        insights,
        ..defaults
    })
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

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSetting { name, value } => {
                write!(f, "{name} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidSetting { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    const ENGINE_VARS: [&str; 9] = [
        "WARDROBE_ENUMERATION_CEILING",
        "WARDROBE_ENUMERATION_BUDGET_MS",
        "WARDROBE_MIN_PAIR_SCORE",
        "WARDROBE_HIGH_COMPATIBILITY_AVG",
        "WARDROBE_MIN_CATALOG_SIZE",
        "WARDROBE_TOP_OUTFITS",
        "WARDROBE_DEFAULT_CAPSULE_SIZE",
        "WARDROBE_SELECTION_LIMIT",
        "WARDROBE_CAPSULE_RESTARTS",
    ];

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        for name in ENGINE_VARS {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 5000));
        reset_env();
    }

    #[test]
    fn engine_settings_override_defaults() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "ci");
        env::set_var("WARDROBE_ENUMERATION_CEILING", "5000");
        env::set_var("WARDROBE_ENUMERATION_BUDGET_MS", "0");
        env::set_var("WARDROBE_MIN_PAIR_SCORE", "0.25");
        env::set_var("WARDROBE_HIGH_COMPATIBILITY_AVG", "55.5");
        env::set_var("WARDROBE_MIN_CATALOG_SIZE", "8");
        env::set_var("WARDROBE_TOP_OUTFITS", "3");
        env::set_var("WARDROBE_DEFAULT_CAPSULE_SIZE", "12");
        env::set_var("WARDROBE_SELECTION_LIMIT", "2000");
        env::set_var("WARDROBE_CAPSULE_RESTARTS", "1");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Test);
        assert_eq!(config.engine.enumeration_ceiling, 5000);
        assert_eq!(config.engine.enumeration_time_budget, None);
        assert_eq!(config.engine.min_pair_score, 0.25);
        assert_eq!(config.engine.insights.high_compatibility_avg, 55.5);
        assert_eq!(config.engine.insights.minimum_catalog_size, 8);
        assert_eq!(config.engine.top_outfit_limit, 3);
        assert_eq!(config.engine.default_capsule_size, 12);
        assert_eq!(config.engine.selection_evaluation_limit, 2000);
        assert_eq!(config.engine.capsule_restarts, 1);
        reset_env();
    }

    #[test]
    fn invalid_engine_settings_name_the_variable() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("WARDROBE_ENUMERATION_CEILING", "lots");
        let err = AppConfig::load().expect_err("ceiling must be numeric");
        assert_eq!(
            err.to_string(),
            "WARDROBE_ENUMERATION_CEILING has an invalid value 'lots'"
        );

        reset_env();
        env::set_var("WARDROBE_MIN_PAIR_SCORE", "1.5");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSetting {
                name: "WARDROBE_MIN_PAIR_SCORE",
                ..
            })
        ));
        reset_env();
    }
}
