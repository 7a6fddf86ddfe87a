use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
pub const DEFAULT_FIXTURE_PATH: &str = "data/foodData.json";

const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is missing; set it in the environment or in .env")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// Pool sizing, connect timeout and the server's reconnect behaviour.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub max_connections: u32,
    pub connect_timeout: Duration,
    pub retry_delay: Duration,
    /// `None` retries until the process is stopped.
    pub retry_max_attempts: Option<u32>,
    pub monitor_interval: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            connect_timeout: Duration::from_secs(5),
            retry_delay: Duration::from_secs(5),
            retry_max_attempts: None,
            monitor_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
    pub db: DbConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = required(&lookup, DATABASE_URL_VAR)?;

        let secret = match lookup("JWT_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(secret) => secret,
            None => {
                warn!("JWT_SECRET not set, using an insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };
        let jwt = JwtConfig {
            secret,
            issuer: lookup("JWT_ISSUER").unwrap_or_else(|| "food-ordering-api".into()),
            audience: lookup("JWT_AUDIENCE").unwrap_or_else(|| "food-ordering-app".into()),
            ttl_minutes: parse_or(&lookup, "JWT_TTL_MINUTES", 60)?,
            refresh_ttl_minutes: parse_or(&lookup, "JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14)?,
        };

        let defaults = DbConfig::default();
        let db = DbConfig {
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.max_connections)?,
            connect_timeout: secs_or(&lookup, "DB_CONNECT_TIMEOUT_SECS", defaults.connect_timeout)?,
            retry_delay: secs_or(&lookup, "DB_RETRY_DELAY_SECS", defaults.retry_delay)?,
            retry_max_attempts: parse_opt(&lookup, "DB_RETRY_MAX_ATTEMPTS")?,
            monitor_interval: secs_or(
                &lookup,
                "DB_MONITOR_INTERVAL_SECS",
                defaults.monitor_interval,
            )?,
        };

        Ok(Self {
            database_url,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "APP_PORT", 5000)?,
            jwt,
            db,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            key: "APP_HOST",
            value: raw,
        })
    }
}

/// Settings for the `import-foods` utility.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub database_url: String,
    pub connect_timeout: Duration,
    pub fixture_path: PathBuf,
}

impl ImportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            database_url: required(&lookup, DATABASE_URL_VAR)?,
            connect_timeout: secs_or(
                &lookup,
                "IMPORT_CONNECT_TIMEOUT_SECS",
                Duration::from_secs(10),
            )?,
            fixture_path: lookup("FOOD_FIXTURE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FIXTURE_PATH)),
        })
    }
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_opt<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}

fn secs_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt::<u64, F>(lookup, key)?
        .map(Duration::from_secs)
        .unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_database_url_is_fatal() {
        let err = AppConfig::from_lookup(env(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(DATABASE_URL_VAR));

        let err = ImportConfig::from_lookup(env(&[("DATABASE_URL", "   ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(DATABASE_URL_VAR));
    }

    #[test]
    fn server_defaults_apply() {
        let cfg = AppConfig::from_lookup(env(&[("DATABASE_URL", "postgres://localhost/food")]))
            .expect("config");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.db.retry_delay, Duration::from_secs(5));
        assert_eq!(cfg.db.retry_max_attempts, None);
        assert_eq!(cfg.jwt.secret, DEV_JWT_SECRET);
        assert_eq!(cfg.socket_addr().unwrap().port(), 5000);
    }

    #[test]
    fn server_overrides_are_parsed() {
        let cfg = AppConfig::from_lookup(env(&[
            ("DATABASE_URL", "postgres://localhost/food"),
            ("APP_PORT", "8081"),
            ("DB_RETRY_DELAY_SECS", "2"),
            ("DB_RETRY_MAX_ATTEMPTS", "3"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .expect("config");
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.db.retry_delay, Duration::from_secs(2));
        assert_eq!(cfg.db.retry_max_attempts, Some(3));
        assert_eq!(cfg.jwt.secret, "s3cret");
    }

    #[test]
    fn invalid_number_is_reported_with_key() {
        let err = AppConfig::from_lookup(env(&[
            ("DATABASE_URL", "postgres://localhost/food"),
            ("APP_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "APP_PORT",
                value: "eighty".into()
            }
        );
    }

    #[test]
    fn import_config_uses_fixture_default() {
        let cfg = ImportConfig::from_lookup(env(&[("DATABASE_URL", "postgres://localhost/food")]))
            .expect("config");
        assert_eq!(cfg.fixture_path, PathBuf::from(DEFAULT_FIXTURE_PATH));
        assert_eq!(cfg.connect_timeout, Duration::from_secs(10));
    }
}
