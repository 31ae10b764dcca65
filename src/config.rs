use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
    pub connection_timeout: Duration,
    /// Applied as `statement_timeout` on every pooled connection; `None` disables it.
    pub statement_timeout: Option<Duration>,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool_max_size: 10,
            connection_timeout: Duration::from_secs(30),
            statement_timeout: Some(Duration::from_millis(5_000)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
}

impl Settings {
    /// Reads settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let mut database = DatabaseConfig::new(url);
        if let Some(size) = parse_var::<u32, _>(&lookup, "DB_POOL_MAX_SIZE")? {
            if size == 0 {
                return Err(ConfigError::Invalid {
                    name: "DB_POOL_MAX_SIZE",
                    value: size.to_string(),
                });
            }
            database.pool_max_size = size;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "DB_CONNECTION_TIMEOUT_SECS")? {
            database.connection_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, "DB_STATEMENT_TIMEOUT_MS")? {
            database.statement_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_var(&lookup, "PORT")?.unwrap_or(8080),
            database,
        })
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn database_url_is_required() {
        assert_eq!(
            settings(&[]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
    }

    #[test]
    fn defaults_apply() {
        let s = settings(&[("DATABASE_URL", "postgres://localhost/db")]).expect("settings");
        assert_eq!(s.host, "0.0.0.0");
        assert_eq!(s.port, 8080);
        assert_eq!(s.database.pool_max_size, 10);
        assert_eq!(s.database.statement_timeout, Some(Duration::from_millis(5_000)));
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://localhost/db"),
            ("HOST", "127.0.0.1"),
            ("PORT", "9000"),
            ("DB_POOL_MAX_SIZE", "4"),
            ("DB_STATEMENT_TIMEOUT_MS", "0"),
        ])
        .expect("settings");
        assert_eq!(s.host, "127.0.0.1");
        assert_eq!(s.port, 9000);
        assert_eq!(s.database.pool_max_size, 4);
        assert_eq!(s.database.statement_timeout, None);
    }

    #[test]
    fn invalid_port_names_the_variable() {
        let err = settings(&[("DATABASE_URL", "postgres://x"), ("PORT", "http")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "http".to_string()
            }
        );
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        assert!(settings(&[("DATABASE_URL", "postgres://x"), ("DB_POOL_MAX_SIZE", "0")]).is_err());
    }
}
