use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/gridlock";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 3_000;
const DEFAULT_REPOSITORY_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub database_acquire_timeout_ms: u64,
    pub repository_timeout_ms: u64,
    pub production: bool,
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            port: parsed(&lookup, "PORT", DEFAULT_PORT),
            database_max_connections: parsed(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                DEFAULT_MAX_CONNECTIONS,
            ),
            database_acquire_timeout_ms: parsed(
                &lookup,
                "DATABASE_ACQUIRE_TIMEOUT_MS",
                DEFAULT_ACQUIRE_TIMEOUT_MS,
            ),
            repository_timeout_ms: parsed(
                &lookup,
                "REPOSITORY_TIMEOUT_MS",
                DEFAULT_REPOSITORY_TIMEOUT_MS,
            ),
            production: lookup("RUST_ENV")
                .map(|v| v.to_lowercase() == "production")
                .unwrap_or(false),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string()),
        }
    }

    pub fn repository_timeout(&self) -> Duration {
        Duration::from_millis(self.repository_timeout_ms)
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Config: invalid {}='{}', using default {}", key, raw, default);
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.repository_timeout(), Duration::from_millis(5_000));
        assert!(!config.production);
    }

    #[test]
    fn test_reads_overrides() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("REPOSITORY_TIMEOUT_MS", "250"),
            ("RUST_ENV", "Production"),
        ]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.repository_timeout_ms, 250);
        assert!(config.production);
    }

    #[test]
    fn test_malformed_numbers_fall_back() {
        let config = config_from(&[("PORT", "eighty"), ("DATABASE_MAX_CONNECTIONS", "-1")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.database_max_connections, DEFAULT_MAX_CONNECTIONS);
    }
}
