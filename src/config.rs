//! Configuration loaded from environment variables

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16, got {0:?}")]
    InvalidPort(String),

    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost {
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("{name} must be true or false, got {value:?}")]
    InvalidFlag { name: &'static str, value: String },
}

/// Settings controlling the HTTP server binding
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

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub log_level: String,
    /// Price-paid CSV preloaded as the default sale-record source
    pub sales_csv: Option<PathBuf>,
    pub allow_location_free: bool,
}

pub fn parse_flag(name: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    match raw {
        None => Ok(false),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigError::InvalidFlag { name, value }),
        },
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let raw_port = env::var("APP_PORT").unwrap_or_else(|_| "3001".to_string());
        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(raw_port.clone()))?;

        Ok(AppConfig {
            server: ServerConfig { host, port },
            log_level: env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            sales_csv: env::var("SALES_CSV")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            allow_location_free: parse_flag(
                "ALLOW_LOCATION_FREE",
                env::var("ALLOW_LOCATION_FREE").ok(),
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("SALES_CSV");
        env::remove_var("ALLOW_LOCATION_FREE");
    }

    #[test]
    fn test_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        let config = AppConfig::from_env().expect("config loads with defaults");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.log_level, "info");
        assert!(config.sales_csv.is_none());
        assert!(!config.allow_location_free);
    }

    #[test]
    fn test_invalid_port_rejected() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "not-a-port");

        let err = AppConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(ref v) if v == "not-a-port"));
        reset_env();
    }

    #[test]
    fn test_location_free_flag() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ALLOW_LOCATION_FREE", "yes");
        env::set_var("SALES_CSV", "/data/price_paid.csv");

        let config = AppConfig::from_env().expect("config loads");
        assert!(config.allow_location_free);
        assert_eq!(config.sales_csv, Some(PathBuf::from("/data/price_paid.csv")));
        reset_env();
    }

    #[test]
    fn test_parse_flag() {
        assert!(!parse_flag("X", None).unwrap());
        assert!(parse_flag("X", Some("TRUE".to_string())).unwrap());
        assert!(!parse_flag("X", Some("off".to_string())).unwrap());
        assert!(parse_flag("X", Some("maybe".to_string())).is_err());
    }

    #[test]
    fn test_localhost_socket_addr() {
        let server = ServerConfig {
            host: "localhost".to_string(),
            port: 3001,
        };
        assert_eq!(
            server.socket_addr().unwrap(),
            SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3001)
        );

        let bad = ServerConfig {
            host: "not an ip".to_string(),
            port: 3001,
        };
        assert!(bad.socket_addr().is_err());
    }
}
