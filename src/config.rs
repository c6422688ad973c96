use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Medbook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const BIND_VAR: &str = "MEDBOOK_BIND";
pub const PORT_VAR: &str = "MEDBOOK_PORT";
pub const DB_VAR: &str = "MEDBOOK_DB";

pub const DEFAULT_BIND: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
pub const DEFAULT_PORT: u16 = 5001;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("Cannot determine home directory; set MEDBOOK_DB")]
    NoHomeDirectory,
}

/// Get the application data directory: ~/Medbook/
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home.join(APP_NAME))
}

/// Default database file under the application data directory
pub fn default_database_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("medbook.db"))
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medbook_lib=info,medbook=info,tower_http=info"
}

/// Listener and storage settings for `medbook serve`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub database_path: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; unset variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind = try_load(&lookup, BIND_VAR)?.unwrap_or(DEFAULT_BIND);
        let port = try_load(&lookup, PORT_VAR)?.unwrap_or(DEFAULT_PORT);
        let database_path = match lookup(DB_VAR).filter(|v| !v.trim().is_empty()) {
            Some(path) => PathBuf::from(path),
            None => default_database_path()?,
        };
        Ok(Self {
            bind,
            port,
            database_path,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: Display,
{
    let Some(value) = lookup(key) else {
        tracing::debug!("{key} not set, using default");
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    parsed.map(Some).map_err(|e| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[(DB_VAR, "/tmp/m.db")])).unwrap();
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.port, 5001);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5001");
    }

    #[test]
    fn overrides_from_variables() {
        let config = ServerConfig::from_lookup(lookup(&[
            (BIND_VAR, "0.0.0.0"),
            (PORT_VAR, " 8080 "),
            (DB_VAR, "/data/medbook.db"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.database_path, PathBuf::from("/data/medbook.db"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[(PORT_VAR, "http"), (DB_VAR, "/tmp/m.db")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: PORT_VAR, .. }));
    }

    #[test]
    fn invalid_bind_is_an_error() {
        let err = ServerConfig::from_lookup(lookup(&[(BIND_VAR, "localhost:1"), (DB_VAR, "/tmp/m.db")]))
            .unwrap_err();
        assert!(err.to_string().contains(BIND_VAR));
    }

    #[test]
    fn default_database_under_app_dir() {
        if dirs::home_dir().is_none() {
            return;
        }
        let path = default_database_path().unwrap();
        assert!(path.starts_with(app_data_dir().unwrap()));
        assert!(path.ends_with("Medbook/medbook.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
