//! Relay server configuration, read from the environment.

use std::net::SocketAddr;

use crate::crdt::SessionId;

/// Listen address used when `RGASS_ADDR` is unset.
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";
/// Relay buffer used when `RGASS_BROADCAST_CAPACITY` is unset.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;
/// Document session used when `RGASS_SESSION` is unset.
pub const DEFAULT_SESSION: SessionId = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// How many relayed operations a slow session may fall behind before it is dropped
    pub broadcast_capacity: usize,
    /// Session component every client stamps into its identifiers
    pub session: SessionId,
}

impl ServerConfig {
    /// Reads `RGASS_ADDR`, `RGASS_BROADCAST_CAPACITY` and `RGASS_SESSION`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; unset variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr: SocketAddr = parse("RGASS_ADDR", lookup("RGASS_ADDR"), DEFAULT_ADDR.parse().ok())?;
        let broadcast_capacity = parse(
            "RGASS_BROADCAST_CAPACITY",
            lookup("RGASS_BROADCAST_CAPACITY"),
            Some(DEFAULT_BROADCAST_CAPACITY),
        )?;
        if broadcast_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "RGASS_BROADCAST_CAPACITY",
                value: broadcast_capacity.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        let session = parse("RGASS_SESSION", lookup("RGASS_SESSION"), Some(DEFAULT_SESSION))?;

        Ok(ServerConfig {
            addr,
            broadcast_capacity,
            session,
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
            session: DEFAULT_SESSION,
        }
    }
}

fn parse<T>(name: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match (raw, default) {
        (Some(value), _) => value.trim().parse().map_err(|error: T::Err| ConfigError::Invalid {
            name,
            reason: error.to_string(),
            value,
        }),
        (None, Some(default)) => Ok(default),
        (None, None) => Err(ConfigError::Invalid {
            name,
            value: String::new(),
            reason: "no default available".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config(&[]).unwrap(), ServerConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("RGASS_ADDR", "0.0.0.0:8080"),
            ("RGASS_BROADCAST_CAPACITY", "16"),
            ("RGASS_SESSION", "7"),
        ])
        .unwrap();

        assert_eq!(config.addr, SocketAddr::from(([0, 0, 0, 0], 8080)));
        assert_eq!(config.broadcast_capacity, 16);
        assert_eq!(config.session, 7);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config(&[("RGASS_ADDR", "not an address")]),
            Err(ConfigError::Invalid {
                name: "RGASS_ADDR",
                ..
            })
        ));
        assert!(config(&[("RGASS_BROADCAST_CAPACITY", "0")]).is_err());
        assert!(config(&[("RGASS_SESSION", "-1")]).is_err());
    }
}
