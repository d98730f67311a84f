//! Node configuration, populated from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    Invalid {
        var: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime configuration for a Tether node.
///
/// All fields are populated from environment variables with sensible
/// defaults, so a node can be started with zero configuration.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `TETHER_BIND` | `0.0.0.0:3000` | TCP socket address to listen on |
/// | `TETHER_DB` | (absent = in-memory) | Path to the SQLite database file |
/// | `TETHER_ACTOR_HEADER` | `x-actor-id` | Header carrying the authenticated user id |
/// | `TETHER_STORE_TIMEOUT_MS` | `5000` | Upper bound on a single storage call |
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Socket address the server binds to.
    pub bind_addr: SocketAddr,

    /// Path to the SQLite database file.
    /// `None` means use an in-memory store (data is lost on restart).
    pub db_path: Option<String>,

    /// Name of the header the upstream gateway sets to the authenticated
    /// user's id. Stored lowercase.
    pub actor_header: String,

    /// How long a single storage call may take before the request fails
    /// with 504.
    pub store_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            db_path: None,
            actor_header: "x-actor-id".into(),
            store_timeout: Duration::from_millis(5000),
        }
    }
}

impl NodeConfig {
    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Populate config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match lookup("TETHER_BIND") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid {
                var: "TETHER_BIND",
                expected: "a socket address such as 0.0.0.0:3000",
                value: v,
            })?,
            None => defaults.bind_addr,
        };

        let store_timeout = match lookup("TETHER_STORE_TIMEOUT_MS") {
            Some(v) => match v.parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "TETHER_STORE_TIMEOUT_MS",
                        expected: "a positive number of milliseconds",
                        value: v,
                    })
                }
            },
            None => defaults.store_timeout,
        };

        let actor_header = lookup("TETHER_ACTOR_HEADER")
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.actor_header);

        Ok(Self {
            bind_addr,
            db_path: lookup("TETHER_DB").filter(|p| !p.is_empty()),
            actor_header,
            store_timeout,
        })
    }
}
