//! Relay configuration from the environment.

use std::net::SocketAddr;
use tracing::warn;

const DEFAULT_ADDR: &str = "0.0.0.0:3030";

/// Relay settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Deliver `state_replace` broadcasts back to their sender too.
    pub echo_self: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3030)),
            echo_self: false,
        }
    }
}

impl ServerConfig {
    /// Read `SKETCHBOARD_ADDR` and `SKETCHBOARD_ECHO_SELF`.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("SKETCHBOARD_ADDR").ok().as_deref(),
            std::env::var("SKETCHBOARD_ECHO_SELF").ok().as_deref(),
        )
    }

    fn from_vars(addr: Option<&str>, echo_self: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = addr {
            match raw.parse() {
                Ok(addr) => config.addr = addr,
                Err(e) => warn!(
                    "Ignoring SKETCHBOARD_ADDR {:?} ({}), using {}",
                    raw, e, DEFAULT_ADDR
                ),
            }
        }
        if let Some(raw) = echo_self {
            config.echo_self = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        config
    }
}
