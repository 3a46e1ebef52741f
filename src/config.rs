//! Process configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Default listen address for the HTTP server.
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// Default path of the layout file.
const DEFAULT_LAYOUT_PATH: &str = "layout.json";

/// Errors in environment configuration.
#[derive(Debug, Error)]
pub enum EnvConfigError {
    #[error("invalid PIPELINE_GATE_LISTEN_ADDR {value:?}: {source}")]
    ListenAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Configuration for the gate binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    /// Address the HTTP server binds to.
    ///
    /// Default: `0.0.0.0:3000`. Configure via `PIPELINE_GATE_LISTEN_ADDR`.
    pub listen_addr: SocketAddr,

    /// Layout file loaded at startup.
    ///
    /// Default: `layout.json`. Configure via `PIPELINE_GATE_LAYOUT`.
    pub layout_path: PathBuf,
}

impl GateConfig {
    /// Reads configuration from environment variables, falling back to the
    /// defaults for unset ones.
    pub fn from_env() -> Result<Self, EnvConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EnvConfigError> {
        let addr = lookup("PIPELINE_GATE_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = addr
            .parse::<SocketAddr>()
            .map_err(|source| EnvConfigError::ListenAddr {
                value: addr.clone(),
                source,
            })?;

        let layout_path = lookup("PIPELINE_GATE_LAYOUT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LAYOUT_PATH));

        Ok(GateConfig {
            listen_addr,
            layout_path,
        })
    }
}
