//! Process configuration.
//!
//! Everything the engine needs from the environment is read and validated
//! once, at startup, and handed to the collaborators by constructor. No code
//! path re-reads the environment or re-checks credentials per request.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors raised while assembling the configuration. All of them abort
/// startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// `LISTEN_ADDR` is set but not a valid socket address.
    #[error("invalid listen address: {0}")]
    InvalidListenAddr(String),
}

/// Validated process configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Webflow API token.
    pub webflow_token: String,
    /// The collection holding synced article items.
    pub webflow_collection_id: String,
    /// The site published after every remote change.
    pub webflow_site_id: String,
    /// PostgREST base URL of the content store.
    pub supabase_url: String,
    /// Service-role key for audit writes and remote-id linking.
    pub supabase_service_key: String,
    /// Address the HTTP server binds to.
    pub listen_addr: SocketAddr,
}

impl SyncConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary lookup function.
    /// Extracted from [`SyncConfig::from_env`] so validation is testable
    /// without mutating the process environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let require = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(ConfigError::MissingVar(name))
        };

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidListenAddr(raw))?,
            None => SocketAddr::from(([0, 0, 0, 0], 3000)),
        };

        Ok(Self {
            webflow_token: require("WEBFLOW_TOKEN")?,
            webflow_collection_id: require("WEBFLOW_COLLECTION_ID")?,
            webflow_site_id: require("WEBFLOW_SITE_ID")?,
            supabase_url: require("SUPABASE_URL")?,
            supabase_service_key: require("SUPABASE_SERVICE_ROLE_KEY")?,
            listen_addr,
        })
    }
}
