//! Node configuration
//!
//! Loaded from an optional TOML file, then overridden from the command line
//! (see [`crate::cli`]) and validated before anything starts.

use csync_peer::{parse_base_url, PeerConfig, PeerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File is not valid configuration TOML
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Peer URL is unusable
    #[error(transparent)]
    Peer(#[from] PeerError),

    /// A value is out of range
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which side of the sync this node plays
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Authoritative copy; edits here are pushed to the peer
    #[default]
    Source,
    /// Replica; receives pushes and pulls from the peer
    Consumer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Source => "source",
            Self::Consumer => "consumer",
        })
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NodeConfig {
    /// Role of this node
    pub role: Role,
    /// Address the HTTP API binds to
    pub listen: SocketAddr,
    /// Consumer only: pull a full snapshot from the peer at start-up
    pub pull_on_start: bool,
    /// Peer connection
    pub peer: PeerConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            role: Role::Source,
            listen: SocketAddr::from(([127, 0, 0, 1], 5001)),
            pull_on_start: false,
            peer: PeerConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With role
    #[inline]
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// With listen address
    #[inline]
    #[must_use]
    pub fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }

    /// With peer connection settings
    #[inline]
    #[must_use]
    pub fn with_peer(mut self, peer: PeerConfig) -> Self {
        self.peer = peer;
        self
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid configuration
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Check values that serde cannot
    ///
    /// # Errors
    /// Returns error on an unusable peer URL, zero timeout or zero queue
    /// capacity
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.peer.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "peer.base_url",
                reason: "must not be empty".to_string(),
            });
        }
        parse_base_url(&self.peer.base_url)?;

        if self.peer.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "peer.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.peer.outbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "peer.outbox_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
