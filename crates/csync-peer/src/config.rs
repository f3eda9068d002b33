//! Peer connection settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Where the peer lives and how outbound traffic to it behaves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// Base URL of the peer service
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Pending pushes held before new ones are dropped
    pub outbox_capacity: usize,
}

impl PeerConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With peer base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// With outbound queue capacity
    #[inline]
    #[must_use]
    pub fn with_outbox_capacity(mut self, capacity: usize) -> Self {
        self.outbox_capacity = capacity;
        self
    }

    /// Request timeout as a duration
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5002".to_string(),
            timeout_secs: 10,
            outbox_capacity: 1024,
        }
    }
}
