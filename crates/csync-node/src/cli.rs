//! Command-line interface

use crate::config::{ConfigError, NodeConfig, Role};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Condition sync node
#[derive(Debug, Clone, Parser)]
#[command(name = "csync-node", version, about = "Serve one side of condition tree sync")]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Role of this node
    #[arg(long, value_enum)]
    pub role: Option<Role>,

    /// Address to listen on
    #[arg(long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Base URL of the peer service
    #[arg(long, value_name = "URL")]
    pub peer_url: Option<String>,

    /// Peer request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Pull a full snapshot from the peer before serving (consumer only)
    #[arg(long)]
    pub pull_on_start: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Configuration from file and flags, validated
    ///
    /// # Errors
    /// Returns error if the file cannot be loaded or the result is invalid
    pub fn resolve(&self) -> Result<NodeConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load(path)?,
            None => NodeConfig::default(),
        };

        if let Some(role) = self.role {
            config.role = role;
        }
        if let Some(listen) = self.listen {
            config.listen = listen;
        }
        if let Some(url) = &self.peer_url {
            config.peer.base_url.clone_from(url);
        }
        if let Some(secs) = self.timeout {
            config.peer.timeout_secs = secs;
        }
        config.pull_on_start |= self.pull_on_start;

        config.validate()?;
        Ok(config)
    }
}
