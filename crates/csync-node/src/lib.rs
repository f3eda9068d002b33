//! Condition Sync Node
//!
//! One binary, two roles:
//!
//! - **source**: owns the authoritative hierarchy, accepts edits and pushes
//!   changes and deletions to its peer
//! - **consumer**: receives those pushes, reconciles after deletions and can
//!   pull a full snapshot on demand
//!
//! Configuration comes from [`config::NodeConfig`] (TOML plus [`cli::Cli`]
//! overrides); the HTTP surface lives in [`routes`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cli;
pub mod config;
pub mod routes;
pub mod server;
pub mod telemetry;

pub use cli::Cli;
pub use config::{ConfigError, NodeConfig, Role};
pub use server::build_api;
