//! Condition Sync Peer
//!
//! Keeps a consumer's copy of the condition hierarchy in step with the
//! source:
//!
//! - [`SourceService`]: commits local edits, then queues a push on the
//!   [`Outbox`] (full tree when first seen, diff otherwise)
//! - [`ConsumerService`]: merges pushed trees, applies deletions followed by
//!   a reconciliation pull, and performs full snapshot pulls
//! - [`PeerTransport`]: the wire seam, implemented over HTTP by [`HttpPeer`]
//!
//! Peer failures never unwind a local commit. They are logged and, for
//! deletions, leave the consumer stale until a later sync touches the
//! project.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod http;
pub mod intake;
pub mod outbox;
pub mod source;
pub mod transport;
pub mod wire;

pub use config::PeerConfig;
pub use error::{IntakeError, PeerError};
pub use http::{parse_base_url, HttpPeer};
pub use intake::{ConsumerService, Reconciliation, SnapshotStats};
pub use outbox::{Outbound, Outbox};
pub use source::SourceService;
pub use transport::{PeerTransport, SharedTransport};
pub use wire::{endpoint, DeletedIds, Deletion};
