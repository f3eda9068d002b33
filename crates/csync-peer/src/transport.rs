//! Seam between the sync services and the wire

use crate::error::PeerError;
use crate::wire::Deletion;
use async_trait::async_trait;
use csync_model::{ProjectConditionTree, ProjectId};
use std::sync::Arc;

/// Requests one service makes of its peer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PeerTransport: Send + Sync {
    /// Send changed or new condition trees to the change intake
    async fn push_changes(&self, trees: Vec<ProjectConditionTree>) -> Result<(), PeerError>;

    /// Send a deletion notice to the matching intake
    async fn push_deletion(&self, deletion: Deletion) -> Result<(), PeerError>;

    /// List every project the peer holds
    async fn fetch_project_ids(&self) -> Result<Vec<ProjectId>, PeerError>;

    /// Fetch all conditions of one project
    async fn fetch_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectConditionTree>, PeerError>;
}

/// Shared transport handle
pub type SharedTransport = Arc<dyn PeerTransport>;
