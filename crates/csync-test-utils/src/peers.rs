//! In-process transports for wiring services together without HTTP

use async_trait::async_trait;
use csync_model::{ProjectConditionTree, ProjectId};
use csync_peer::{endpoint, ConsumerService, Deletion, IntakeError, PeerError, PeerTransport};
use csync_store::{ProjectMap, SharedStore};
use parking_lot::Mutex;
use std::sync::Arc;

fn refused(endpoint: &str, status: u16) -> PeerError {
    PeerError::Status {
        endpoint: endpoint.to_string(),
        status,
    }
}

/// Records every push and serves reads from a fixed snapshot
#[derive(Debug, Default)]
pub struct RecordingPeer {
    changes: Mutex<Vec<Vec<ProjectConditionTree>>>,
    deletions: Mutex<Vec<Deletion>>,
    snapshot: Mutex<ProjectMap>,
    failing: Mutex<bool>,
}

impl RecordingPeer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Peer whose reads return `snapshot`
    pub fn serving(snapshot: ProjectMap) -> Arc<Self> {
        let peer = Self::new();
        *peer.snapshot.lock() = snapshot;
        peer
    }

    /// Make every request answer 503 until switched back
    pub fn fail_requests(&self, failing: bool) {
        *self.failing.lock() = failing;
    }

    pub fn changes(&self) -> Vec<Vec<ProjectConditionTree>> {
        self.changes.lock().clone()
    }

    pub fn deletions(&self) -> Vec<Deletion> {
        self.deletions.lock().clone()
    }

    pub fn push_count(&self) -> usize {
        self.changes.lock().len() + self.deletions.lock().len()
    }

    /// Wait until at least `count` pushes arrived, panicking after 5 s
    pub async fn wait_for_pushes(&self, count: usize) {
        crate::eventually(&format!("{count} pushes"), || self.push_count() >= count).await;
    }

    fn check(&self, endpoint: &str) -> Result<(), PeerError> {
        if *self.failing.lock() {
            Err(refused(endpoint, 503))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PeerTransport for RecordingPeer {
    async fn push_changes(&self, trees: Vec<ProjectConditionTree>) -> Result<(), PeerError> {
        self.check(endpoint::CONDITIONS_CHANGED)?;
        self.changes.lock().push(trees);
        Ok(())
    }

    async fn push_deletion(&self, deletion: Deletion) -> Result<(), PeerError> {
        self.check(deletion.endpoint())?;
        self.deletions.lock().push(deletion);
        Ok(())
    }

    async fn fetch_project_ids(&self) -> Result<Vec<ProjectId>, PeerError> {
        self.check(endpoint::PROJECTS)?;
        Ok(self.snapshot.lock().keys().copied().collect())
    }

    async fn fetch_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectConditionTree>, PeerError> {
        self.check(&endpoint::project_conditions(project_id))?;
        Ok(self
            .snapshot
            .lock()
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Read-only view of another service's store
#[derive(Debug, Clone)]
pub struct StorePeer {
    store: SharedStore,
}

impl StorePeer {
    pub fn new(store: SharedStore) -> Arc<Self> {
        Arc::new(Self { store })
    }
}

#[async_trait]
impl PeerTransport for StorePeer {
    async fn push_changes(&self, _trees: Vec<ProjectConditionTree>) -> Result<(), PeerError> {
        Err(refused(endpoint::CONDITIONS_CHANGED, 405))
    }

    async fn push_deletion(&self, deletion: Deletion) -> Result<(), PeerError> {
        Err(refused(deletion.endpoint(), 405))
    }

    async fn fetch_project_ids(&self) -> Result<Vec<ProjectId>, PeerError> {
        Ok(self.store.project_ids())
    }

    async fn fetch_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectConditionTree>, PeerError> {
        Ok(self.store.get_all(project_id))
    }
}

/// Delivers pushes straight into a consumer service
#[derive(Debug, Clone)]
pub struct ConsumerLink {
    consumer: ConsumerService,
}

impl ConsumerLink {
    pub fn new(consumer: ConsumerService) -> Arc<Self> {
        Arc::new(Self { consumer })
    }
}

fn intake_status(error: &IntakeError) -> u16 {
    if error.is_not_found() {
        404
    } else if error.is_bad_request() {
        400
    } else {
        502
    }
}

#[async_trait]
impl PeerTransport for ConsumerLink {
    async fn push_changes(&self, trees: Vec<ProjectConditionTree>) -> Result<(), PeerError> {
        self.consumer
            .apply_changes(&trees)
            .map(drop)
            .map_err(|e| refused(endpoint::CONDITIONS_CHANGED, intake_status(&e)))
    }

    async fn push_deletion(&self, deletion: Deletion) -> Result<(), PeerError> {
        self.consumer
            .apply_deletion(&deletion)
            .await
            .map(drop)
            .map_err(|e| refused(deletion.endpoint(), intake_status(&e)))
    }

    async fn fetch_project_ids(&self) -> Result<Vec<ProjectId>, PeerError> {
        Ok(self.consumer.store().project_ids())
    }

    async fn fetch_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<ProjectConditionTree>, PeerError> {
        Ok(self.consumer.store().get_all(project_id))
    }
}
