//! Consumer-side service: applies pushes from the source and pulls when its
//! copy may have drifted

use crate::error::IntakeError;
use crate::transport::SharedTransport;
use crate::wire::Deletion;
use csync_model::{ProjectConditionTree, ProjectId};
use csync_store::{ProjectMap, SharedStore};
use futures::future::try_join_all;
use tracing::{info, warn};

/// Result of the pull that follows a deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Project replaced with the peer's current conditions
    Refreshed { conditions: usize },
    /// Pull failed; local copy kept until a later sync touches the project
    Stale,
}

/// Keep only the trees the peer filed under `project_id`
fn owned_by(project_id: ProjectId, trees: Vec<ProjectConditionTree>) -> Vec<ProjectConditionTree> {
    let received = trees.len();
    let kept: Vec<_> = trees
        .into_iter()
        .filter(|tree| tree.project_id == project_id)
        .collect();
    if kept.len() != received {
        warn!(
            %project_id,
            dropped = received - kept.len(),
            "peer returned conditions of another project; dropped"
        );
    }
    kept
}

/// Counts from a full snapshot pull
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub projects: usize,
    pub conditions: usize,
}

/// Receives changes and deletions from the source and keeps the local copy
/// in step
#[derive(Clone)]
pub struct ConsumerService {
    store: SharedStore,
    peer: SharedTransport,
}

impl std::fmt::Debug for ConsumerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerService")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl ConsumerService {
    /// Create new service over a store and a transport back to the source
    #[inline]
    #[must_use]
    pub fn new(store: SharedStore, peer: SharedTransport) -> Self {
        Self { store, peer }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Merge a batch of pushed trees
    ///
    /// # Errors
    /// Returns error if the batch is empty or any tree carries a nil id; the
    /// store is left untouched in both cases
    pub fn apply_changes(
        &self,
        trees: &[ProjectConditionTree],
    ) -> Result<Vec<ProjectConditionTree>, IntakeError> {
        if trees.is_empty() {
            return Err(IntakeError::EmptyChanges);
        }

        let committed = self.store.upsert(trees)?;
        info!(count = committed.len(), "applied changes from peer");
        Ok(committed)
    }

    /// Delete locally, then pull the project from the peer
    ///
    /// A failed pull is logged and reported as [`Reconciliation::Stale`]
    /// rather than as an error; the deletion itself has already committed.
    ///
    /// # Errors
    /// Returns error if the notice is empty, carries a nil id, or removed
    /// nothing (in which case no pull is made)
    pub async fn apply_deletion(&self, deletion: &Deletion) -> Result<Reconciliation, IntakeError> {
        let project_id = deletion.project_id();
        if deletion.is_empty() {
            return Err(IntakeError::EmptyIds);
        }
        if deletion.has_nil_id() {
            return Err(IntakeError::NilId { project_id });
        }

        let store = &self.store;
        // Every id is attempted; `||` is ordered so deletion always runs.
        let removed = match deletion {
            Deletion::Conditions(body) => body
                .ids
                .iter()
                .fold(false, |hit, id| store.delete(project_id, *id) || hit),
            Deletion::Documents(body) => body
                .ids
                .iter()
                .fold(false, |hit, id| store.delete_document(project_id, *id) || hit),
            Deletion::Pages(body) => body
                .ids
                .iter()
                .fold(false, |hit, id| store.delete_page(project_id, *id) || hit),
            Deletion::Zones(body) => body
                .ids
                .iter()
                .fold(false, |hit, id| store.delete_zone(project_id, *id) || hit),
        };

        if !removed {
            info!(%project_id, level = deletion.level(), "deletion matched nothing; skipping pull");
            return Err(IntakeError::NotFound { project_id });
        }

        info!(%project_id, level = deletion.level(), ids = deletion.len(), "applied deletion from peer");
        Ok(self.reconcile(project_id).await)
    }

    /// Replace one project with the peer's current conditions
    pub async fn reconcile(&self, project_id: ProjectId) -> Reconciliation {
        match self.peer.fetch_project(project_id).await {
            Ok(trees) => {
                let trees = owned_by(project_id, trees);
                let conditions = trees.len();
                self.store.replace_project(project_id, trees);
                info!(%project_id, conditions, "project reconciled with peer");
                Reconciliation::Refreshed { conditions }
            }
            Err(error) => {
                warn!(%project_id, %error, "reconciliation pull failed; local copy left stale");
                Reconciliation::Stale
            }
        }
    }

    /// Replace the whole store with the peer's state
    ///
    /// Nothing is changed unless every project fetch succeeds.
    ///
    /// # Errors
    /// Returns error on the first failed request
    pub async fn pull_snapshot(&self) -> Result<SnapshotStats, IntakeError> {
        let project_ids = self.peer.fetch_project_ids().await?;
        let lists = try_join_all(project_ids.iter().map(|id| self.peer.fetch_project(*id))).await?;

        let snapshot: ProjectMap = project_ids
            .into_iter()
            .zip(lists)
            .map(|(id, trees)| (id, owned_by(id, trees)))
            .collect();
        let stats = SnapshotStats {
            projects: snapshot.len(),
            conditions: snapshot.values().map(Vec::len).sum(),
        };
        self.store.replace_all(snapshot);

        info!(projects = stats.projects, conditions = stats.conditions, "snapshot pulled from peer");
        Ok(stats)
    }
}
