//! In-memory condition tree store
//!
//! Provides [`ConditionTreeStore`], the single owner of one service's
//! hierarchy. Every value entering or leaving the store is an owned deep
//! copy, so callers can never alias internal state.

use crate::error::StoreError;
use csync_delta::{compute_diff, merge};
use csync_model::{
    Aggregate, ConditionId, DocumentId, PageId, ProjectConditionTree, ProjectId, ZoneId,
};
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Projects keyed by id, each holding its condition trees in insertion order
pub type ProjectMap = IndexMap<ProjectId, Vec<ProjectConditionTree>>;

/// Shared handle to a store
pub type SharedStore = Arc<ConditionTreeStore>;

/// Outcome of an update: the committed tree and what it replaced
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    /// Tree as committed, re-aggregated
    pub current: ProjectConditionTree,

    /// Tree previously stored under the same condition id
    pub previous: Option<ProjectConditionTree>,
}

impl Revision {
    /// Whether the condition was not stored before this update
    #[inline]
    #[must_use]
    pub fn is_first_seen(&self) -> bool {
        self.previous.is_none()
    }

    /// Changes to push to a peer: the full tree when first seen, otherwise
    /// only the changed nodes
    #[must_use]
    pub fn diff(&self) -> ProjectConditionTree {
        compute_diff(&self.current, self.previous.as_ref())
    }
}

/// Lock-guarded map of project id to condition trees
///
/// One mutex serializes every read and write. No method performs I/O while
/// holding it.
#[derive(Debug, Default)]
pub struct ConditionTreeStore {
    projects: Mutex<ProjectMap>,
}

fn validate(tree: &ProjectConditionTree) -> Result<(), StoreError> {
    if tree.project_id.is_nil() {
        return Err(StoreError::NilProject {
            condition_id: tree.condition_id,
        });
    }
    if tree.condition_id.is_nil() {
        return Err(StoreError::NilCondition {
            project_id: tree.project_id,
        });
    }
    Ok(())
}

/// Apply `remove_from` to each condition, re-aggregating the ones that lost
/// a node
fn prune<F>(trees: &mut [ProjectConditionTree], mut remove_from: F) -> bool
where
    F: FnMut(&mut ProjectConditionTree) -> bool,
{
    let mut removed = false;
    for tree in trees {
        if remove_from(tree) {
            tree.reaggregate();
            removed = true;
        }
    }
    removed
}

fn retain_counting<T>(items: &mut Vec<T>, keep: impl FnMut(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(keep);
    items.len() != before
}

impl ConditionTreeStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store from an existing snapshot
    #[must_use]
    pub fn from_snapshot(snapshot: ProjectMap) -> Self {
        Self {
            projects: Mutex::new(snapshot),
        }
    }

    /// Create a shareable handle
    #[inline]
    #[must_use]
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }

    /// All conditions of a project, empty when the project is unknown
    #[must_use]
    pub fn get_all(&self, project_id: ProjectId) -> Vec<ProjectConditionTree> {
        self.projects
            .lock()
            .get(&project_id)
            .cloned()
            .unwrap_or_default()
    }

    /// One condition of a project
    #[must_use]
    pub fn get(
        &self,
        project_id: ProjectId,
        condition_id: ConditionId,
    ) -> Option<ProjectConditionTree> {
        self.projects
            .lock()
            .get(&project_id)?
            .iter()
            .find(|t| t.condition_id == condition_id)
            .cloned()
    }

    /// Ids of every project holding state, in first-seen order
    #[must_use]
    pub fn project_ids(&self) -> Vec<ProjectId> {
        self.projects.lock().keys().copied().collect()
    }

    /// Copy of the whole store
    #[must_use]
    pub fn snapshot(&self) -> ProjectMap {
        self.projects.lock().clone()
    }

    /// Insert a new condition and aggregate it
    ///
    /// # Errors
    /// Returns error on nil ids or when the condition already exists
    pub fn add(&self, tree: &ProjectConditionTree) -> Result<ProjectConditionTree, StoreError> {
        validate(tree)?;

        let mut copy = tree.clone();
        copy.reaggregate();

        let mut projects = self.projects.lock();
        let list = projects.entry(copy.project_id).or_default();
        if list.iter().any(|t| t.condition_id == copy.condition_id) {
            return Err(StoreError::DuplicateCondition {
                project_id: copy.project_id,
                condition_id: copy.condition_id,
            });
        }
        list.push(copy.clone());

        debug!(
            project_id = %copy.project_id,
            condition_id = %copy.condition_id,
            zones = copy.zone_count(),
            "condition added"
        );
        Ok(copy)
    }

    /// Replace a condition wholesale, inserting it when absent
    ///
    /// # Errors
    /// Returns error on nil ids
    pub fn update(&self, tree: &ProjectConditionTree) -> Result<Revision, StoreError> {
        validate(tree)?;

        let mut copy = tree.clone();
        copy.reaggregate();

        let mut projects = self.projects.lock();
        let list = projects.entry(copy.project_id).or_default();
        let previous = match list.iter().position(|t| t.condition_id == copy.condition_id) {
            Some(index) => Some(std::mem::replace(&mut list[index], copy.clone())),
            None => {
                list.push(copy.clone());
                None
            }
        };

        debug!(
            project_id = %copy.project_id,
            condition_id = %copy.condition_id,
            first_seen = previous.is_none(),
            "condition updated"
        );
        Ok(Revision {
            current: copy,
            previous,
        })
    }

    /// Fold incoming trees (full or diff) into the store
    ///
    /// New conditions are inserted as received; known ones are merged by id
    /// without re-aggregation, trusting the sender's summaries. The whole
    /// batch is validated before anything is touched.
    ///
    /// # Errors
    /// Returns error when any tree carries a nil id
    pub fn upsert(
        &self,
        incoming: &[ProjectConditionTree],
    ) -> Result<Vec<ProjectConditionTree>, StoreError> {
        incoming.iter().try_for_each(validate)?;

        let mut projects = self.projects.lock();
        let mut committed = Vec::with_capacity(incoming.len());

        for tree in incoming {
            let list = projects.entry(tree.project_id).or_default();
            let result = match list.iter().position(|t| t.condition_id == tree.condition_id) {
                Some(index) => merge(&mut list[index], tree),
                None => {
                    list.push(tree.clone());
                    tree.clone()
                }
            };
            committed.push(result);
        }

        debug!(count = committed.len(), "conditions upserted");
        Ok(committed)
    }

    /// Remove a condition
    pub fn delete(&self, project_id: ProjectId, condition_id: ConditionId) -> bool {
        let mut projects = self.projects.lock();
        let Some(list) = projects.get_mut(&project_id) else {
            return false;
        };

        let removed = retain_counting(list, |t| t.condition_id != condition_id);
        if removed {
            debug!(%project_id, %condition_id, "condition deleted");
        }
        removed
    }

    /// Remove a document from every condition of the project
    pub fn delete_document(&self, project_id: ProjectId, document_id: DocumentId) -> bool {
        self.prune_project(project_id, |tree| {
            retain_counting(&mut tree.documents, |d| d.id != document_id)
        })
    }

    /// Remove a page from every document of the project
    pub fn delete_page(&self, project_id: ProjectId, page_id: PageId) -> bool {
        self.prune_project(project_id, |tree| {
            tree.documents.iter_mut().fold(false, |removed, doc| {
                retain_counting(&mut doc.pages, |p| p.id != page_id) || removed
            })
        })
    }

    /// Remove a zone from every page of the project
    pub fn delete_zone(&self, project_id: ProjectId, zone_id: ZoneId) -> bool {
        self.prune_project(project_id, |tree| {
            tree.documents
                .iter_mut()
                .flat_map(|doc| doc.pages.iter_mut())
                .fold(false, |removed, page| {
                    retain_counting(&mut page.zones, |z| z.id != zone_id) || removed
                })
        })
    }

    fn prune_project<F>(&self, project_id: ProjectId, remove_from: F) -> bool
    where
        F: FnMut(&mut ProjectConditionTree) -> bool,
    {
        let mut projects = self.projects.lock();
        let Some(list) = projects.get_mut(&project_id) else {
            return false;
        };
        prune(list, remove_from)
    }

    /// Replace one project's conditions wholesale
    pub fn replace_project(&self, project_id: ProjectId, trees: Vec<ProjectConditionTree>) {
        let count = trees.len();
        self.projects.lock().insert(project_id, trees);
        debug!(%project_id, count, "project replaced");
    }

    /// Swap in a complete snapshot, discarding all previous state
    pub fn replace_all(&self, snapshot: ProjectMap) {
        let projects = snapshot.len();
        *self.projects.lock() = snapshot;
        info!(projects, "store replaced from snapshot");
    }
}
