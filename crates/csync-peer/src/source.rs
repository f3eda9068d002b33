//! Source-side service: local edits commit first, then push to the peer

use crate::outbox::{Outbound, Outbox};
use crate::wire::{DeletedIds, Deletion};
use csync_model::{ConditionId, DocumentId, PageId, ProjectConditionTree, ProjectId, ZoneId};
use csync_store::{SharedStore, StoreError};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, warn};

/// Edits on the authoritative copy, each followed by a fire-and-forget push
///
/// A commit and the queueing of its push happen under one ordering lock, so
/// pushes reach the outbox in commit order even with concurrent writers.
#[derive(Debug, Clone)]
pub struct SourceService {
    store: SharedStore,
    outbox: Outbox,
    ordering: Arc<Mutex<()>>,
}

impl SourceService {
    /// Create new service over a store and an outbound queue
    #[inline]
    #[must_use]
    pub fn new(store: SharedStore, outbox: Outbox) -> Self {
        Self {
            store,
            outbox,
            ordering: Arc::new(Mutex::new(())),
        }
    }

    /// Underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Insert a new condition and push it whole
    ///
    /// A nil condition id is replaced by a fresh one.
    ///
    /// # Errors
    /// Returns error if the project id is nil or the condition already exists
    pub fn create(
        &self,
        mut tree: ProjectConditionTree,
    ) -> Result<ProjectConditionTree, StoreError> {
        if tree.condition_id.is_nil() {
            tree.condition_id = ConditionId::new();
        }

        let _ordered = self.ordering.lock();
        let stored = self.store.add(&tree)?;
        info!(
            project_id = %stored.project_id,
            condition_id = %stored.condition_id,
            "condition created"
        );
        self.push(Outbound::Changes(vec![stored.clone()]));
        Ok(stored)
    }

    /// Replace a condition and push what changed
    ///
    /// `condition_id` overrides whatever id the tree carries.
    ///
    /// # Errors
    /// Returns error if either id is nil
    pub fn update(
        &self,
        condition_id: ConditionId,
        mut tree: ProjectConditionTree,
    ) -> Result<ProjectConditionTree, StoreError> {
        tree.condition_id = condition_id;

        let _ordered = self.ordering.lock();
        let revision = self.store.update(&tree)?;
        let diff = revision.diff();
        info!(
            project_id = %diff.project_id,
            %condition_id,
            first_seen = revision.is_first_seen(),
            changed_zones = diff.zone_count(),
            "condition updated"
        );
        self.push(Outbound::Changes(vec![diff]));
        Ok(revision.current)
    }

    /// Delete a condition, pushing the id when something was removed
    pub fn delete_condition(&self, project_id: ProjectId, condition_id: ConditionId) -> bool {
        let _ordered = self.ordering.lock();
        let removed = self.store.delete(project_id, condition_id);
        self.after_delete(removed, Deletion::Conditions(DeletedIds::single(project_id, condition_id)))
    }

    /// Delete a document from every condition of the project
    pub fn delete_document(&self, project_id: ProjectId, document_id: DocumentId) -> bool {
        let _ordered = self.ordering.lock();
        let removed = self.store.delete_document(project_id, document_id);
        self.after_delete(removed, Deletion::Documents(DeletedIds::single(project_id, document_id)))
    }

    /// Delete a page from every condition of the project
    pub fn delete_page(&self, project_id: ProjectId, page_id: PageId) -> bool {
        let _ordered = self.ordering.lock();
        let removed = self.store.delete_page(project_id, page_id);
        self.after_delete(removed, Deletion::Pages(DeletedIds::single(project_id, page_id)))
    }

    /// Delete a zone from every condition of the project
    pub fn delete_zone(&self, project_id: ProjectId, zone_id: ZoneId) -> bool {
        let _ordered = self.ordering.lock();
        let removed = self.store.delete_zone(project_id, zone_id);
        self.after_delete(removed, Deletion::Zones(DeletedIds::single(project_id, zone_id)))
    }

    fn after_delete(&self, removed: bool, deletion: Deletion) -> bool {
        if removed {
            info!(
                project_id = %deletion.project_id(),
                level = deletion.level(),
                "deleted"
            );
            self.push(Outbound::Deletion(deletion));
        }
        removed
    }

    fn push(&self, message: Outbound) {
        let endpoint = message.endpoint();
        if let Err(error) = self.outbox.submit(message) {
            warn!(endpoint, %error, "push not queued; peer will miss this change");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PeerError;
    use crate::transport::MockPeerTransport;
    use csync_model::prelude::*;
    use csync_store::ConditionTreeStore;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};

    fn area(value: f64) -> Summary {
        vec![Quantity::new("Area", "sf", value)].into()
    }

    fn tree(project_id: ProjectId, zones: &[(ZoneId, f64)]) -> ProjectConditionTree {
        let page = zones.iter().fold(Page::new(PageId::new(), 1), |page, (id, v)| {
            page.with_zone(Zone::new(*id, area(*v)))
        });
        ProjectConditionTree::new(project_id, ConditionId::nil())
            .with_document(Document::new(DocumentId::new()).with_page(page))
    }

    /// Mock that records pushed change batches
    fn recording_transport() -> (MockPeerTransport, Arc<Mutex<Vec<Vec<ProjectConditionTree>>>>) {
        let pushed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pushed);
        let mut transport = MockPeerTransport::new();
        transport.expect_push_changes().returning(move |trees| {
            sink.lock().unwrap().push(trees);
            Ok(())
        });
        (transport, pushed)
    }

    #[tokio::test]
    async fn create_assigns_id_and_pushes_full_tree() {
        let (transport, pushed) = recording_transport();
        let (outbox, handle) = Outbox::spawn(Arc::new(transport), 8);
        let service = SourceService::new(ConditionTreeStore::shared(), outbox);

        let created = service.create(tree(ProjectId::new(), &[(ZoneId::new(), 100.0)])).unwrap();
        assert!(!created.condition_id.is_nil());

        drop(service);
        handle.await.unwrap();

        let pushed = pushed.lock().unwrap();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0], vec![created]);
    }

    #[tokio::test]
    async fn update_pushes_only_the_diff() {
        let (transport, pushed) = recording_transport();
        let (outbox, handle) = Outbox::spawn(Arc::new(transport), 8);
        let service = SourceService::new(ConditionTreeStore::shared(), outbox);

        let kept = ZoneId::new();
        let changed = ZoneId::new();
        let created = service
            .create(tree(ProjectId::new(), &[(kept, 100.0), (changed, 50.0)]))
            .unwrap();

        let mut edited = created.clone();
        edited.documents[0].pages[0].zones[1].summary = area(70.0);
        // Path id wins over body id.
        edited.condition_id = ConditionId::new();
        let updated = service.update(created.condition_id, edited).unwrap();

        assert_eq!(updated.condition_id, created.condition_id);
        assert_eq!(updated.summary.value_of("Area", "sf"), 170.0);

        drop(service);
        handle.await.unwrap();

        let pushed = pushed.lock().unwrap();
        let diff = &pushed[1][0];
        assert_eq!(diff.zone_count(), 1);
        assert!(diff.find_zone(changed).is_some());
        assert!(diff.find_zone(kept).is_none());
    }

    #[tokio::test]
    async fn delete_pushes_only_when_something_was_removed() {
        let mut transport = MockPeerTransport::new();
        transport.expect_push_changes().returning(|_| Ok(()));
        transport
            .expect_push_deletion()
            .withf(|d| matches!(d, Deletion::Zones(_)) && d.len() == 1)
            .times(1)
            .returning(|_| Ok(()));
        let (outbox, handle) = Outbox::spawn(Arc::new(transport), 8);
        let service = SourceService::new(ConditionTreeStore::shared(), outbox);

        let zone = ZoneId::new();
        let created = service.create(tree(ProjectId::new(), &[(zone, 10.0)])).unwrap();

        assert!(service.delete_zone(created.project_id, zone));
        assert!(!service.delete_zone(created.project_id, zone));
        assert!(!service.delete_page(created.project_id, PageId::new()));

        drop(service);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn peer_failure_never_unwinds_the_commit() {
        let mut transport = MockPeerTransport::new();
        transport.expect_push_changes().returning(|_| {
            Err(PeerError::Status {
                endpoint: "api/interactions/conditions-changed".into(),
                status: 502,
            })
        });
        let (outbox, handle) = Outbox::spawn(Arc::new(transport), 8);
        let store = ConditionTreeStore::shared();
        let service = SourceService::new(Arc::clone(&store), outbox);

        let created = service.create(tree(ProjectId::new(), &[(ZoneId::new(), 5.0)])).unwrap();

        drop(service);
        handle.await.unwrap();
        assert!(store.get(created.project_id, created.condition_id).is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_updates_push_in_commit_order() {
        let (transport, pushed) = recording_transport();
        let (outbox, handle) = Outbox::spawn(Arc::new(transport), 1024);
        let store = ConditionTreeStore::shared();
        let service = SourceService::new(Arc::clone(&store), outbox);

        let zone = ZoneId::new();
        let created = service.create(tree(ProjectId::new(), &[(zone, 1.0)])).unwrap();

        std::thread::scope(|scope| {
            for writer in 0..8_u32 {
                let service = service.clone();
                let base = created.clone();
                scope.spawn(move || {
                    for round in 0..25_u32 {
                        let mut edited = base.clone();
                        edited.documents[0].pages[0].zones[0].summary =
                            area(f64::from(writer * 100 + round + 2));
                        service.update(base.condition_id, edited).unwrap();
                    }
                });
            }
        });

        drop(service);
        handle.await.unwrap();

        let stored = store.get(created.project_id, created.condition_id).unwrap();
        let pushed = pushed.lock().unwrap();
        let last = pushed
            .iter()
            .rev()
            .flatten()
            .find(|diff| diff.find_zone(zone).is_some())
            .unwrap();
        assert_eq!(last.summary, stored.summary);
        assert_eq!(last.find_zone(zone), stored.find_zone(zone));
    }

    #[tokio::test]
    async fn create_rejects_nil_project() {
        let (outbox, _handle) = Outbox::spawn(Arc::new(MockPeerTransport::new()), 8);
        let service = SourceService::new(ConditionTreeStore::shared(), outbox);

        let err = service.create(tree(ProjectId::nil(), &[])).unwrap_err();
        assert!(err.is_invalid_id());
    }
}
