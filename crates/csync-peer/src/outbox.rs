//! Outbound push queue
//!
//! Writers hand pushes to [`Outbox::submit`] and return immediately. One
//! background task drains the queue in submission order; callers that need
//! commit order on the wire must submit in commit order, as
//! [`SourceService`](crate::SourceService) does. Failed deliveries are logged
//! and dropped.

use crate::error::PeerError;
use crate::transport::SharedTransport;
use crate::wire::{endpoint, Deletion};
use csync_model::ProjectConditionTree;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A push waiting for delivery
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Full trees for first-seen conditions, diffs otherwise
    Changes(Vec<ProjectConditionTree>),
    /// Ids removed on the sending side
    Deletion(Deletion),
}

impl Outbound {
    /// Endpoint the push targets
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Changes(_) => endpoint::CONDITIONS_CHANGED,
            Self::Deletion(deletion) => deletion.endpoint(),
        }
    }
}

/// Sending half of the outbound queue
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::Sender<Outbound>,
}

impl Outbox {
    /// Start the delivery task on the current runtime
    ///
    /// The task ends once every `Outbox` clone is dropped and the queue has
    /// drained.
    #[must_use]
    pub fn spawn(transport: SharedTransport, capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(deliver_loop(transport, receiver));
        (Self { sender }, handle)
    }

    /// Queue a push without waiting
    ///
    /// # Errors
    /// Returns error if the queue is full or the delivery task has stopped
    pub fn submit(&self, message: Outbound) -> Result<(), PeerError> {
        self.sender.try_send(message).map_err(|e| match e {
            TrySendError::Full(_) => PeerError::QueueFull,
            TrySendError::Closed(_) => PeerError::QueueClosed,
        })
    }

    /// Pushes currently waiting
    #[must_use]
    pub fn pending(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

async fn deliver(transport: &SharedTransport, message: Outbound) -> Result<(), PeerError> {
    match message {
        Outbound::Changes(trees) => transport.push_changes(trees).await,
        Outbound::Deletion(deletion) => transport.push_deletion(deletion).await,
    }
}

async fn deliver_loop(transport: SharedTransport, mut receiver: mpsc::Receiver<Outbound>) {
    while let Some(message) = receiver.recv().await {
        let endpoint = message.endpoint();
        match deliver(&transport, message).await {
            Ok(()) => debug!(endpoint, "push delivered"),
            Err(error) => warn!(
                endpoint,
                %error,
                transient = error.is_transient(),
                "push to peer failed; dropped"
            ),
        }
    }
    debug!("outbox drained and closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockPeerTransport;
    use crate::wire::DeletedIds;
    use csync_model::{ConditionId, ProjectId};
    use std::sync::Arc;

    #[tokio::test]
    async fn delivers_in_submission_order() {
        let mut transport = MockPeerTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_push_changes()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        transport
            .expect_push_deletion()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let (outbox, handle) = Outbox::spawn(Arc::new(transport), 8);
        let project_id = ProjectId::new();
        outbox
            .submit(Outbound::Changes(vec![ProjectConditionTree::new(
                project_id,
                ConditionId::new(),
            )]))
            .unwrap();
        outbox
            .submit(Outbound::Deletion(Deletion::Conditions(DeletedIds::single(
                project_id,
                ConditionId::new(),
            ))))
            .unwrap();

        drop(outbox);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn failed_push_does_not_stop_the_worker() {
        let mut transport = MockPeerTransport::new();
        let mut calls = 0;
        transport.expect_push_changes().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(PeerError::Status {
                    endpoint: endpoint::CONDITIONS_CHANGED.to_string(),
                    status: 500,
                })
            } else {
                Ok(())
            }
        });

        let (outbox, handle) = Outbox::spawn(Arc::new(transport), 8);
        outbox.submit(Outbound::Changes(Vec::new())).unwrap();
        outbox.submit(Outbound::Changes(Vec::new())).unwrap();

        drop(outbox);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn submit_after_worker_stops_reports_closed() {
        let (outbox, handle) = Outbox::spawn(Arc::new(MockPeerTransport::new()), 1);
        handle.abort();
        let _ = handle.await;

        assert!(matches!(
            outbox.submit(Outbound::Changes(Vec::new())),
            Err(PeerError::QueueClosed)
        ));
    }
}
