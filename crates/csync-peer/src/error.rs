//! Error types for peer communication and intake

use csync_model::ProjectId;
use csync_store::StoreError;

/// Failure talking to the peer service
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Connection, timeout or body decoding failure
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Peer answered with a non-success status
    #[error("{endpoint} answered {status}")]
    Status { endpoint: String, status: u16 },

    /// Peer base URL or endpoint path does not parse
    #[error("invalid peer url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Outbound queue at capacity
    #[error("outbound queue is full")]
    QueueFull,

    /// Outbound worker has stopped
    #[error("outbound queue is closed")]
    QueueClosed,
}

impl PeerError {
    /// Check if a later attempt could succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { source, .. } => source.is_timeout() || source.is_connect(),
            Self::Status { status, .. } => *status >= 500,
            Self::QueueFull => true,
            Self::InvalidUrl { .. } | Self::QueueClosed => false,
        }
    }
}

/// Rejection or failure of a request arriving from the peer
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// Change batch carried no trees
    #[error("change list is empty")]
    EmptyChanges,

    /// Deletion carried no ids
    #[error("deletion id list is empty")]
    EmptyIds,

    /// Deletion carried a nil project or node id
    #[error("nil identifier in deletion for project {project_id}")]
    NilId { project_id: ProjectId },

    /// Deletion matched nothing locally
    #[error("nothing to delete in project {project_id}")]
    NotFound { project_id: ProjectId },

    /// Store refused the input
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Pulling from the peer failed
    #[error("snapshot pull failed: {0}")]
    Pull(#[from] PeerError),
}

impl IntakeError {
    /// Whether the request itself was malformed
    #[inline]
    #[must_use]
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            Self::EmptyChanges | Self::EmptyIds | Self::NilId { .. } | Self::Store(_)
        )
    }

    /// Whether the request referenced nothing that exists
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_classify_by_code() {
        let server = PeerError::Status {
            endpoint: "api/projects".into(),
            status: 503,
        };
        let client = PeerError::Status {
            endpoint: "api/projects".into(),
            status: 400,
        };

        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(PeerError::QueueFull.is_transient());
        assert!(!PeerError::QueueClosed.is_transient());
    }

    #[test]
    fn intake_errors_map_to_request_classes() {
        let project_id = ProjectId::new();

        assert!(IntakeError::EmptyChanges.is_bad_request());
        assert!(IntakeError::NilId { project_id }.is_bad_request());
        assert!(IntakeError::NotFound { project_id }.is_not_found());
        assert!(!IntakeError::from(PeerError::QueueClosed).is_bad_request());
    }
}
