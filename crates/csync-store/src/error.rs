//! Store error types

use csync_model::{ConditionId, ProjectId};

/// Rejection of malformed input before any mutation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Tree carries the nil project id
    #[error("project id must not be nil (condition {condition_id})")]
    NilProject { condition_id: ConditionId },

    /// Tree carries the nil condition id
    #[error("condition id must not be nil (project {project_id})")]
    NilCondition { project_id: ProjectId },

    /// `add` found the condition already present
    #[error("condition {condition_id} already exists in project {project_id}")]
    DuplicateCondition {
        project_id: ProjectId,
        condition_id: ConditionId,
    },
}

impl StoreError {
    /// Whether the caller sent an unusable identifier
    #[inline]
    #[must_use]
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, Self::NilProject { .. } | Self::NilCondition { .. })
    }

    /// Whether the request clashes with existing state
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::DuplicateCondition { .. })
    }
}
