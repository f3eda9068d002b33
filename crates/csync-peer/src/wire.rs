//! Payload shapes and endpoint paths shared by both roles

use csync_model::{ConditionId, DocumentId, PageId, ProjectId, ZoneId};
use serde::{Deserialize, Serialize};

/// Endpoint paths, relative to the service root
pub mod endpoint {
    use csync_model::ProjectId;

    /// Change intake on the consumer
    pub const CONDITIONS_CHANGED: &str = "api/interactions/conditions-changed";
    /// Condition deletion intake
    pub const DELETED_CONDITIONS: &str = "api/interactions/deleted-condition-ids";
    /// Document deletion intake
    pub const DELETED_DOCUMENTS: &str = "api/interactions/deleted-document-ids";
    /// Page deletion intake
    pub const DELETED_PAGES: &str = "api/interactions/deleted-page-ids";
    /// Zone deletion intake
    pub const DELETED_ZONES: &str = "api/interactions/deleted-zone-ids";
    /// Project id listing
    pub const PROJECTS: &str = "api/projects";

    /// Condition listing of one project
    #[must_use]
    pub fn project_conditions(project_id: ProjectId) -> String {
        format!("{PROJECTS}/{project_id}/conditions")
    }
}

/// Ids removed from one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedIds<I> {
    pub project_id: ProjectId,
    #[serde(default = "Vec::new")]
    pub ids: Vec<I>,
}

impl<I> DeletedIds<I> {
    /// Create new deletion payload
    #[inline]
    #[must_use]
    pub fn new(project_id: ProjectId, ids: Vec<I>) -> Self {
        Self { project_id, ids }
    }

    /// Payload for a single id
    #[inline]
    #[must_use]
    pub fn single(project_id: ProjectId, id: I) -> Self {
        Self::new(project_id, vec![id])
    }
}

/// Deletion notice for one level of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    Conditions(DeletedIds<ConditionId>),
    Documents(DeletedIds<DocumentId>),
    Pages(DeletedIds<PageId>),
    Zones(DeletedIds<ZoneId>),
}

macro_rules! each_level {
    ($deletion:expr, $body:ident => $expr:expr) => {
        match $deletion {
            Deletion::Conditions($body) => $expr,
            Deletion::Documents($body) => $expr,
            Deletion::Pages($body) => $expr,
            Deletion::Zones($body) => $expr,
        }
    };
}

impl Deletion {
    /// Project the ids belong to
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        each_level!(self, body => body.project_id)
    }

    /// Number of ids carried
    #[must_use]
    pub fn len(&self) -> usize {
        each_level!(self, body => body.ids.len())
    }

    /// Whether no ids are carried
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the project id or any carried id is nil
    #[must_use]
    pub fn has_nil_id(&self) -> bool {
        self.project_id().is_nil() || each_level!(self, body => body.ids.iter().any(|id| id.is_nil()))
    }

    /// Intake endpoint on the receiving side
    #[must_use]
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Conditions(_) => endpoint::DELETED_CONDITIONS,
            Self::Documents(_) => endpoint::DELETED_DOCUMENTS,
            Self::Pages(_) => endpoint::DELETED_PAGES,
            Self::Zones(_) => endpoint::DELETED_ZONES,
        }
    }

    /// Level name for logs
    #[must_use]
    pub fn level(&self) -> &'static str {
        match self {
            Self::Conditions(_) => "condition",
            Self::Documents(_) => "document",
            Self::Pages(_) => "page",
            Self::Zones(_) => "zone",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deletion_body_is_camel_case() {
        let project_id = ProjectId::new();
        let zone = ZoneId::new();
        let json = serde_json::to_value(DeletedIds::single(project_id, zone)).unwrap();

        assert_eq!(json["projectId"], project_id.to_string());
        assert_eq!(json["ids"][0], zone.to_string());
    }

    #[test]
    fn missing_ids_deserialize_empty() {
        let json = format!(r#"{{"projectId":"{}"}}"#, ProjectId::new());
        let body: DeletedIds<PageId> = serde_json::from_str(&json).unwrap();

        assert!(Deletion::Pages(body).is_empty());
    }

    #[test]
    fn nil_ids_are_detected() {
        let project_id = ProjectId::new();

        assert!(Deletion::Zones(DeletedIds::single(project_id, ZoneId::nil())).has_nil_id());
        assert!(Deletion::Zones(DeletedIds::single(ProjectId::nil(), ZoneId::new())).has_nil_id());
        assert!(!Deletion::Zones(DeletedIds::single(project_id, ZoneId::new())).has_nil_id());
    }

    #[test]
    fn each_level_has_its_own_endpoint() {
        let project_id = ProjectId::new();
        let endpoints = [
            Deletion::Conditions(DeletedIds::new(project_id, vec![])).endpoint(),
            Deletion::Documents(DeletedIds::new(project_id, vec![])).endpoint(),
            Deletion::Pages(DeletedIds::new(project_id, vec![])).endpoint(),
            Deletion::Zones(DeletedIds::new(project_id, vec![])).endpoint(),
        ];

        assert_eq!(endpoints[3], "api/interactions/deleted-zone-ids");
        for (i, a) in endpoints.iter().enumerate() {
            assert!(endpoints[i + 1..].iter().all(|b| a != b));
        }
        assert_eq!(
            endpoint::project_conditions(project_id),
            format!("api/projects/{project_id}/conditions")
        );
    }
}
