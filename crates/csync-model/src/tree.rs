//! Condition tree: condition → documents → pages → zones
//!
//! Parents own their children by value. Zones are the only authoritative
//! level; every other summary is derived bottom-up (see
//! [`crate::aggregate`]).

use crate::ids::{ConditionId, DocumentId, PageId, ProjectId, ZoneId};
use crate::quantity::Summary;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

/// Common view over every node of the hierarchy
pub trait TreeNode: Clone {
    /// Identifier type at this level
    type Id: Copy + Eq + Hash + fmt::Display;

    /// Identifier of this node
    fn id(&self) -> Self::Id;

    /// Summary carried by this node
    fn summary(&self) -> &Summary;

    /// Mutable summary
    fn summary_mut(&mut self) -> &mut Summary;
}

/// Leaf: raw entered quantities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub id: ZoneId,
    #[serde(default)]
    pub summary: Summary,
}

impl Zone {
    /// Create new zone
    #[inline]
    #[must_use]
    pub fn new(id: ZoneId, summary: Summary) -> Self {
        Self { id, summary }
    }
}

/// Page of a document: totals of its zones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    #[serde(default)]
    pub page_number: u32,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub zones: Vec<Zone>,
}

impl Page {
    /// Create empty page
    #[inline]
    #[must_use]
    pub fn new(id: PageId, page_number: u32) -> Self {
        Self {
            id,
            page_number,
            summary: Summary::new(),
            zones: Vec::new(),
        }
    }

    /// Append a zone
    #[inline]
    #[must_use]
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zones.push(zone);
        self
    }

    /// Zone by id
    #[must_use]
    pub fn zone(&self, id: ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id == id)
    }
}

/// Document of a condition: totals of its pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Document {
    /// Create empty document
    #[inline]
    #[must_use]
    pub fn new(id: DocumentId) -> Self {
        Self {
            id,
            summary: Summary::new(),
            pages: Vec::new(),
        }
    }

    /// Append a page
    #[inline]
    #[must_use]
    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }

    /// Page by id
    #[must_use]
    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }
}

/// Root of one condition's quantities within a project
///
/// Identified by `(project_id, condition_id)`. Also used as the wire shape of
/// a diff: a diff is a tree holding only the changed subset of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConditionTree {
    pub project_id: ProjectId,
    pub condition_id: ConditionId,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub documents: Vec<Document>,
}

impl ProjectConditionTree {
    /// Create empty condition tree
    #[inline]
    #[must_use]
    pub fn new(project_id: ProjectId, condition_id: ConditionId) -> Self {
        Self {
            project_id,
            condition_id,
            summary: Summary::new(),
            documents: Vec::new(),
        }
    }

    /// Append a document
    #[inline]
    #[must_use]
    pub fn with_document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    /// Document by id
    #[must_use]
    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// First page with the given id, searching every document
    #[must_use]
    pub fn find_page(&self, id: PageId) -> Option<&Page> {
        self.documents.iter().find_map(|d| d.page(id))
    }

    /// First zone with the given id, searching every page
    #[must_use]
    pub fn find_zone(&self, id: ZoneId) -> Option<&Zone> {
        self.documents
            .iter()
            .flat_map(|d| d.pages.iter())
            .find_map(|p| p.zone(id))
    }

    /// Total number of zones below this condition
    #[must_use]
    pub fn zone_count(&self) -> usize {
        self.documents
            .iter()
            .flat_map(|d| d.pages.iter())
            .map(|p| p.zones.len())
            .sum()
    }

    /// Whether the tree carries no documents
    #[inline]
    #[must_use]
    pub fn is_bare(&self) -> bool {
        self.documents.is_empty()
    }
}

macro_rules! impl_tree_node {
    ($node:ty, $id:ty) => {
        impl TreeNode for $node {
            type Id = $id;

            #[inline]
            fn id(&self) -> Self::Id {
                self.id
            }

            #[inline]
            fn summary(&self) -> &Summary {
                &self.summary
            }

            #[inline]
            fn summary_mut(&mut self) -> &mut Summary {
                &mut self.summary
            }
        }
    };
}

impl_tree_node!(Zone, ZoneId);
impl_tree_node!(Page, PageId);
impl_tree_node!(Document, DocumentId);

impl TreeNode for ProjectConditionTree {
    type Id = ConditionId;

    #[inline]
    fn id(&self) -> Self::Id {
        self.condition_id
    }

    #[inline]
    fn summary(&self) -> &Summary {
        &self.summary
    }

    #[inline]
    fn summary_mut(&mut self) -> &mut Summary {
        &mut self.summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;

    #[test]
    fn missing_collections_deserialize_empty() {
        let project = ProjectId::new();
        let condition = ConditionId::new();
        let json = format!(
            r#"{{"projectId":"{project}","conditionId":"{condition}","documents":[{{"id":"{}"}}]}}"#,
            DocumentId::new()
        );

        let tree: ProjectConditionTree = serde_json::from_str(&json).unwrap();
        assert!(tree.summary.is_empty());
        assert_eq!(tree.documents.len(), 1);
        assert!(tree.documents[0].pages.is_empty());
        assert!(tree.documents[0].summary.is_empty());
    }

    #[test]
    fn lookups_walk_the_hierarchy() {
        let zone_id = ZoneId::new();
        let page_id = PageId::new();
        let tree = ProjectConditionTree::new(ProjectId::new(), ConditionId::new()).with_document(
            Document::new(DocumentId::new()).with_page(Page::new(page_id, 3).with_zone(
                Zone::new(zone_id, vec![Quantity::new("Area", "sf", 1.0)].into()),
            )),
        );

        assert_eq!(tree.find_page(page_id).map(|p| p.page_number), Some(3));
        assert!(tree.find_zone(zone_id).is_some());
        assert!(tree.find_zone(ZoneId::new()).is_none());
        assert_eq!(tree.zone_count(), 1);
        assert!(!tree.is_bare());
    }

    #[test]
    fn wire_names_are_camel_case() {
        let page = Page::new(PageId::new(), 7);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageNumber"], 7);
        assert!(json["zones"].as_array().unwrap().is_empty());
    }
}
