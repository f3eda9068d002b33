//! Idempotent structural merge
//!
//! Folds an incoming tree (full or diff) into an existing one, matching
//! children by id at every level. Unmatched incoming children are appended,
//! matched ones have their summary overwritten and are merged recursively.
//! Nothing is ever removed; removal belongs to the store's delete operations.

use csync_model::{Document, Page, ProjectConditionTree, TreeNode, Zone};

/// Node that can absorb an incoming version of itself
pub trait Mergeable: TreeNode {
    /// Overwrite own data from `incoming` and merge children by id
    fn merge_from(&mut self, incoming: &Self);
}

/// Merge incoming children into `existing` by id
pub fn merge_children<C: Mergeable>(existing: &mut Vec<C>, incoming: &[C]) {
    for child in incoming {
        match existing.iter().position(|current| current.id() == child.id()) {
            Some(index) => existing[index].merge_from(child),
            None => existing.push(child.clone()),
        }
    }
}

impl Mergeable for Zone {
    fn merge_from(&mut self, incoming: &Self) {
        self.summary = incoming.summary.clone();
    }
}

impl Mergeable for Page {
    fn merge_from(&mut self, incoming: &Self) {
        self.page_number = incoming.page_number;
        self.summary = incoming.summary.clone();
        merge_children(&mut self.zones, &incoming.zones);
    }
}

impl Mergeable for Document {
    fn merge_from(&mut self, incoming: &Self) {
        self.summary = incoming.summary.clone();
        merge_children(&mut self.pages, &incoming.pages);
    }
}

impl Mergeable for ProjectConditionTree {
    fn merge_from(&mut self, incoming: &Self) {
        merge_children(&mut self.documents, &incoming.documents);
        // The sender's root total is authoritative.
        self.summary = incoming.summary.clone();
    }
}

/// Merge `incoming` into `existing` and return a copy of the result
pub fn merge(
    existing: &mut ProjectConditionTree,
    incoming: &ProjectConditionTree,
) -> ProjectConditionTree {
    existing.merge_from(incoming);
    existing.clone()
}
