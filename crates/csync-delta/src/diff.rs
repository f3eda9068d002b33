//! Structural diff between two versions of a condition tree
//!
//! The diff is itself a [`ProjectConditionTree`] holding only the nodes that
//! are new or changed, so it travels over the same wire shape as a full tree
//! and can be merged without special casing.

use csync_model::{Document, Page, ProjectConditionTree, TreeNode, Zone};

/// Node that can report what changed relative to an earlier version of itself
pub trait Diffable: TreeNode {
    /// Changed part of `self` relative to `previous`
    ///
    /// Returns `None` when neither the node's own summary nor any descendant
    /// changed. The returned node keeps the current summary and only the
    /// children that are themselves new or changed.
    fn changes_since(&self, previous: &Self) -> Option<Self>;
}

/// New or changed children of `current`, matched against `previous` by id
///
/// Children without a match are new and are returned whole. Unchanged
/// children are omitted.
pub fn diff_children<C: Diffable>(current: &[C], previous: &[C]) -> Vec<C> {
    current
        .iter()
        .filter_map(|child| {
            match previous.iter().find(|old| old.id() == child.id()) {
                Some(old) => child.changes_since(old),
                None => Some(child.clone()),
            }
        })
        .collect()
}

impl Diffable for Zone {
    fn changes_since(&self, previous: &Self) -> Option<Self> {
        (!self.summary.same_as(&previous.summary)).then(|| self.clone())
    }
}

impl Diffable for Page {
    fn changes_since(&self, previous: &Self) -> Option<Self> {
        let zones = diff_children(&self.zones, &previous.zones);
        if zones.is_empty() && self.summary.same_as(&previous.summary) {
            return None;
        }

        Some(Self {
            id: self.id,
            page_number: self.page_number,
            summary: self.summary.clone(),
            zones,
        })
    }
}

impl Diffable for Document {
    fn changes_since(&self, previous: &Self) -> Option<Self> {
        let pages = diff_children(&self.pages, &previous.pages);
        if pages.is_empty() && self.summary.same_as(&previous.summary) {
            return None;
        }

        Some(Self {
            id: self.id,
            summary: self.summary.clone(),
            pages,
        })
    }
}

/// Minimal tree describing how `current` differs from `existing`
///
/// With no existing state the whole of `current` is the diff. The root
/// summary always comes from `current`, even when nothing below changed.
#[must_use]
pub fn compute_diff(
    current: &ProjectConditionTree,
    existing: Option<&ProjectConditionTree>,
) -> ProjectConditionTree {
    let Some(existing) = existing else {
        return current.clone();
    };

    ProjectConditionTree {
        project_id: current.project_id,
        condition_id: current.condition_id,
        summary: current.summary.clone(),
        documents: diff_children(&current.documents, &existing.documents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csync_model::prelude::*;
    use pretty_assertions::assert_eq;

    fn area(value: f64) -> Summary {
        vec![Quantity::new("Area", "sf", value)].into()
    }

    struct Ids {
        doc: DocumentId,
        page: PageId,
        zone_a: ZoneId,
        zone_b: ZoneId,
    }

    fn base() -> (ProjectConditionTree, Ids) {
        let ids = Ids {
            doc: DocumentId::new(),
            page: PageId::new(),
            zone_a: ZoneId::new(),
            zone_b: ZoneId::new(),
        };
        let mut tree = ProjectConditionTree::new(ProjectId::new(), ConditionId::new())
            .with_document(
                Document::new(ids.doc).with_page(
                    Page::new(ids.page, 1)
                        .with_zone(Zone::new(ids.zone_a, area(100.0)))
                        .with_zone(Zone::new(ids.zone_b, area(50.0))),
                ),
            )
            .with_document(
                Document::new(DocumentId::new()).with_page(
                    Page::new(PageId::new(), 1).with_zone(Zone::new(ZoneId::new(), area(7.0))),
                ),
            );
        tree.reaggregate();
        (tree, ids)
    }

    #[test]
    fn first_seen_condition_diffs_to_full_tree() {
        let (tree, _) = base();
        assert_eq!(compute_diff(&tree, None), tree);
    }

    #[test]
    fn identical_trees_diff_to_bare_root() {
        let (tree, _) = base();
        let diff = compute_diff(&tree, Some(&tree));

        assert!(diff.documents.is_empty());
        assert_eq!(diff.summary, tree.summary);
    }

    #[test]
    fn reordered_summary_is_not_a_change() {
        let (old, ids) = base();
        let mut new = old.clone();
        new.documents[0].pages[0].zones[0].summary =
            vec![Quantity::new("Count", "ea", 1.0), Quantity::new("Area", "sf", 100.0)].into();
        let mut old = old;
        old.documents[0].pages[0].zones[0].summary =
            vec![Quantity::new("Area", "sf", 100.0), Quantity::new("Count", "ea", 1.0)].into();

        let diff = compute_diff(&new, Some(&old));
        assert!(diff.documents.is_empty(), "zone {} should be unchanged", ids.zone_a);
    }

    #[test]
    fn changed_zone_pulls_in_its_ancestors_only() {
        let (old, ids) = base();
        let mut new = old.clone();
        new.documents[0].pages[0].zones[1].summary = area(75.0);
        new.reaggregate();

        let diff = compute_diff(&new, Some(&old));

        assert_eq!(diff.documents.len(), 1);
        let doc = &diff.documents[0];
        assert_eq!(doc.id, ids.doc);
        assert_eq!(doc.summary.value_of("Area", "sf"), 175.0);
        assert_eq!(doc.pages.len(), 1);
        assert_eq!(doc.pages[0].zones.len(), 1);
        assert_eq!(doc.pages[0].zones[0].id, ids.zone_b);
        assert_eq!(diff.summary.value_of("Area", "sf"), 182.0);
    }

    #[test]
    fn new_zone_is_included_whole() {
        let (old, ids) = base();
        let mut new = old.clone();
        let added = ZoneId::new();
        new.documents[0].pages[0].zones.push(Zone::new(added, area(25.0)));
        new.reaggregate();

        let diff = compute_diff(&new, Some(&old));
        let page = diff.find_page(ids.page).unwrap();

        assert_eq!(page.zones.len(), 1);
        assert_eq!(page.zones[0].id, added);
        assert_eq!(page.summary.value_of("Area", "sf"), 175.0);
    }

    #[test]
    fn changed_summary_alone_includes_node_without_children() {
        let (old, ids) = base();
        let mut new = old.clone();
        new.documents[0].summary = area(999.0);

        let diff = compute_diff(&new, Some(&old));

        assert_eq!(diff.documents.len(), 1);
        assert_eq!(diff.documents[0].id, ids.doc);
        assert!(diff.documents[0].pages.is_empty());
    }

    #[test]
    fn zone_change_with_unchanged_page_total_still_included() {
        let (old, ids) = base();
        let mut new = old.clone();
        // Move 10 sf from one zone to the other; page total stays 150.
        new.documents[0].pages[0].zones[0].summary = area(90.0);
        new.documents[0].pages[0].zones[1].summary = area(60.0);
        new.reaggregate();

        let diff = compute_diff(&new, Some(&old));
        let page = diff.find_page(ids.page).unwrap();

        assert_eq!(page.summary, old.documents[0].pages[0].summary);
        assert_eq!(page.zones.len(), 2);
    }
}
