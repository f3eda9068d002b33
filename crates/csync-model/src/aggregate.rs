//! Bottom-up quantity aggregation
//!
//! [`aggregate`] is the pure grouping rule: sum values by `(name, unit)` in
//! first-seen order. [`Aggregate`] applies it through the hierarchy, always
//! refreshing children before their parent.

use crate::quantity::{Quantity, QuantityKey, Summary};
use crate::tree::{Document, Page, ProjectConditionTree, TreeNode, Zone};
use indexmap::IndexMap;

/// Sum child summaries by `(name, unit)`
///
/// The result holds one entry per key seen in any child, in the order keys
/// were first encountered. Inputs are not modified.
#[must_use]
pub fn aggregate<'a, I>(children: I) -> Summary
where
    I: IntoIterator<Item = &'a Summary>,
{
    let mut totals: IndexMap<QuantityKey, f64> = IndexMap::new();

    for summary in children {
        for quantity in summary {
            *totals.entry(quantity.key()).or_insert(0.0) += quantity.value;
        }
    }

    totals
        .into_iter()
        .map(|(key, value)| Quantity {
            name: key.name,
            unit: key.unit,
            value,
        })
        .collect()
}

/// Recompute derived summaries below and at this node
pub trait Aggregate: TreeNode {
    /// Refresh every descendant, then this node, from the leaves up
    fn reaggregate(&mut self);

    /// Whether every derived summary at and below this node matches its
    /// children
    fn is_consistent(&self) -> bool;
}

fn rollup<C: Aggregate>(children: &mut [C]) -> Summary {
    children.iter_mut().for_each(Aggregate::reaggregate);
    aggregate(children.iter().map(TreeNode::summary))
}

fn consistent<C: Aggregate>(summary: &Summary, children: &[C]) -> bool {
    children.iter().all(Aggregate::is_consistent)
        && summary.same_as(&aggregate(children.iter().map(TreeNode::summary)))
}

impl Aggregate for Zone {
    fn reaggregate(&mut self) {}

    fn is_consistent(&self) -> bool {
        true
    }
}

impl Aggregate for Page {
    fn reaggregate(&mut self) {
        self.summary = rollup(&mut self.zones);
    }

    fn is_consistent(&self) -> bool {
        consistent(&self.summary, &self.zones)
    }
}

impl Aggregate for Document {
    fn reaggregate(&mut self) {
        self.summary = rollup(&mut self.pages);
    }

    fn is_consistent(&self) -> bool {
        consistent(&self.summary, &self.pages)
    }
}

impl Aggregate for ProjectConditionTree {
    fn reaggregate(&mut self) {
        self.summary = rollup(&mut self.documents);
    }

    fn is_consistent(&self) -> bool {
        consistent(&self.summary, &self.documents)
    }
}
