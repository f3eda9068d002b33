//! Quantities and summaries
//!
//! A [`Summary`] is the list of `(name, unit, value)` totals carried by every
//! node of a condition tree. Within one summary the `(name, unit)` pair is
//! unique and acts as the aggregation key ([`QuantityKey`]).

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single measured quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quantity {
    /// Quantity name, e.g. "Area"
    pub name: String,
    /// Unit of measure, e.g. "sf"
    pub unit: String,
    /// Measured or aggregated value
    pub value: f64,
}

impl Quantity {
    /// Create new quantity
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, unit: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            value,
        }
    }

    /// Aggregation key of this quantity
    #[inline]
    #[must_use]
    pub fn key(&self) -> QuantityKey {
        QuantityKey::new(&self.name, &self.unit)
    }

    fn cmp_triple(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.unit.cmp(&other.unit))
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

/// Composite `(name, unit)` aggregation key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuantityKey {
    /// Quantity name
    pub name: String,
    /// Unit of measure
    pub unit: String,
}

impl QuantityKey {
    /// Create new key
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

/// Totals carried by one node of the tree
///
/// Serialized as a bare list of quantities. Equality via `==` is
/// order-sensitive; use [`Summary::same_as`] for the order-independent
/// comparison the diff engine relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary(Vec<Quantity>);

impl Summary {
    /// Empty summary
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Wrap an existing list of quantities
    #[inline]
    #[must_use]
    pub fn from_quantities(quantities: Vec<Quantity>) -> Self {
        Self(quantities)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the summary has no entries
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in stored order
    pub fn iter(&self) -> std::slice::Iter<'_, Quantity> {
        self.0.iter()
    }

    /// Entries as a slice
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[Quantity] {
        &self.0
    }

    /// Value stored for `(name, unit)`, if present
    #[must_use]
    pub fn get(&self, name: &str, unit: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|q| q.name == name && q.unit == unit)
            .map(|q| q.value)
    }

    /// Value stored for `(name, unit)`, zero when absent
    #[inline]
    #[must_use]
    pub fn value_of(&self, name: &str, unit: &str) -> f64 {
        self.get(name, unit).unwrap_or(0.0)
    }

    /// Order-independent comparison of the `(name, unit, value)` triples
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }

        let mut ours: Vec<&Quantity> = self.0.iter().collect();
        let mut theirs: Vec<&Quantity> = other.0.iter().collect();
        ours.sort_by(|a, b| a.cmp_triple(b));
        theirs.sort_by(|a, b| a.cmp_triple(b));

        ours.iter().zip(theirs).all(|(a, b)| {
            a.name == b.name && a.unit == b.unit && a.value == b.value
        })
    }

    /// Consume into the underlying list
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<Quantity> {
        self.0
    }
}

impl From<Vec<Quantity>> for Summary {
    fn from(value: Vec<Quantity>) -> Self {
        Self(value)
    }
}

impl FromIterator<Quantity> for Summary {
    fn from_iter<I: IntoIterator<Item = Quantity>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Summary {
    type Item = &'a Quantity;
    type IntoIter = std::slice::Iter<'a, Quantity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
