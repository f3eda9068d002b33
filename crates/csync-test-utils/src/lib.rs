//! Testing utilities for the condition sync workspace
//!
//! Tree fixtures plus in-process [`PeerTransport`] fakes.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

mod peers;

pub use peers::{ConsumerLink, RecordingPeer, StorePeer};

use csync_model::prelude::*;
use std::time::{Duration, Instant};

/// Poll `check` until it holds, panicking with `what` after 5 s
pub async fn eventually(what: &str, check: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !check() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn summary(entries: &[(&str, &str, f64)]) -> Summary {
    entries
        .iter()
        .map(|(name, unit, value)| Quantity::new(*name, *unit, *value))
        .collect()
}

pub fn area(value: f64) -> Summary {
    summary(&[("Area", "sf", value)])
}

pub fn zone(value: f64) -> Zone {
    Zone::new(ZoneId::new(), area(value))
}

pub fn page_with_areas(values: &[f64]) -> Page {
    values
        .iter()
        .fold(Page::new(PageId::new(), 1), |page, value| page.with_zone(zone(*value)))
}

/// One document, one page, one zone per value; not yet aggregated
pub fn condition_with_areas(project_id: ProjectId, values: &[f64]) -> ProjectConditionTree {
    ProjectConditionTree::new(project_id, ConditionId::new())
        .with_document(Document::new(DocumentId::new()).with_page(page_with_areas(values)))
}

/// Same as [`condition_with_areas`] with every summary aggregated
pub fn aggregated_condition(project_id: ProjectId, values: &[f64]) -> ProjectConditionTree {
    let mut tree = condition_with_areas(project_id, values);
    tree.reaggregate();
    tree
}

/// Ids of the first document and page of a tree
pub fn first_page_ids(tree: &ProjectConditionTree) -> (DocumentId, PageId) {
    let document = &tree.documents[0];
    (document.id, document.pages[0].id)
}

/// Area total at every level along the first document/page path
pub fn area_path(tree: &ProjectConditionTree) -> (f64, f64, f64) {
    let document = &tree.documents[0];
    (
        document.pages[0].summary.value_of("Area", "sf"),
        document.summary.value_of("Area", "sf"),
        tree.summary.value_of("Area", "sf"),
    )
}
