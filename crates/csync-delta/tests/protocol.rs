//! Property tests for diff and merge working together

use csync_delta::{compute_diff, merge};
use csync_model::prelude::*;
use proptest::prelude::*;
use uuid::Uuid;

// Small id pools so that generated trees overlap and exercise matching.
fn arb_summary() -> impl Strategy<Value = Summary> {
    proptest::collection::btree_map(
        prop_oneof![Just(("Area", "sf")), Just(("Length", "lf")), Just(("Count", "ea"))],
        0i32..500,
        0..3,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|((n, u), v)| Quantity::new(n, u, f64::from(v)))
            .collect()
    })
}

fn arb_page() -> impl Strategy<Value = Page> {
    (
        0u128..4,
        1u32..5,
        proptest::collection::btree_map(0u128..4, arb_summary(), 0..4),
    )
        .prop_map(|(id, number, zones)| {
            zones.into_iter().fold(
                Page::new(PageId::from(Uuid::from_u128(id)), number),
                |page, (zone, summary)| {
                    page.with_zone(Zone::new(ZoneId::from(Uuid::from_u128(zone)), summary))
                },
            )
        })
}

fn arb_tree() -> impl Strategy<Value = ProjectConditionTree> {
    proptest::collection::btree_map(
        0u128..3,
        proptest::collection::btree_map(0u128..4, arb_page(), 0..3),
        0..3,
    )
    .prop_map(|documents| {
        let mut tree = ProjectConditionTree::new(
            ProjectId::from(Uuid::from_u128(1)),
            ConditionId::from(Uuid::from_u128(1)),
        );
        for (doc, pages) in documents {
            // Keep page ids unique within the document.
            let document = pages.into_iter().fold(
                Document::new(DocumentId::from(Uuid::from_u128(doc))),
                |document, (page_id, mut page)| {
                    page.id = PageId::from(Uuid::from_u128(page_id));
                    document.with_page(page)
                },
            );
            tree = tree.with_document(document);
        }
        tree.reaggregate();
        tree
    })
}

/// Every node of `expected` is present in `actual` under the same path with
/// an equivalent summary.
fn covers(actual: &ProjectConditionTree, expected: &ProjectConditionTree) -> Result<(), TestCaseError> {
    prop_assert!(actual.summary.same_as(&expected.summary));
    for doc in &expected.documents {
        let got = actual.document(doc.id);
        prop_assert!(got.is_some(), "missing document {}", doc.id);
        let got = got.unwrap();
        prop_assert!(got.summary.same_as(&doc.summary));
        for page in &doc.pages {
            let got_page = got.page(page.id);
            prop_assert!(got_page.is_some(), "missing page {}", page.id);
            let got_page = got_page.unwrap();
            prop_assert!(got_page.summary.same_as(&page.summary));
            for zone in &page.zones {
                let got_zone = got_page.zone(zone.id);
                prop_assert!(got_zone.is_some(), "missing zone {}", zone.id);
                prop_assert!(got_zone.unwrap().summary.same_as(&zone.summary));
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn diff_of_self_is_bare(tree in arb_tree()) {
        let diff = compute_diff(&tree, Some(&tree));
        prop_assert!(diff.is_bare());
        prop_assert_eq!(diff.summary, tree.summary);
    }

    #[test]
    fn diff_against_nothing_is_whole_tree(tree in arb_tree()) {
        prop_assert_eq!(compute_diff(&tree, None), tree);
    }

    #[test]
    fn merge_is_idempotent(existing in arb_tree(), incoming in arb_tree()) {
        let mut state = existing;
        let once = merge(&mut state, &incoming);
        let twice = merge(&mut state, &incoming);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn merged_diff_brings_consumer_up_to_date(old in arb_tree(), new in arb_tree()) {
        let diff = compute_diff(&new, Some(&old));
        let mut consumer = old.clone();
        let merged = merge(&mut consumer, &diff);

        covers(&merged, &new)?;
    }

    #[test]
    fn diff_never_exceeds_the_new_tree(old in arb_tree(), new in arb_tree()) {
        let diff = compute_diff(&new, Some(&old));
        prop_assert!(diff.zone_count() <= new.zone_count());
        prop_assert!(diff.documents.len() <= new.documents.len());
    }
}
