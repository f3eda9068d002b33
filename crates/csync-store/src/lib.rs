//! Condition Sync Store
//!
//! [`ConditionTreeStore`] owns one service's copy of the hierarchy:
//!
//! - Reads return deep copies, never references into the store
//! - Writes re-aggregate the affected conditions bottom-up
//! - Consumer-side [`ConditionTreeStore::upsert`] merges diffs by id
//! - Deletions cascade through every condition of the project
//!
//! The store is constructed once per service and shared by [`SharedStore`].

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod error;
pub mod store;

pub use error::StoreError;
pub use store::{ConditionTreeStore, ProjectMap, Revision, SharedStore};
