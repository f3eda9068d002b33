//! Condition Sync Delta
//!
//! Two halves of the change protocol:
//!
//! - [`compute_diff`]: the source side, reducing a new tree to the nodes that
//!   changed since the previous version
//! - [`merge`]: the consumer side, folding a diff or full tree into a local
//!   copy without ever removing nodes
//!
//! Applying the same incoming tree twice leaves the same result as applying
//! it once, so redelivery is harmless.

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod diff;
pub mod merge;

pub use diff::{compute_diff, diff_children, Diffable};
pub use merge::{merge, merge_children, Mergeable};
