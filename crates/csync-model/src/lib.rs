//! Condition Sync Model
//!
//! The hierarchy both services hold a copy of:
//!
//! - [`ProjectConditionTree`]: one condition of a project, root of the tree
//! - [`Document`] → [`Page`] → [`Zone`]: children owned by value
//! - [`Summary`]: `(name, unit, value)` totals at every level
//!
//! Zones carry raw entered values. Every other summary is derived by
//! [`aggregate`], applied bottom-up through [`Aggregate::reaggregate`].
//!
//! # Example
//!
//! ```rust
//! use csync_model::prelude::*;
//!
//! let mut tree = ProjectConditionTree::new(ProjectId::new(), ConditionId::new())
//!     .with_document(Document::new(DocumentId::new()).with_page(
//!         Page::new(PageId::new(), 1)
//!             .with_zone(Zone::new(ZoneId::new(), vec![Quantity::new("Area", "sf", 100.0)].into()))
//!             .with_zone(Zone::new(ZoneId::new(), vec![Quantity::new("Area", "sf", 50.0)].into())),
//!     ));
//!
//! tree.reaggregate();
//! assert_eq!(tree.summary.value_of("Area", "sf"), 150.0);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod aggregate;
pub mod ids;
pub mod quantity;
pub mod tree;

pub use aggregate::{aggregate, Aggregate};
pub use ids::{ConditionId, DocumentId, PageId, ProjectId, ZoneId};
pub use quantity::{Quantity, QuantityKey, Summary};
pub use tree::{Document, Page, ProjectConditionTree, TreeNode, Zone};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with condition trees
    pub use crate::{
        Aggregate, ConditionId, Document, DocumentId, Page, PageId, ProjectConditionTree,
        ProjectId, Quantity, Summary, TreeNode, Zone, ZoneId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
