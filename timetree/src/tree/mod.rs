// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Time tree structure
//!
//! A tree is a root vertex with Year children, each Year with Month
//! children and so on down to Millisecond. Every parent keeps:
//! - a `CHILD` edge to each of its children
//! - `FIRST` and `LAST` edges to its smallest and largest child
//! - a `NEXT` chain linking its children in ascending value order
//!
//! Entities are attached to tree nodes through an outgoing edge of a
//! configurable type.

pub mod attach;
pub mod navigator;
pub mod range;
pub mod root;
pub mod walk;

pub use attach::EventAttachment;
pub use navigator::TreeNavigator;
pub use range::{CalendarRange, RangeEnumerator};
pub use root::{DynamicRoot, RootPolicy, RootSelection, RootSelector, RootStrategy, TreeRoot};
pub use walk::{Event, EventWalker};

use crate::calendar::Resolution;
use crate::storage::Vertex;

/// Parent to child
pub const CHILD: &str = "CHILD";
/// Parent to its smallest child
pub const FIRST: &str = "FIRST";
/// Parent to its largest child
pub const LAST: &str = "LAST";
/// Sibling to the next larger sibling
pub const NEXT: &str = "NEXT";

/// Label of the lazily created default root
pub const ROOT_LABEL: &str = "TimeTreeRoot";

/// Integer property holding a node's calendar value
pub const VALUE_PROPERTY: &str = "value";

/// Edge types reserved for the tree structure itself
pub const TREE_EDGE_TYPES: [&str; 4] = [CHILD, FIRST, LAST, NEXT];

pub fn is_tree_edge(edge_type: &str) -> bool {
    TREE_EDGE_TYPES.contains(&edge_type)
}

/// Whether `vertex` is part of a time tree (a default root or a unit node)
pub fn is_tree_vertex(vertex: &Vertex) -> bool {
    vertex.has_label(ROOT_LABEL)
        || vertex
            .labels
            .iter()
            .any(|label| Resolution::from_label(label).is_some())
}
