// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! # TimeTree
//!
//! A calendar index stored as a graph. A root vertex fans out to Year
//! vertices, Years to Months, Months to Days and so on down to a chosen
//! resolution. Entities are linked to the node of the instant they
//! happened at, so "everything on 2013-05-04" is a short walk instead of a
//! scan.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use timetree::{MemoryGraph, Resolution, TimeTree, TimeZoneId, TreeRoot};
//!
//! # fn main() -> timetree::Result<()> {
//! let tree = TimeTree::new(Arc::new(MemoryGraph::new()));
//! let day = tree.resolve_single(TreeRoot::Default, 1_367_625_600_000, Resolution::Day, &TimeZoneId::utc())?;
//! let days = tree.resolve_range(
//!     TreeRoot::Default,
//!     1_367_625_600_000,
//!     1_367_884_800_000,
//!     Resolution::Day,
//!     &TimeZoneId::utc(),
//! )?;
//! assert_eq!(days[0], day);
//! # Ok(())
//! # }
//! ```

pub mod calendar;
pub mod error;
pub mod module;
pub mod storage;
pub mod time_tree;
pub mod tree;

pub use calendar::{CalendarPath, PathSegment, Resolution, TimeZoneId};
pub use error::{ErrorKind, Result, TimeTreeError};
pub use module::{
    BackfillStats, ChangeSet, EventIndexer, IndexOutcome, PropertyChange, SkipReason, TimeTreeConfig,
};
pub use storage::{
    Direction, Edge, EdgeId, GraphStore, GraphTransaction, GraphTransactionExt, MemoryGraph, Properties,
    SnapshotStore, StorageError, StorageType, Value, Vertex, VertexId,
};
pub use time_tree::{TimeTree, MAX_CONFLICT_RETRIES};
pub use tree::{DynamicRoot, Event, RootPolicy, RootSelection, RootStrategy, TreeRoot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
