// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Graph storage for the time tree
//!
//! This module provides:
//! - Value type for vertex properties
//! - The transactional graph store traits the time tree runs against
//! - An in-memory arena store with optimistic conflict detection
//! - Snapshot persistence through pluggable key-value drivers

pub mod memory;
pub mod persistent;
pub mod traits;
pub mod types;
pub mod value;

pub use memory::{GraphSnapshot, MemoryGraph};
pub use persistent::{SnapshotStore, StorageType};
pub use traits::{GraphStore, GraphTransaction, GraphTransactionExt};
pub use types::{Direction, Edge, EdgeId, Properties, StorageError, StorageResult, Vertex, VertexId};
pub use value::Value;
