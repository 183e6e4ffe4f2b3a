// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Graph store abstraction consumed by the time tree
//!
//! The time tree never talks to a concrete store. Everything it needs is
//! expressed here:
//! - vertex creation with labels and properties
//! - typed, directed edge creation and deletion
//! - neighbour queries by edge type and direction
//! - the single indexed lookup `(label, property, value)`
//! - caller-demarcated transactions

use super::types::{Direction, Edge, EdgeId, Properties, StorageResult, Vertex, VertexId};
use super::value::Value;

/// A transactional graph store
pub trait GraphStore: Send + Sync {
    /// Start a new transaction. Changes become visible to other
    /// transactions only after [`GraphTransaction::commit`] succeeds.
    fn begin(&self) -> StorageResult<Box<dyn GraphTransaction + '_>>;
}

/// A unit of work against a [`GraphStore`].
///
/// Reads observe the transaction's own pending writes. Dropping the
/// transaction without committing discards every pending change.
pub trait GraphTransaction {
    fn create_vertex(&mut self, labels: &[&str], properties: Properties) -> StorageResult<VertexId>;

    fn vertex(&mut self, id: VertexId) -> StorageResult<Option<Vertex>>;

    /// Delete a vertex together with every edge touching it
    fn delete_vertex(&mut self, id: VertexId) -> StorageResult<()>;

    fn set_property(&mut self, id: VertexId, name: &str, value: Value) -> StorageResult<()>;

    /// Remove a property, returning its previous value
    fn remove_property(&mut self, id: VertexId, name: &str) -> StorageResult<Option<Value>>;

    fn create_edge(&mut self, from: VertexId, to: VertexId, edge_type: &str) -> StorageResult<EdgeId>;

    fn delete_edge(&mut self, id: EdgeId) -> StorageResult<()>;

    /// Edges touching `vertex` in the given direction, optionally restricted
    /// to one edge type. Ordered by edge identifier.
    fn edges(
        &mut self,
        vertex: VertexId,
        direction: Direction,
        edge_type: Option<&str>,
    ) -> StorageResult<Vec<Edge>>;

    /// First vertex (lowest id) carrying `label` whose `property` equals `value`
    fn find_vertex(&mut self, label: &str, property: &str, value: &Value) -> StorageResult<Option<VertexId>>;

    fn vertices_with_label(&mut self, label: &str) -> StorageResult<Vec<VertexId>>;

    /// Every live vertex, ascending by id
    fn vertex_ids(&mut self) -> StorageResult<Vec<VertexId>>;

    fn commit(self: Box<Self>) -> StorageResult<()>;
}

/// Convenience lookups layered on top of the raw transaction API
pub trait GraphTransactionExt: GraphTransaction {
    /// Target of the single outgoing edge of `edge_type`, if any
    fn single_target(&mut self, vertex: VertexId, edge_type: &str) -> StorageResult<Option<VertexId>> {
        Ok(self
            .edges(vertex, Direction::Outgoing, Some(edge_type))?
            .first()
            .map(|e| e.to))
    }

    /// The single outgoing edge of `edge_type`, if any
    fn single_edge(&mut self, vertex: VertexId, edge_type: &str) -> StorageResult<Option<Edge>> {
        Ok(self
            .edges(vertex, Direction::Outgoing, Some(edge_type))?
            .into_iter()
            .next())
    }
}

impl<T: GraphTransaction + ?Sized> GraphTransactionExt for T {}
