// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! In-memory arena graph store with optimistic transactions
//!
//! Vertices and edges live in id-keyed arenas guarded by a single
//! `parking_lot::RwLock`. A transaction buffers its writes and remembers the
//! version of every vertex and label it observed. Commit takes the write lock,
//! checks that none of those versions moved, and applies the whole buffer at
//! once, so a sibling-chain relink is never visible half-done.

use log::trace;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use super::traits::{GraphStore, GraphTransaction};
use super::types::{
    Direction, Edge, EdgeId, Properties, StorageError, StorageResult, Vertex, VertexId,
};
use super::value::Value;

/// Stored form of a vertex
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexRecord {
    pub labels: BTreeSet<String>,
    pub properties: Properties,
}

/// Stored form of an edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: VertexId,
    pub to: VertexId,
    pub edge_type: String,
}

/// Complete, self-contained copy of a [`MemoryGraph`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub vertices: Vec<(VertexId, VertexRecord)>,
    pub edges: Vec<(EdgeId, EdgeRecord)>,
    pub next_vertex_id: u64,
    pub next_edge_id: u64,
}

#[derive(Default)]
struct GraphState {
    vertices: BTreeMap<VertexId, VertexRecord>,
    edges: BTreeMap<EdgeId, EdgeRecord>,
    outgoing: HashMap<VertexId, BTreeSet<EdgeId>>,
    incoming: HashMap<VertexId, BTreeSet<EdgeId>>,
    labels: HashMap<String, BTreeSet<VertexId>>,
    vertex_versions: HashMap<VertexId, u64>,
    label_versions: HashMap<String, u64>,
    commit_seq: u64,
}

impl GraphState {
    fn link_edge(&mut self, id: EdgeId, record: EdgeRecord) {
        self.outgoing.entry(record.from).or_default().insert(id);
        self.incoming.entry(record.to).or_default().insert(id);
        self.edges.insert(id, record);
    }

    fn unlink_edge(&mut self, id: EdgeId) -> Option<EdgeRecord> {
        let record = self.edges.remove(&id)?;
        if let Some(out) = self.outgoing.get_mut(&record.from) {
            out.remove(&id);
        }
        if let Some(inc) = self.incoming.get_mut(&record.to) {
            inc.remove(&id);
        }
        Some(record)
    }

    fn index_labels(&mut self, id: VertexId, record: &VertexRecord) {
        for label in &record.labels {
            self.labels.entry(label.clone()).or_default().insert(id);
        }
    }
}

/// Arena-backed [`GraphStore`]
pub struct MemoryGraph {
    state: RwLock<GraphState>,
    next_vertex_id: AtomicU64,
    next_edge_id: AtomicU64,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(GraphState::default()),
            next_vertex_id: AtomicU64::new(0),
            next_edge_id: AtomicU64::new(0),
        }
    }

    /// Rebuild a graph from a snapshot, including all indexes
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut state = GraphState::default();
        for (id, record) in snapshot.vertices {
            state.index_labels(id, &record);
            state.vertex_versions.insert(id, 0);
            state.vertices.insert(id, record);
        }
        for (id, record) in snapshot.edges {
            state.link_edge(id, record);
        }
        Self {
            state: RwLock::new(state),
            next_vertex_id: AtomicU64::new(snapshot.next_vertex_id),
            next_edge_id: AtomicU64::new(snapshot.next_edge_id),
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let state = self.state.read();
        GraphSnapshot {
            vertices: state
                .vertices
                .iter()
                .map(|(id, r)| (*id, r.clone()))
                .collect(),
            edges: state.edges.iter().map(|(id, r)| (*id, r.clone())).collect(),
            next_vertex_id: self.next_vertex_id.load(Ordering::SeqCst),
            next_edge_id: self.next_edge_id.load(Ordering::SeqCst),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.state.read().vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.state.read().edges.len()
    }
}

impl GraphStore for MemoryGraph {
    fn begin(&self) -> StorageResult<Box<dyn GraphTransaction + '_>> {
        Ok(Box::new(MemoryTransaction::new(self)))
    }
}

/// Pending transaction against a [`MemoryGraph`]
pub struct MemoryTransaction<'a> {
    graph: &'a MemoryGraph,
    /// Version of each committed vertex at first observation (None = absent)
    read_vertices: HashMap<VertexId, Option<u64>>,
    read_labels: HashMap<String, u64>,
    /// Some = created or rewritten, None = deleted
    vertex_writes: BTreeMap<VertexId, Option<VertexRecord>>,
    created_vertices: BTreeSet<VertexId>,
    /// Some = created, None = deleted committed edge
    edge_writes: BTreeMap<EdgeId, Option<EdgeRecord>>,
}

impl<'a> MemoryTransaction<'a> {
    fn new(graph: &'a MemoryGraph) -> Self {
        Self {
            graph,
            read_vertices: HashMap::new(),
            read_labels: HashMap::new(),
            vertex_writes: BTreeMap::new(),
            created_vertices: BTreeSet::new(),
            edge_writes: BTreeMap::new(),
        }
    }

    fn observe_vertex(&mut self, state: &GraphState, id: VertexId) {
        if self.created_vertices.contains(&id) {
            return;
        }
        self.read_vertices
            .entry(id)
            .or_insert_with(|| state.vertex_versions.get(&id).copied());
    }

    fn observe_label(&mut self, state: &GraphState, label: &str) {
        if !self.read_labels.contains_key(label) {
            let version = state.label_versions.get(label).copied().unwrap_or(0);
            self.read_labels.insert(label.to_string(), version);
        }
    }

    fn vertex_record(&mut self, id: VertexId) -> Option<VertexRecord> {
        if let Some(write) = self.vertex_writes.get(&id) {
            return write.clone();
        }
        let graph = self.graph;
        let state = graph.state.read();
        self.observe_vertex(&state, id);
        state.vertices.get(&id).cloned()
    }

    fn edge_record(&mut self, id: EdgeId) -> Option<EdgeRecord> {
        if let Some(write) = self.edge_writes.get(&id) {
            return write.clone();
        }
        self.graph.state.read().edges.get(&id).cloned()
    }

    fn has_writes(&self) -> bool {
        !self.vertex_writes.is_empty() || !self.edge_writes.is_empty()
    }

    fn validate(&self, state: &GraphState) -> StorageResult<()> {
        for (id, seen) in &self.read_vertices {
            if state.vertex_versions.get(id).copied() != *seen {
                return Err(StorageError::Conflict(format!(
                    "vertex {} was modified by a concurrent transaction",
                    id
                )));
            }
        }
        for (label, seen) in &self.read_labels {
            if state.label_versions.get(label).copied().unwrap_or(0) != *seen {
                return Err(StorageError::Conflict(format!(
                    "label '{}' was modified by a concurrent transaction",
                    label
                )));
            }
        }
        Ok(())
    }
}

impl GraphTransaction for MemoryTransaction<'_> {
    fn create_vertex(&mut self, labels: &[&str], properties: Properties) -> StorageResult<VertexId> {
        let id = VertexId(self.graph.next_vertex_id.fetch_add(1, Ordering::SeqCst));
        let record = VertexRecord {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            properties,
        };
        self.vertex_writes.insert(id, Some(record));
        self.created_vertices.insert(id);
        Ok(id)
    }

    fn vertex(&mut self, id: VertexId) -> StorageResult<Option<Vertex>> {
        Ok(self.vertex_record(id).map(|record| Vertex {
            id,
            labels: record.labels,
            properties: record.properties,
        }))
    }

    fn delete_vertex(&mut self, id: VertexId) -> StorageResult<()> {
        if self.vertex_record(id).is_none() {
            return Err(StorageError::VertexNotFound(id));
        }
        for edge in self.edges(id, Direction::Both, None)? {
            self.delete_edge(edge.id)?;
        }
        if self.created_vertices.remove(&id) {
            self.vertex_writes.remove(&id);
        } else {
            self.vertex_writes.insert(id, None);
        }
        Ok(())
    }

    fn set_property(&mut self, id: VertexId, name: &str, value: Value) -> StorageResult<()> {
        let mut record = self
            .vertex_record(id)
            .ok_or(StorageError::VertexNotFound(id))?;
        record.properties.insert(name.to_string(), value);
        self.vertex_writes.insert(id, Some(record));
        Ok(())
    }

    fn remove_property(&mut self, id: VertexId, name: &str) -> StorageResult<Option<Value>> {
        let mut record = self
            .vertex_record(id)
            .ok_or(StorageError::VertexNotFound(id))?;
        let previous = record.properties.remove(name);
        if previous.is_some() {
            self.vertex_writes.insert(id, Some(record));
        }
        Ok(previous)
    }

    fn create_edge(&mut self, from: VertexId, to: VertexId, edge_type: &str) -> StorageResult<EdgeId> {
        for endpoint in [from, to] {
            if self.vertex_record(endpoint).is_none() {
                return Err(StorageError::VertexNotFound(endpoint));
            }
        }
        let id = EdgeId(self.graph.next_edge_id.fetch_add(1, Ordering::SeqCst));
        self.edge_writes.insert(
            id,
            Some(EdgeRecord {
                from,
                to,
                edge_type: edge_type.to_string(),
            }),
        );
        Ok(id)
    }

    fn delete_edge(&mut self, id: EdgeId) -> StorageResult<()> {
        let record = self.edge_record(id).ok_or(StorageError::EdgeNotFound(id))?;
        {
            let graph = self.graph;
            let state = graph.state.read();
            self.observe_vertex(&state, record.from);
            self.observe_vertex(&state, record.to);
        }
        if matches!(self.edge_writes.get(&id), Some(Some(_))) {
            // created in this transaction, never reached the store
            self.edge_writes.remove(&id);
        } else {
            self.edge_writes.insert(id, None);
        }
        Ok(())
    }

    fn edges(
        &mut self,
        vertex: VertexId,
        direction: Direction,
        edge_type: Option<&str>,
    ) -> StorageResult<Vec<Edge>> {
        let mut found: BTreeMap<EdgeId, EdgeRecord> = BTreeMap::new();
        {
            let graph = self.graph;
            let state = graph.state.read();
            self.observe_vertex(&state, vertex);
            let mut committed: Vec<EdgeId> = Vec::new();
            if matches!(direction, Direction::Outgoing | Direction::Both) {
                if let Some(ids) = state.outgoing.get(&vertex) {
                    committed.extend(ids.iter().copied());
                }
            }
            if matches!(direction, Direction::Incoming | Direction::Both) {
                if let Some(ids) = state.incoming.get(&vertex) {
                    committed.extend(ids.iter().copied());
                }
            }
            for id in committed {
                if self.edge_writes.contains_key(&id) {
                    continue;
                }
                if let Some(record) = state.edges.get(&id) {
                    found.insert(id, record.clone());
                }
            }
        }
        for (id, write) in &self.edge_writes {
            if let Some(record) = write {
                let matches_direction = match direction {
                    Direction::Outgoing => record.from == vertex,
                    Direction::Incoming => record.to == vertex,
                    Direction::Both => record.from == vertex || record.to == vertex,
                };
                if matches_direction {
                    found.insert(*id, record.clone());
                }
            }
        }

        Ok(found
            .into_iter()
            .filter(|(_, r)| edge_type.map_or(true, |t| r.edge_type == t))
            .map(|(id, r)| Edge {
                id,
                from: r.from,
                to: r.to,
                edge_type: r.edge_type,
            })
            .collect())
    }

    fn find_vertex(&mut self, label: &str, property: &str, value: &Value) -> StorageResult<Option<VertexId>> {
        for id in self.vertices_with_label(label)? {
            if let Some(record) = self.vertex_record(id) {
                if record.properties.get(property) == Some(value) {
                    return Ok(Some(id));
                }
            }
        }
        Ok(None)
    }

    fn vertices_with_label(&mut self, label: &str) -> StorageResult<Vec<VertexId>> {
        let mut ids: BTreeSet<VertexId> = {
            let graph = self.graph;
            let state = graph.state.read();
            self.observe_label(&state, label);
            state.labels.get(label).cloned().unwrap_or_default()
        };
        for (id, write) in &self.vertex_writes {
            match write {
                Some(record) if record.labels.contains(label) => {
                    ids.insert(*id);
                }
                None => {
                    ids.remove(id);
                }
                _ => {}
            }
        }
        Ok(ids.into_iter().collect())
    }

    fn vertex_ids(&mut self) -> StorageResult<Vec<VertexId>> {
        let mut ids: BTreeSet<VertexId> = self.graph.state.read().vertices.keys().copied().collect();
        for (id, write) in &self.vertex_writes {
            if write.is_some() {
                ids.insert(*id);
            } else {
                ids.remove(id);
            }
        }
        Ok(ids.into_iter().collect())
    }

    fn commit(self: Box<Self>) -> StorageResult<()> {
        if !self.has_writes() {
            return Ok(());
        }

        let mut state = self.graph.state.write();
        self.validate(&state)?;

        state.commit_seq += 1;
        let seq = state.commit_seq;
        let mut touched: BTreeSet<VertexId> = BTreeSet::new();
        let mut touched_labels: BTreeSet<String> = BTreeSet::new();

        for (id, write) in &self.edge_writes {
            if write.is_none() {
                if let Some(record) = state.unlink_edge(*id) {
                    touched.insert(record.from);
                    touched.insert(record.to);
                }
            }
        }

        for (id, write) in &self.vertex_writes {
            if let Some(record) = write {
                if self.created_vertices.contains(id) {
                    state.index_labels(*id, record);
                    touched_labels.extend(record.labels.iter().cloned());
                }
                state.vertices.insert(*id, record.clone());
                touched.insert(*id);
            }
        }

        for (id, write) in &self.edge_writes {
            if let Some(record) = write {
                touched.insert(record.from);
                touched.insert(record.to);
                state.link_edge(*id, record.clone());
            }
        }

        for (id, write) in &self.vertex_writes {
            if write.is_none() {
                if let Some(record) = state.vertices.remove(id) {
                    for label in &record.labels {
                        if let Some(members) = state.labels.get_mut(label) {
                            members.remove(id);
                        }
                        touched_labels.insert(label.clone());
                    }
                }
                state.outgoing.remove(id);
                state.incoming.remove(id);
                state.vertex_versions.remove(id);
                touched.remove(id);
            }
        }

        for id in touched {
            if state.vertices.contains_key(&id) {
                state.vertex_versions.insert(id, seq);
            }
        }
        for label in touched_labels {
            state.label_versions.insert(label, seq);
        }

        trace!(
            "Committed transaction {} ({} vertex writes, {} edge writes)",
            seq,
            self.vertex_writes.len(),
            self.edge_writes.len()
        );
        Ok(())
    }
}
