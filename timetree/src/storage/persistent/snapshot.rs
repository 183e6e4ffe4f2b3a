// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Saving and restoring a [`MemoryGraph`] through a key-value driver
//!
//! Layout:
//! - `vertices`: big-endian vertex id -> bincode [`VertexRecord`]
//! - `edges`: big-endian edge id -> bincode [`EdgeRecord`]
//! - `meta`: id allocation counters
//!
//! Each tree is replaced in its own driver commit, in the order meta,
//! vertices, edges. A save interrupted part-way can therefore leave edges
//! whose endpoints are gone; loading drops such edges and never hands out
//! an id at or below one already stored.

use log::{debug, info, warn};

use super::traits::StorageDriver;
use super::types::{StorageDriverError, StorageResult};
use crate::storage::memory::{EdgeRecord, GraphSnapshot, MemoryGraph, VertexRecord};
use crate::storage::types::{EdgeId, VertexId};
use std::collections::HashSet;

const VERTICES_TREE: &str = "vertices";
const EDGES_TREE: &str = "edges";
const META_TREE: &str = "meta";
const NEXT_VERTEX_KEY: &[u8] = b"next_vertex_id";
const NEXT_EDGE_KEY: &[u8] = b"next_edge_id";

fn decode_id(key: &[u8]) -> StorageResult<u64> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| {
        StorageDriverError::SerializationError(format!("malformed id key of {} bytes", key.len()))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

/// Persists graph snapshots into a [`StorageDriver`]
pub struct SnapshotStore {
    driver: Box<dyn StorageDriver>,
}

impl SnapshotStore {
    pub fn new(driver: Box<dyn StorageDriver>) -> Self {
        Self { driver }
    }

    /// Load the persisted graph; an empty driver yields an empty graph
    pub fn load(&self) -> StorageResult<MemoryGraph> {
        let mut snapshot = GraphSnapshot::default();

        for (key, value) in self.driver.open_tree(VERTICES_TREE)?.entries()? {
            let record: VertexRecord = bincode::deserialize(&value)?;
            snapshot.vertices.push((VertexId(decode_id(&key)?), record));
        }
        let live: HashSet<VertexId> = snapshot.vertices.iter().map(|(id, _)| *id).collect();
        let mut max_edge_id = None;
        for (key, value) in self.driver.open_tree(EDGES_TREE)?.entries()? {
            let id = EdgeId(decode_id(&key)?);
            max_edge_id = max_edge_id.max(Some(id.0));
            let record: EdgeRecord = bincode::deserialize(&value)?;
            if live.contains(&record.from) && live.contains(&record.to) {
                snapshot.edges.push((id, record));
            } else {
                warn!(
                    "Dropping stored edge {} ({} -> {}): endpoint missing",
                    id, record.from, record.to
                );
            }
        }

        let meta = self.driver.open_tree(META_TREE)?;
        let stored_counter = |key: &[u8]| -> StorageResult<u64> {
            match meta.get(key)? {
                Some(bytes) => decode_id(&bytes),
                None => Ok(0),
            }
        };
        let max_vertex_id = snapshot.vertices.iter().map(|(id, _)| id.0).max();
        snapshot.next_vertex_id = stored_counter(NEXT_VERTEX_KEY)?.max(max_vertex_id.map_or(0, |id| id + 1));
        snapshot.next_edge_id = stored_counter(NEXT_EDGE_KEY)?.max(max_edge_id.map_or(0, |id| id + 1));

        debug!(
            "Loaded {} vertices and {} edges from {} storage",
            snapshot.vertices.len(),
            snapshot.edges.len(),
            self.driver.storage_type()
        );
        Ok(MemoryGraph::from_snapshot(snapshot))
    }

    /// Replace the persisted state with the current contents of `graph`
    pub fn save(&self, graph: &MemoryGraph) -> StorageResult<()> {
        let snapshot = graph.snapshot();

        let vertices = snapshot
            .vertices
            .iter()
            .map(|(id, record)| -> StorageResult<(Vec<u8>, Vec<u8>)> {
                Ok((id.0.to_be_bytes().to_vec(), bincode::serialize(record)?))
            })
            .collect::<StorageResult<Vec<_>>>()?;
        let edges = snapshot
            .edges
            .iter()
            .map(|(id, record)| -> StorageResult<(Vec<u8>, Vec<u8>)> {
                Ok((id.0.to_be_bytes().to_vec(), bincode::serialize(record)?))
            })
            .collect::<StorageResult<Vec<_>>>()?;

        // counters only grow, so writing them first is always safe
        let meta = self.driver.open_tree(META_TREE)?;
        meta.insert(NEXT_VERTEX_KEY, &snapshot.next_vertex_id.to_be_bytes())?;
        meta.insert(NEXT_EDGE_KEY, &snapshot.next_edge_id.to_be_bytes())?;
        self.driver.open_tree(VERTICES_TREE)?.replace_all(&vertices)?;
        self.driver.open_tree(EDGES_TREE)?.replace_all(&edges)?;
        self.driver.flush()?;

        info!(
            "Saved {} vertices and {} edges to {} storage",
            vertices.len(),
            edges.len(),
            self.driver.storage_type()
        );
        Ok(())
    }
}
