// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Shared helpers for integration tests

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use timetree::tree::{TreeNavigator, CHILD, FIRST, LAST, NEXT, ROOT_LABEL};
use timetree::{
    Direction, GraphStore, GraphTransaction, GraphTransactionExt, MemoryGraph, Properties, TimeTree,
    Value, VertexId,
};

/// Epoch milliseconds of a UTC date and time
pub fn millis(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: u32) -> i64 {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap().timestamp_millis() + i64::from(ms)
}

/// Epoch milliseconds of midnight UTC
pub fn day(y: i32, mo: u32, d: u32) -> i64 {
    millis(y, mo, d, 0, 0, 0, 0)
}

/// A time tree over a fresh in-memory graph
pub struct TreeFixture {
    pub graph: Arc<MemoryGraph>,
    pub tree: TimeTree<MemoryGraph>,
}

impl TreeFixture {
    pub fn new() -> Self {
        Self::with_graph(MemoryGraph::new())
    }

    pub fn with_graph(graph: MemoryGraph) -> Self {
        let graph = Arc::new(graph);
        let tree = TimeTree::new(Arc::clone(&graph));
        Self { graph, tree }
    }

    /// Run `f` in a committed transaction
    pub fn with_tx<T>(&self, f: impl FnOnce(&mut dyn GraphTransaction) -> T) -> T {
        let mut tx = self.graph.begin().unwrap();
        let out = f(tx.as_mut());
        tx.commit().unwrap();
        out
    }

    pub fn create_vertex(&self, labels: &[&str], properties: &[(&str, Value)]) -> VertexId {
        let props: Properties = properties
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.with_tx(|tx| tx.create_vertex(labels, props).unwrap())
    }

    pub fn delete_vertex(&self, id: VertexId) {
        self.with_tx(|tx| tx.delete_vertex(id).unwrap())
    }

    pub fn default_root(&self) -> Option<VertexId> {
        self.with_tx(|tx| tx.vertices_with_label(ROOT_LABEL).unwrap().into_iter().min())
    }

    pub fn value_of(&self, node: VertexId) -> i64 {
        self.with_tx(|tx| TreeNavigator::node_value(tx, node).unwrap())
    }

    pub fn has_label(&self, node: VertexId, label: &str) -> bool {
        self.with_tx(|tx| tx.vertex(node).unwrap().unwrap().has_label(label))
    }

    /// Child values of `parent` in NEXT-chain order
    pub fn child_values(&self, parent: VertexId) -> Vec<i64> {
        self.with_tx(|tx| {
            TreeNavigator::children(tx, parent)
                .unwrap()
                .into_iter()
                .map(|(_, value)| value)
                .collect()
        })
    }

    pub fn child_ids(&self, parent: VertexId) -> Vec<VertexId> {
        self.with_tx(|tx| {
            TreeNavigator::children(tx, parent)
                .unwrap()
                .into_iter()
                .map(|(id, _)| id)
                .collect()
        })
    }

    pub fn first(&self, parent: VertexId) -> Option<VertexId> {
        self.with_tx(|tx| tx.single_target(parent, FIRST).unwrap())
    }

    pub fn last(&self, parent: VertexId) -> Option<VertexId> {
        self.with_tx(|tx| tx.single_target(parent, LAST).unwrap())
    }

    pub fn next(&self, node: VertexId) -> Option<VertexId> {
        self.with_tx(|tx| tx.single_target(node, NEXT).unwrap())
    }

    /// Calendar values from the top level down to `node`
    pub fn path_of(&self, node: VertexId) -> Vec<i64> {
        self.with_tx(|tx| {
            let mut values = Vec::new();
            let mut current = node;
            while let Some(parent) = tx
                .edges(current, Direction::Incoming, Some(CHILD))
                .unwrap()
                .first()
                .map(|edge| edge.from)
            {
                values.push(TreeNavigator::node_value(tx, current).unwrap());
                current = parent;
            }
            values.reverse();
            values
        })
    }

    /// Number of vertices carrying `label`
    pub fn count_label(&self, label: &str) -> usize {
        self.with_tx(|tx| tx.vertices_with_label(label).unwrap().len())
    }

    /// Check the sibling invariants under every vertex in the graph
    pub fn assert_invariants(&self) {
        self.with_tx(|tx| {
            for id in tx.vertex_ids().unwrap() {
                if let Err(e) = TreeNavigator::verify_siblings(tx, id) {
                    panic!("invariant violated under {}: {}", id, e);
                }
            }
        })
    }
}
