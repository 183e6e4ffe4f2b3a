// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Core graph types: identifiers, vertices, edges and storage errors

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use thiserror::Error;

use super::value::Value;

/// Stable identifier of a vertex. Identifiers are allocated monotonically and
/// never reused, even after the vertex is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u64);

/// Stable identifier of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type Properties = HashMap<String, Value>;

/// A graph vertex as seen through a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub labels: BTreeSet<String>,
    pub properties: Properties,
}

impl Vertex {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}

/// A directed, typed edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: VertexId,
    pub to: VertexId,
    pub edge_type: String,
}

/// Direction of an edge relative to the vertex being queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Both,
}

/// Errors raised by a [`GraphStore`](super::GraphStore) implementation
#[derive(Debug, Error)]
pub enum StorageError {
    /// A concurrently committed transaction modified something this one read
    #[error("transaction conflict: {0}")]
    Conflict(String),

    #[error("vertex {0} not found")]
    VertexNotFound(VertexId),

    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// Persisting or loading a snapshot failed
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl StorageError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
