// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for time tree operations

use thiserror::Error;

use crate::storage::{StorageError, VertexId};

/// Result type alias for time tree operations
pub type Result<T> = std::result::Result<T, TimeTreeError>;

/// Everything that can go wrong while resolving, enumerating or attaching
#[derive(Error, Debug)]
pub enum TimeTreeError {
    #[error("invalid resolution: {0}")]
    InvalidResolution(String),

    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),

    /// Instant outside the representable calendar range
    #[error("instant {0} ms cannot be represented as a calendar date")]
    InvalidInstant(i64),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// An explicitly referenced root no longer resolves to a vertex
    #[error("root vertex {0} not found")]
    RootNotFound(VertexId),

    /// A lookup-only call hit a missing level
    #[error("no time tree node for {0}")]
    PathNotFound(String),

    /// The entity already has an outgoing attachment edge of this type
    #[error("entity {entity} already has an outgoing {edge_type} relationship")]
    AttachmentConflict { entity: VertexId, edge_type: String },

    #[error("gave up after {attempts} attempts due to concurrent modifications")]
    ConcurrentCreationFailure { attempts: usize },

    /// A custom root reference property holds something that is not a vertex id
    #[error("property '{property}' of entity {entity} is not a valid root reference")]
    InvalidRootReference { entity: VertexId, property: String },

    /// The sibling structure under a parent violates its invariants
    #[error("corrupt time tree: {0}")]
    CorruptTree(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Coarse classification used by boundary adapters to pick a status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Conflict,
    Internal,
}

impl TimeTreeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TimeTreeError::RootNotFound(_) | TimeTreeError::PathNotFound(_) => ErrorKind::NotFound,
            TimeTreeError::InvalidResolution(_)
            | TimeTreeError::InvalidTimeZone(_)
            | TimeTreeError::InvalidInstant(_)
            | TimeTreeError::InvalidRange(_)
            | TimeTreeError::InvalidRootReference { .. }
            | TimeTreeError::Config(_) => ErrorKind::BadRequest,
            TimeTreeError::AttachmentConflict { .. }
            | TimeTreeError::ConcurrentCreationFailure { .. } => ErrorKind::Conflict,
            TimeTreeError::Storage(e) if e.is_conflict() => ErrorKind::Conflict,
            TimeTreeError::Storage(_) | TimeTreeError::CorruptTree(_) => ErrorKind::Internal,
        }
    }
}
