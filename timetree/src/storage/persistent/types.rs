// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Storage driver types and error handling

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Which key-value engine backs a persisted time tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum StorageType {
    /// Sled - Pure Rust embedded database
    #[default]
    Sled,

    /// Redb - Pure Rust ACID-compliant embedded database
    Redb,

    /// Memory - nothing survives the process, used for tests and dry runs
    Memory,
}

impl std::str::FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sled" => Ok(StorageType::Sled),
            "redb" => Ok(StorageType::Redb),
            "memory" => Ok(StorageType::Memory),
            _ => Err(format!(
                "Unknown storage type: {}. Valid options: sled, redb, memory",
                s
            )),
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StorageType::Sled => "sled",
            StorageType::Redb => "redb",
            StorageType::Memory => "memory",
        };
        write!(f, "{}", name)
    }
}

/// Error type for storage driver operations
#[derive(Debug)]
pub enum StorageDriverError {
    /// I/O related errors (file system, locks)
    IoError(std::io::Error),

    /// Encoding or decoding a stored record failed
    SerializationError(String),

    /// The requested backend was not compiled in
    Unsupported(StorageType),

    /// Driver-specific error (Sled, Redb)
    BackendSpecific(String),
}

impl std::fmt::Display for StorageDriverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageDriverError::IoError(e) => write!(f, "I/O error: {}", e),
            StorageDriverError::SerializationError(e) => write!(f, "Serialization error: {}", e),
            StorageDriverError::Unsupported(t) => {
                write!(f, "Storage type '{}' is not enabled in this build", t)
            }
            StorageDriverError::BackendSpecific(e) => write!(f, "Storage driver error: {}", e),
        }
    }
}

impl std::error::Error for StorageDriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageDriverError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageDriverError {
    fn from(e: std::io::Error) -> Self {
        StorageDriverError::IoError(e)
    }
}

impl From<bincode::Error> for StorageDriverError {
    fn from(e: bincode::Error) -> Self {
        StorageDriverError::SerializationError(e.to_string())
    }
}

impl From<StorageDriverError> for crate::storage::StorageError {
    fn from(e: StorageDriverError) -> Self {
        crate::storage::StorageError::Persistence(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageDriverError>;
