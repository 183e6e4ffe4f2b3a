// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the TimeTree CLI

use thiserror::Error;

use timetree::storage::persistent::StorageDriverError;
use timetree::{ErrorKind, TimeTreeError};

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Error from the core TimeTree library
    #[error("{0}")]
    TimeTree(#[from] TimeTreeError),

    /// Opening or writing the database failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageDriverError),

    /// A command-line value could not be interpreted
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit status: 2 not found, 3 bad request, 4 conflict, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::TimeTree(e) => match e.kind() {
                ErrorKind::NotFound => 2,
                ErrorKind::BadRequest => 3,
                ErrorKind::Conflict => 4,
                ErrorKind::Internal => 1,
            },
            CliError::InvalidArgument(_) => 3,
            CliError::Storage(_) | CliError::Serialization(_) => 1,
        }
    }
}
