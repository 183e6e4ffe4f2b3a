// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Key-value driver abstraction used to persist graph snapshots

use super::types::{StorageResult, StorageType};

/// A named keyspace inside a driver
pub trait StorageTree: Send + Sync {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()>;

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// All entries in key order
    fn entries(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Replace every entry in one atomic batch
    fn replace_all(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> StorageResult<()>;
}

/// An opened key-value engine
pub trait StorageDriver: Send + Sync {
    fn open_tree(&self, name: &str) -> StorageResult<Box<dyn StorageTree>>;

    fn flush(&self) -> StorageResult<()>;

    fn storage_type(&self) -> StorageType;
}
