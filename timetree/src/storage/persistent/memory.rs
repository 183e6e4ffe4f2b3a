// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Volatile storage driver, mainly for tests

use super::traits::{StorageDriver, StorageTree};
use super::types::{StorageResult, StorageType};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

type Entries = Arc<RwLock<BTreeMap<Vec<u8>, Vec<u8>>>>;

#[derive(Default)]
pub struct MemoryDriver {
    trees: RwLock<HashMap<String, Entries>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryTree {
    entries: Entries,
}

impl StorageTree for MemoryTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.entries.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn entries(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn replace_all(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> StorageResult<()> {
        let mut guard = self.entries.write();
        guard.clear();
        guard.extend(entries.iter().cloned());
        Ok(())
    }
}

impl StorageDriver for MemoryDriver {
    fn open_tree(&self, name: &str) -> StorageResult<Box<dyn StorageTree>> {
        let entries = self
            .trees
            .write()
            .entry(name.to_string())
            .or_default()
            .clone();
        Ok(Box::new(MemoryTree { entries }))
    }

    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Memory
    }
}
