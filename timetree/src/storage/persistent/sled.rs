// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Sled storage driver implementation

use super::traits::{StorageDriver, StorageTree};
use super::types::{StorageDriverError, StorageResult, StorageType};
use log::debug;
use std::io::ErrorKind;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// How often, and how long apart, opening a locked database is retried.
/// sled releases its file lock from a background thread after the last
/// handle is dropped, so a quick reopen can briefly find it still held.
const LOCK_RETRIES: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(20);

fn backend(e: sled::Error) -> StorageDriverError {
    StorageDriverError::BackendSpecific(e.to_string())
}

/// Sled driver implementation
pub struct SledDriver {
    db: sled::Db,
}

impl SledDriver {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let mut attempt = 0;
        loop {
            match sled::open(path) {
                Ok(db) => return Ok(SledDriver { db }),
                Err(sled::Error::Io(e)) if e.kind() == ErrorKind::WouldBlock && attempt < LOCK_RETRIES => {
                    attempt += 1;
                    debug!("Database at {:?} is still locked (attempt {})", path, attempt);
                    thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(e) => return Err(backend(e)),
            }
        }
    }
}

/// Sled tree wrapper that implements StorageTree trait
pub struct SledTree {
    tree: sled::Tree,
}

impl StorageTree for SledTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.tree.insert(key, value).map_err(backend)?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.tree.get(key).map_err(backend)?.map(|v| v.to_vec()))
    }

    fn entries(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.tree
            .iter()
            .map(|item| {
                item.map(|(k, v)| (k.to_vec(), v.to_vec()))
                    .map_err(backend)
            })
            .collect()
    }

    fn replace_all(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> StorageResult<()> {
        let mut batch = sled::Batch::default();
        for key in self.tree.iter().keys() {
            batch.remove(key.map_err(backend)?);
        }
        for (key, value) in entries {
            batch.insert(key.as_slice(), value.as_slice());
        }
        self.tree.apply_batch(batch).map_err(backend)
    }
}

impl StorageDriver for SledDriver {
    fn open_tree(&self, name: &str) -> StorageResult<Box<dyn StorageTree>> {
        let tree = self.db.open_tree(name).map_err(backend)?;
        Ok(Box::new(SledTree { tree }))
    }

    fn flush(&self) -> StorageResult<()> {
        self.db.flush().map_err(backend)?;
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Sled
    }
}
