// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! REDB storage driver implementation

use super::traits::{StorageDriver, StorageTree};
use super::types::{StorageDriverError, StorageResult, StorageType};
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

fn backend<E: std::fmt::Display>(e: E) -> StorageDriverError {
    StorageDriverError::BackendSpecific(e.to_string())
}

/// REDB driver implementation
pub struct RedbDriver {
    db: Arc<Database>,
}

impl RedbDriver {
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        // REDB wants a file, callers hand us a directory
        let db_path = if path.as_ref().extension().is_none() {
            std::fs::create_dir_all(path.as_ref())?;
            path.as_ref().join("timetree.redb")
        } else {
            path.as_ref().to_path_buf()
        };

        let db = Database::create(&db_path).map_err(backend)?;
        Ok(RedbDriver { db: Arc::new(db) })
    }
}

/// REDB tree wrapper: each "tree" is a separate table in the database
pub struct RedbTree {
    db: Arc<Database>,
    table_name: String,
}

impl StorageTree for RedbTree {
    fn insert(&self, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let table_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&self.table_name);
            let mut table = write_txn.open_table(table_def).map_err(backend)?;
            table.insert(key, value).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&self.table_name);
        let table = read_txn.open_table(table_def).map_err(backend)?;
        let result = table.get(key).map_err(backend)?;
        Ok(result.map(|guard| guard.value().to_vec()))
    }

    fn entries(&self) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&self.table_name);
        let table = read_txn.open_table(table_def).map_err(backend)?;

        let items: StorageResult<Vec<(Vec<u8>, Vec<u8>)>> = table
            .iter()
            .map_err(backend)?
            .map(|result| {
                result
                    .map(|(k, v)| (k.value().to_vec(), v.value().to_vec()))
                    .map_err(backend)
            })
            .collect();
        items
    }

    fn replace_all(&self, entries: &[(Vec<u8>, Vec<u8>)]) -> StorageResult<()> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let table_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(&self.table_name);
            let mut table = write_txn.open_table(table_def).map_err(backend)?;

            // Collect all keys first to avoid borrowing issues
            let keys = table
                .iter()
                .map_err(backend)?
                .map(|result| result.map(|(k, _)| k.value().to_vec()).map_err(backend))
                .collect::<StorageResult<Vec<Vec<u8>>>>()?;
            for key in keys {
                table.remove(key.as_slice()).map_err(backend)?;
            }
            for (key, value) in entries {
                table
                    .insert(key.as_slice(), value.as_slice())
                    .map_err(backend)?;
            }
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }
}

impl StorageDriver for RedbDriver {
    fn open_tree(&self, name: &str) -> StorageResult<Box<dyn StorageTree>> {
        // Make sure the table exists so later reads don't fail
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let table_def: TableDefinition<&[u8], &[u8]> = TableDefinition::new(name);
            let _ = write_txn.open_table(table_def).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;

        Ok(Box::new(RedbTree {
            db: self.db.clone(),
            table_name: name.to_string(),
        }))
    }

    fn flush(&self) -> StorageResult<()> {
        // REDB is durable once a write transaction commits
        Ok(())
    }

    fn storage_type(&self) -> StorageType {
        StorageType::Redb
    }
}
