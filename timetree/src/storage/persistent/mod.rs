// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Persistent storage drivers
//!
//! The time tree itself runs against the in-memory arena. These drivers let
//! an adapter keep that arena across process restarts by snapshotting it into
//! an embedded key-value engine.

pub mod memory;
#[cfg(feature = "redb-backend")]
pub mod redb;
pub mod snapshot;
#[cfg(feature = "sled-backend")]
pub mod sled;
pub mod traits;
pub mod types;

use std::path::Path;

pub use snapshot::SnapshotStore;
pub use traits::{StorageDriver, StorageTree};
pub use types::{StorageDriverError, StorageResult, StorageType};

/// Open the driver for `storage_type` rooted at `path`
pub fn open_driver<P: AsRef<Path>>(
    storage_type: StorageType,
    path: P,
) -> StorageResult<Box<dyn StorageDriver>> {
    match storage_type {
        #[cfg(feature = "sled-backend")]
        StorageType::Sled => Ok(Box::new(sled::SledDriver::open(path)?)),
        #[cfg(feature = "redb-backend")]
        StorageType::Redb => Ok(Box::new(redb::RedbDriver::open(path)?)),
        StorageType::Memory => {
            let _ = path;
            Ok(Box::new(memory::MemoryDriver::new()))
        }
        #[allow(unreachable_patterns)]
        other => Err(StorageDriverError::Unsupported(other)),
    }
}
