// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Auto-indexing module: configuration and the change-driven indexer

pub mod config;
pub mod indexer;

pub use config::TimeTreeConfig;
pub use indexer::{BackfillStats, ChangeSet, EventIndexer, IndexOutcome, PropertyChange, SkipReason};
