// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Auto-indexing configuration
//!
//! Loaded from JSON. Every field is optional and falls back to its default:
//!
//! ```json
//! {
//!   "timestamp_property": "timestamp",
//!   "custom_root_property": "timeTreeRootId",
//!   "dynamic_root": "User:name:owner",
//!   "relationship_type": "AT_TIME",
//!   "resolution": "minute",
//!   "time_zone": "Europe/Prague",
//!   "auto_attach": true,
//!   "initialize_labels": ["Email"],
//!   "index_labels": ["Email"],
//!   "backfill_batch_size": 1000
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::calendar::{Resolution, TimeZoneId};
use crate::error::{Result, TimeTreeError};
use crate::tree::{is_tree_edge, DynamicRoot, RootPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeTreeConfig {
    /// Entity property holding the event instant in epoch milliseconds
    #[serde(default = "default_timestamp_property")]
    pub timestamp_property: String,
    /// Entity property holding an explicit root vertex id
    #[serde(default)]
    pub custom_root_property: Option<String>,
    #[serde(default)]
    pub dynamic_root: Option<DynamicRoot>,
    /// Edge type linking an entity to its time node
    #[serde(default = "default_relationship_type")]
    pub relationship_type: String,
    #[serde(default = "default_resolution")]
    pub resolution: Resolution,
    #[serde(default)]
    pub time_zone: TimeZoneId,
    /// Attach pre-existing entities when the indexer starts
    #[serde(default)]
    pub auto_attach: bool,
    /// Labels whose existing entities are backfilled
    #[serde(default)]
    pub initialize_labels: Vec<String>,
    /// When non-empty, only entities with one of these labels are indexed
    #[serde(default)]
    pub index_labels: Vec<String>,
    #[serde(default = "default_backfill_batch_size")]
    pub backfill_batch_size: usize,
}

impl Default for TimeTreeConfig {
    fn default() -> Self {
        Self {
            timestamp_property: default_timestamp_property(),
            custom_root_property: None,
            dynamic_root: None,
            relationship_type: default_relationship_type(),
            resolution: default_resolution(),
            time_zone: TimeZoneId::default(),
            auto_attach: false,
            initialize_labels: Vec::new(),
            index_labels: Vec::new(),
            backfill_batch_size: default_backfill_batch_size(),
        }
    }
}

fn default_timestamp_property() -> String {
    "timestamp".to_string()
}

fn default_relationship_type() -> String {
    "AT_TIME".to_string()
}

fn default_resolution() -> Resolution {
    Resolution::Day
}

fn default_backfill_batch_size() -> usize {
    1000
}

impl TimeTreeConfig {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: TimeTreeConfig =
            serde_json::from_str(json).map_err(|e| TimeTreeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| TimeTreeError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Check invariants serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.timestamp_property.trim().is_empty() {
            return Err(TimeTreeError::Config("timestamp_property must not be empty".into()));
        }
        if self.relationship_type.trim().is_empty() || is_tree_edge(&self.relationship_type) {
            return Err(TimeTreeError::Config(format!(
                "'{}' cannot be used as relationship_type",
                self.relationship_type
            )));
        }
        if matches!(&self.custom_root_property, Some(p) if p.trim().is_empty()) {
            return Err(TimeTreeError::Config("custom_root_property must not be empty".into()));
        }
        if self.backfill_batch_size == 0 {
            return Err(TimeTreeError::Config("backfill_batch_size must be positive".into()));
        }
        Ok(())
    }

    pub fn root_policy(&self) -> RootPolicy {
        RootPolicy {
            custom_root_property: self.custom_root_property.clone(),
            dynamic_root: self.dynamic_root.clone(),
        }
    }

    /// Whether a label set passes the `index_labels` inclusion policy
    pub fn includes<'a, I>(&self, labels: I) -> bool
    where
        I: IntoIterator<Item = &'a String>,
    {
        self.index_labels.is_empty() || labels.into_iter().any(|l| self.index_labels.contains(l))
    }

    /// Whether backfill applies at all
    pub fn backfill_enabled(&self) -> bool {
        self.auto_attach && !self.initialize_labels.is_empty()
    }
}
