// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Automatic attachment of timestamped entities
//!
//! The host graph reports created and modified vertices through
//! [`EventIndexer::on_changes`]. Each affected entity is (re)attached to the
//! time node of its timestamp in a single transaction.

use log::{debug, info, warn};
use serde::Serialize;

use super::config::TimeTreeConfig;
use crate::calendar::CalendarPath;
use crate::error::Result;
use crate::storage::{GraphStore, GraphTransaction, VertexId};
use crate::time_tree::TimeTree;
use crate::tree::{is_tree_vertex, EventAttachment, RootPolicy, RootSelection, RootSelector, TreeNavigator};

/// Property-level change to an existing vertex
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyChange {
    pub vertex: VertexId,
    /// Properties assigned a new value
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl PropertyChange {
    fn touches(&self, property: &str) -> bool {
        self.changed.iter().chain(&self.removed).any(|p| p == property)
    }
}

/// Changes committed by the host since the last notification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub created: Vec<VertexId>,
    pub changed: Vec<PropertyChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    EntityMissing,
    /// Filtered out by the label inclusion policy
    NotIncluded,
    /// Roots and unit nodes are never indexed
    TimeTreeVertex,
    MissingTimestamp,
    /// The timestamp property holds a value of this type instead of an integer
    InvalidTimestamp(String),
    NoMatchingRoot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum IndexOutcome {
    Attached { entity: VertexId, node: VertexId },
    Skipped { entity: VertexId, reason: SkipReason },
    /// Indexing raised an error; the entity's previous state is kept
    Failed { entity: VertexId, error: String },
}

/// Totals reported by [`EventIndexer::backfill`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillStats {
    pub examined: usize,
    pub attached: usize,
    pub skipped: usize,
    pub failed: usize,
}

pub struct EventIndexer<S: GraphStore> {
    tree: TimeTree<S>,
    config: TimeTreeConfig,
    policy: RootPolicy,
}

impl<S: GraphStore> EventIndexer<S> {
    pub fn new(tree: TimeTree<S>, config: TimeTreeConfig) -> Result<Self> {
        config.validate()?;
        let policy = config.root_policy();
        Ok(Self { tree, config, policy })
    }

    pub fn config(&self) -> &TimeTreeConfig {
        &self.config
    }

    pub fn tree(&self) -> &TimeTree<S> {
        &self.tree
    }

    /// Index every created entity and re-index every changed entity whose
    /// timestamp or root reference moved.
    ///
    /// Entities are indexed one transaction each. An entity that fails is
    /// reported as [`IndexOutcome::Failed`] and the rest are still indexed.
    pub fn on_changes(&self, changes: &ChangeSet) -> Vec<IndexOutcome> {
        let mut outcomes = Vec::with_capacity(changes.created.len() + changes.changed.len());
        for entity in &changes.created {
            outcomes.push(Self::settle(*entity, self.index_entity(*entity)));
        }
        for change in &changes.changed {
            if self.is_relevant(change) {
                outcomes.push(Self::settle(change.vertex, self.reindex_entity(change.vertex)));
            }
        }
        outcomes
    }

    /// Attach a newly created entity
    pub fn index_entity(&self, entity: VertexId) -> Result<IndexOutcome> {
        self.tree.transaction(|tx| self.index_in(tx, entity, false))
    }

    /// Drop the entity's existing attachment and attach it afresh
    pub fn reindex_entity(&self, entity: VertexId) -> Result<IndexOutcome> {
        self.tree.transaction(|tx| self.index_in(tx, entity, true))
    }

    /// Attach entities that existed before indexing was switched on.
    ///
    /// Only runs when `auto_attach` is set and `initialize_labels` is
    /// non-empty. An entity that fails is counted and logged without
    /// stopping the run.
    pub fn backfill(&self) -> Result<BackfillStats> {
        let mut stats = BackfillStats::default();
        if !self.config.backfill_enabled() {
            debug!("Backfill disabled");
            return Ok(stats);
        }

        let ids = self.tree.transaction(|tx| Ok(tx.vertex_ids()?))?;
        for (batch, chunk) in ids.chunks(self.config.backfill_batch_size).enumerate() {
            info!("Attaching existing events to the time tree, batch {}", batch + 1);
            for &id in chunk {
                let eligible = self.tree.transaction(|tx| {
                    Ok(tx.vertex(id)?.is_some_and(|v| {
                        !is_tree_vertex(&v) && v.labels.iter().any(|l| self.config.initialize_labels.contains(l))
                    }))
                })?;
                if !eligible {
                    continue;
                }
                stats.examined += 1;
                match Self::settle(id, self.reindex_entity(id)) {
                    IndexOutcome::Attached { .. } => stats.attached += 1,
                    IndexOutcome::Skipped { .. } => stats.skipped += 1,
                    IndexOutcome::Failed { .. } => stats.failed += 1,
                }
            }
        }
        info!(
            "Backfill finished: {} examined, {} attached, {} skipped, {} failed",
            stats.examined, stats.attached, stats.skipped, stats.failed
        );
        Ok(stats)
    }

    fn settle(entity: VertexId, result: Result<IndexOutcome>) -> IndexOutcome {
        result.unwrap_or_else(|e| {
            warn!("Could not attach entity {}: {}", entity, e);
            IndexOutcome::Failed {
                entity,
                error: e.to_string(),
            }
        })
    }

    fn is_relevant(&self, change: &PropertyChange) -> bool {
        change.touches(&self.config.timestamp_property)
            || self
                .config
                .custom_root_property
                .as_deref()
                .is_some_and(|p| change.touches(p))
            || self
                .config
                .dynamic_root
                .as_ref()
                .is_some_and(|rule| change.touches(&rule.value_ref))
    }

    fn index_in(&self, tx: &mut dyn GraphTransaction, entity: VertexId, replace: bool) -> Result<IndexOutcome> {
        let skipped = |reason: SkipReason| -> Result<IndexOutcome> { Ok(IndexOutcome::Skipped { entity, reason }) };

        let Some(vertex) = tx.vertex(entity)? else {
            return skipped(SkipReason::EntityMissing);
        };
        if is_tree_vertex(&vertex) {
            return skipped(SkipReason::TimeTreeVertex);
        }

        let relationship = self.config.relationship_type.as_str();
        if replace {
            EventAttachment::detach(tx, entity, relationship)?;
        }
        if !self.config.includes(&vertex.labels) {
            return skipped(SkipReason::NotIncluded);
        }

        let property = self.config.timestamp_property.as_str();
        let instant = match vertex.property(property) {
            None => {
                warn!("Entity {} has no {} property, not attaching it", entity, property);
                return skipped(SkipReason::MissingTimestamp);
            }
            Some(value) => match value.as_i64() {
                Some(instant) => instant,
                None => {
                    warn!(
                        "Entity {} has a {} {} property, expected an integer",
                        entity,
                        value.type_name(),
                        property
                    );
                    return skipped(SkipReason::InvalidTimestamp(value.type_name().to_string()));
                }
            },
        };

        let root = match RootSelector::select(tx, &vertex, &self.policy)? {
            RootSelection::Root(root) => root,
            RootSelection::Skip => return skipped(SkipReason::NoMatchingRoot),
        };
        let path = CalendarPath::resolve(instant, self.config.resolution, &self.config.time_zone)?;
        let node = TreeNavigator::resolve_path(tx, root, &path, true)?;
        EventAttachment::attach(tx, entity, node, relationship)?;
        Ok(IndexOutcome::Attached { entity, node })
    }
}
