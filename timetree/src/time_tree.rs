// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Time tree facade
//!
//! [`TimeTree`] binds the calendar resolver and the tree operations to a
//! [`GraphStore`]. Each public operation runs in its own transaction and
//! is retried when the commit loses a race against a concurrent writer.

use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;

use crate::calendar::{CalendarPath, Resolution, TimeZoneId};
use crate::error::{Result, TimeTreeError};
use crate::storage::{EdgeId, GraphStore, GraphTransaction, StorageError, VertexId};
use crate::tree::{
    Event, EventAttachment, EventWalker, RangeEnumerator, RootPolicy, RootSelection, RootSelector,
    TreeNavigator, TreeRoot,
};

/// Attempts made before a conflicting operation gives up
pub const MAX_CONFLICT_RETRIES: usize = 10;

/// Time tree operations over a shared graph store
pub struct TimeTree<S: GraphStore> {
    store: Arc<S>,
}

impl<S: GraphStore> Clone for TimeTree<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: GraphStore> TimeTree<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Run `work` in a fresh transaction and commit it, retrying from
    /// scratch on a storage conflict. Any other error aborts the
    /// transaction and is returned as is.
    pub fn transaction<T, F>(&self, mut work: F) -> Result<T>
    where
        F: FnMut(&mut dyn GraphTransaction) -> Result<T>,
    {
        for attempt in 1..=MAX_CONFLICT_RETRIES {
            let mut tx = self.store.begin()?;
            let outcome = match work(tx.as_mut()) {
                Ok(value) => tx.commit().map(|()| value).map_err(TimeTreeError::from),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(value) => return Ok(value),
                Err(TimeTreeError::Storage(e)) if e.is_conflict() => {
                    debug!(
                        "Transaction conflict (attempt {}/{}): {}",
                        attempt, MAX_CONFLICT_RETRIES, e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        warn!("Giving up after {} conflicting attempts", MAX_CONFLICT_RETRIES);
        Err(TimeTreeError::ConcurrentCreationFailure {
            attempts: MAX_CONFLICT_RETRIES,
        })
    }

    /// Node for `instant` at `resolution`, creating missing levels
    pub fn resolve_single(
        &self,
        root: TreeRoot,
        instant_millis: i64,
        resolution: Resolution,
        zone: &TimeZoneId,
    ) -> Result<VertexId> {
        let path = CalendarPath::resolve(instant_millis, resolution, zone)?;
        self.resolve_path(root, &path)
    }

    /// Node for an explicit calendar path, creating missing levels
    pub fn resolve_path(&self, root: TreeRoot, path: &CalendarPath) -> Result<VertexId> {
        let node = self.transaction(|tx| {
            let anchor = RootSelector::anchor(tx, root)?;
            TreeNavigator::resolve_path(tx, anchor, path, true)
        })?;
        debug!("Resolved {} to node {}", path, node);
        Ok(node)
    }

    /// Node for `instant` without creating anything
    pub fn find_single(
        &self,
        root: TreeRoot,
        instant_millis: i64,
        resolution: Resolution,
        zone: &TimeZoneId,
    ) -> Result<VertexId> {
        let path = CalendarPath::resolve(instant_millis, resolution, zone)?;
        self.transaction(|tx| match RootSelector::existing(tx, root)? {
            Some(anchor) => TreeNavigator::resolve_path(tx, anchor, &path, false),
            None => Err(TimeTreeError::PathNotFound(path.truncated(1).to_string())),
        })
    }

    /// Node for the current instant
    pub fn resolve_now(&self, root: TreeRoot, resolution: Resolution, zone: &TimeZoneId) -> Result<VertexId> {
        self.resolve_single(root, Utc::now().timestamp_millis(), resolution, zone)
    }

    /// One node per unit from `start` through `end` inclusive, in order.
    /// Units are committed one at a time.
    pub fn resolve_range(
        &self,
        root: TreeRoot,
        start_millis: i64,
        end_millis: i64,
        resolution: Resolution,
        zone: &TimeZoneId,
    ) -> Result<Vec<VertexId>> {
        let (start, end) = Self::bounds(start_millis, end_millis, resolution, zone)?;
        RangeEnumerator::resolve(&start, &end, |unit| self.resolve_path(root, unit))
    }

    pub fn attach_entity(&self, entity: VertexId, node: VertexId, edge_type: &str) -> Result<EdgeId> {
        self.transaction(|tx| {
            if tx.vertex(node)?.is_none() {
                return Err(StorageError::VertexNotFound(node).into());
            }
            EventAttachment::attach(tx, entity, node, edge_type)
        })
    }

    pub fn detach_entity(&self, entity: VertexId, edge_type: &str) -> Result<usize> {
        self.transaction(|tx| EventAttachment::detach(tx, entity, edge_type))
    }

    /// Root `entity` belongs under according to `policy`
    pub fn select_root(&self, entity: VertexId, policy: &RootPolicy) -> Result<RootSelection> {
        self.transaction(|tx| {
            let vertex = tx.vertex(entity)?.ok_or(StorageError::VertexNotFound(entity))?;
            RootSelector::select(tx, &vertex, policy)
        })
    }

    /// Entities attached anywhere between the units containing `start` and
    /// `end`, optionally restricted to one relationship type.
    ///
    /// Bounds are validated exactly as in [`TimeTree::resolve_range`].
    pub fn events_in_range(
        &self,
        root: TreeRoot,
        start_millis: i64,
        end_millis: i64,
        resolution: Resolution,
        zone: &TimeZoneId,
        edge_type: Option<&str>,
    ) -> Result<Vec<Event>> {
        let (start, end) = Self::bounds(start_millis, end_millis, resolution, zone)?;
        let walker = EventWalker::new(&start, &end, edge_type);
        self.transaction(|tx| match RootSelector::existing(tx, root)? {
            Some(anchor) => walker.collect(tx, anchor),
            None => Ok(Vec::new()),
        })
    }

    fn bounds(
        start_millis: i64,
        end_millis: i64,
        resolution: Resolution,
        zone: &TimeZoneId,
    ) -> Result<(CalendarPath, CalendarPath)> {
        if start_millis > end_millis {
            return Err(TimeTreeError::InvalidRange(format!(
                "start {} is after end {}",
                start_millis, end_millis
            )));
        }
        let start = CalendarPath::resolve(start_millis, resolution, zone)?;
        let end = CalendarPath::resolve(end_millis, resolution, zone)?;
        // a daylight-saving fold can put the later instant on an earlier wall clock
        if start > end {
            return Err(TimeTreeError::InvalidRange(format!(
                "{} is after {} in {}",
                start, end, zone
            )));
        }
        Ok((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryGraph;

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let tree = TimeTree::new(Arc::new(MemoryGraph::new()));
        let result: Result<()> = tree.transaction(|tx| {
            tx.create_vertex(&["Scratch"], Default::default())?;
            Err(TimeTreeError::Config("abort".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(tree.store().vertex_count(), 0);
    }

    #[test]
    fn test_conflicts_are_retried() {
        let graph = Arc::new(MemoryGraph::new());
        let tree = TimeTree::new(Arc::clone(&graph));
        let target = tree
            .transaction(|tx| Ok(tx.create_vertex(&["Counter"], Default::default())?))
            .unwrap();

        let mut attempts = 0;
        tree.transaction(|tx| {
            attempts += 1;
            tx.vertex(target)?;
            if attempts == 1 {
                // a competing writer commits between our read and our commit
                let mut other = graph.begin()?;
                other.set_property(target, "n", 1i64.into())?;
                other.commit()?;
            }
            tx.set_property(target, "n", 2i64.into())?;
            Ok(())
        })
        .unwrap();
        assert_eq!(attempts, 2);
    }

    #[test]
    fn test_persistent_conflict_gives_up() {
        let graph = Arc::new(MemoryGraph::new());
        let tree = TimeTree::new(Arc::clone(&graph));
        let target = tree
            .transaction(|tx| Ok(tx.create_vertex(&["Counter"], Default::default())?))
            .unwrap();

        let result = tree.transaction(|tx| {
            tx.vertex(target)?;
            let mut other = graph.begin()?;
            other.set_property(target, "n", 1i64.into())?;
            other.commit()?;
            tx.set_property(target, "n", 2i64.into())?;
            Ok(())
        });
        assert!(matches!(
            result,
            Err(TimeTreeError::ConcurrentCreationFailure {
                attempts: MAX_CONFLICT_RETRIES
            })
        ));
    }

    #[test]
    fn test_daylight_saving_fold_is_rejected_consistently() {
        let tree = TimeTree::new(Arc::new(MemoryGraph::new()));
        let zone: TimeZoneId = "America/Los_Angeles".parse().unwrap();
        // 01:30 PDT, then 01:10 PST forty minutes later
        let start = 1_414_917_000_000;
        let end = 1_414_919_400_000;

        let range = tree.resolve_range(TreeRoot::Default, start, end, Resolution::Minute, &zone);
        assert!(matches!(range, Err(TimeTreeError::InvalidRange(_))));
        let events = tree.events_in_range(TreeRoot::Default, start, end, Resolution::Minute, &zone, None);
        assert!(matches!(events, Err(TimeTreeError::InvalidRange(_))));
        assert_eq!(tree.store().vertex_count(), 0);

        // at hour resolution both instants share the 01:00 unit
        let nodes = tree
            .resolve_range(TreeRoot::Default, start, end, Resolution::Hour, &zone)
            .unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_reversed_instants_are_rejected() {
        let tree = TimeTree::new(Arc::new(MemoryGraph::new()));
        let result = tree.resolve_range(TreeRoot::Default, 10, 5, Resolution::Day, &TimeZoneId::utc());
        assert!(matches!(result, Err(TimeTreeError::InvalidRange(_))));
    }
}
