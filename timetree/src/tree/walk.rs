// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Read-only traversal collecting entities attached within a time range

use serde::Serialize;

use super::is_tree_edge;
use super::navigator::TreeNavigator;
use crate::calendar::CalendarPath;
use crate::error::Result;
use crate::storage::{Direction, GraphTransaction, VertexId};

/// An entity attached to a time node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub entity: VertexId,
    pub time_node: VertexId,
    pub relationship: String,
    /// Calendar position of `time_node`
    pub path: CalendarPath,
}

/// Walks the subtree between two calendar paths.
///
/// Only levels down to the bounds' resolution are pruned. Nodes below it
/// lie entirely inside the range, so events attached at a finer resolution
/// are collected too. Events attached to a coarser node (a Month when the
/// bounds are Days) are not: the node may extend past either bound.
pub struct EventWalker<'a> {
    start: Vec<i64>,
    end: Vec<i64>,
    relationship: Option<&'a str>,
}

impl<'a> EventWalker<'a> {
    pub fn new(start: &CalendarPath, end: &CalendarPath, relationship: Option<&'a str>) -> Self {
        let widen = |path: &CalendarPath| -> Vec<i64> {
            path.values().into_iter().map(i64::from).collect()
        };
        Self {
            start: widen(start),
            end: widen(end),
            relationship,
        }
    }

    /// Events under `root`, ordered by time node then by edge id
    pub fn collect(&self, tx: &mut dyn GraphTransaction, root: VertexId) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        let mut prefix = Vec::new();
        self.visit_children(tx, root, &mut prefix, &mut events)?;
        Ok(events)
    }

    fn visit_children(
        &self,
        tx: &mut dyn GraphTransaction,
        parent: VertexId,
        prefix: &mut Vec<i64>,
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let depth = prefix.len();
        for (child, value) in TreeNavigator::children(tx, parent)? {
            prefix.push(value);
            let bounded = depth < self.start.len();
            if bounded && prefix.as_slice() > &self.end[..=depth] {
                prefix.pop();
                break;
            }
            if !bounded || prefix.as_slice() >= &self.start[..=depth] {
                if prefix.len() >= self.start.len() {
                    self.collect_attached(tx, child, prefix, events)?;
                }
                self.visit_children(tx, child, prefix, events)?;
            }
            prefix.pop();
        }
        Ok(())
    }

    fn collect_attached(
        &self,
        tx: &mut dyn GraphTransaction,
        node: VertexId,
        prefix: &[i64],
        events: &mut Vec<Event>,
    ) -> Result<()> {
        let incoming = tx.edges(node, Direction::Incoming, self.relationship)?;
        if incoming.iter().all(|edge| is_tree_edge(&edge.edge_type)) {
            return Ok(());
        }
        let values: Vec<i32> = prefix.iter().map(|v| *v as i32).collect();
        let path = CalendarPath::from_values(&values)?;
        events.extend(
            incoming
                .into_iter()
                .filter(|edge| !is_tree_edge(&edge.edge_type))
                .map(|edge| Event {
                    entity: edge.from,
                    time_node: node,
                    relationship: edge.edge_type,
                    path: path.clone(),
                }),
        );
        Ok(())
    }
}
