// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Find-or-create navigation of tree levels
//!
//! Every operation runs inside the caller's transaction, so a concurrent
//! creation of the same node surfaces as a commit conflict rather than a
//! duplicate sibling.

use log::debug;
use std::collections::HashSet;

use super::{CHILD, FIRST, LAST, NEXT, VALUE_PROPERTY};
use crate::calendar::{CalendarPath, Resolution};
use crate::error::{Result, TimeTreeError};
use crate::storage::{
    Direction, GraphTransaction, GraphTransactionExt, Properties, StorageError, Value, VertexId,
};

/// Stateless navigator over the sibling structure of a time tree
pub struct TreeNavigator;

impl TreeNavigator {
    /// The child of `parent` of the given unit and value, if present
    pub fn find_child(
        tx: &mut dyn GraphTransaction,
        parent: VertexId,
        unit: Resolution,
        value: i32,
    ) -> Result<Option<VertexId>> {
        let wanted = i64::from(value);
        for edge in tx.edges(parent, Direction::Outgoing, Some(CHILD))? {
            if let Some(child) = tx.vertex(edge.to)? {
                if child.has_label(unit.label())
                    && child.property(VALUE_PROPERTY).and_then(Value::as_i64) == Some(wanted)
                {
                    return Ok(Some(child.id));
                }
            }
        }
        Ok(None)
    }

    /// Find the child of `parent` for `(unit, value)`, creating it when
    /// `create` is set. A created child is spliced into the NEXT chain at
    /// its ordered position and FIRST/LAST are moved when it becomes the
    /// new smallest or largest sibling.
    pub fn resolve(
        tx: &mut dyn GraphTransaction,
        parent: VertexId,
        unit: Resolution,
        value: i32,
        create: bool,
    ) -> Result<Option<VertexId>> {
        if let Some(existing) = Self::find_child(tx, parent, unit, value)? {
            return Ok(Some(existing));
        }
        if !create {
            return Ok(None);
        }

        let mut properties = Properties::new();
        properties.insert(VALUE_PROPERTY.to_string(), Value::from(value));
        let node = tx.create_vertex(&[unit.label()], properties)?;
        tx.create_edge(parent, node, CHILD)?;
        Self::splice(tx, parent, node, i64::from(value))?;

        debug!("Created {} node {} (value {}) under {}", unit.label(), node, value, parent);
        Ok(Some(node))
    }

    /// Walk `path` down from `root`. Lookup-only walks fail with
    /// `PathNotFound` naming the first missing level.
    pub fn resolve_path(
        tx: &mut dyn GraphTransaction,
        root: VertexId,
        path: &CalendarPath,
        create: bool,
    ) -> Result<VertexId> {
        let mut parent = root;
        for (depth, segment) in path.segments().iter().enumerate() {
            parent = Self::resolve(tx, parent, segment.unit, segment.value, create)?
                .ok_or_else(|| TimeTreeError::PathNotFound(path.truncated(depth + 1).to_string()))?;
        }
        Ok(parent)
    }

    /// Integer value of a tree node
    pub fn node_value(tx: &mut dyn GraphTransaction, node: VertexId) -> Result<i64> {
        let vertex = tx.vertex(node)?.ok_or(StorageError::VertexNotFound(node))?;
        vertex
            .property(VALUE_PROPERTY)
            .and_then(Value::as_i64)
            .ok_or_else(|| TimeTreeError::CorruptTree(format!("node {} has no integer value", node)))
    }

    /// Children of `parent` in ascending order, following FIRST then NEXT
    pub fn children(tx: &mut dyn GraphTransaction, parent: VertexId) -> Result<Vec<(VertexId, i64)>> {
        let mut children = Vec::new();
        let mut visited = HashSet::new();
        let mut current = tx.single_target(parent, FIRST)?;
        while let Some(node) = current {
            if !visited.insert(node) {
                return Err(TimeTreeError::CorruptTree(format!(
                    "NEXT chain under {} loops back to {}",
                    parent, node
                )));
            }
            children.push((node, Self::node_value(tx, node)?));
            current = tx.single_target(node, NEXT)?;
        }
        Ok(children)
    }

    /// Check the sibling invariants of `parent`: the NEXT chain from FIRST
    /// visits every child exactly once in strictly ascending order and ends
    /// at LAST.
    pub fn verify_siblings(tx: &mut dyn GraphTransaction, parent: VertexId) -> Result<()> {
        let corrupt = |msg: String| -> Result<()> { Err(TimeTreeError::CorruptTree(msg)) };

        let child_ids: HashSet<VertexId> = tx
            .edges(parent, Direction::Outgoing, Some(CHILD))?
            .into_iter()
            .map(|e| e.to)
            .collect();
        let firsts = tx.edges(parent, Direction::Outgoing, Some(FIRST))?;
        let lasts = tx.edges(parent, Direction::Outgoing, Some(LAST))?;

        if child_ids.is_empty() {
            if firsts.is_empty() && lasts.is_empty() {
                return Ok(());
            }
            return corrupt(format!("{} has FIRST/LAST but no children", parent));
        }
        if firsts.len() != 1 || lasts.len() != 1 {
            return corrupt(format!(
                "{} has {} FIRST and {} LAST edges",
                parent,
                firsts.len(),
                lasts.len()
            ));
        }

        let chain = Self::children(tx, parent)?;
        if chain.len() != child_ids.len() || chain.iter().any(|(id, _)| !child_ids.contains(id)) {
            return corrupt(format!(
                "NEXT chain under {} visits {} nodes but there are {} children",
                parent,
                chain.len(),
                child_ids.len()
            ));
        }
        if let Some(pair) = chain.windows(2).find(|pair| pair[0].1 >= pair[1].1) {
            return corrupt(format!(
                "siblings {} and {} under {} are out of order",
                pair[0].0, pair[1].0, parent
            ));
        }
        for (id, _) in &chain {
            if tx.edges(*id, Direction::Outgoing, Some(NEXT))?.len() > 1 {
                return corrupt(format!("{} has more than one NEXT edge", id));
            }
        }
        if chain.last().map(|(id, _)| *id) != Some(lasts[0].to) {
            return corrupt(format!("LAST of {} is not the end of its NEXT chain", parent));
        }
        Ok(())
    }

    fn splice(tx: &mut dyn GraphTransaction, parent: VertexId, node: VertexId, value: i64) -> Result<()> {
        let first_edge = match tx.single_edge(parent, FIRST)? {
            Some(edge) => edge,
            None => {
                tx.create_edge(parent, node, FIRST)?;
                tx.create_edge(parent, node, LAST)?;
                return Ok(());
            }
        };

        // find the neighbours the new node goes between
        let mut previous = None;
        let mut current = Some(first_edge.to);
        let mut visited = HashSet::new();
        while let Some(sibling) = current {
            if !visited.insert(sibling) {
                return Err(TimeTreeError::CorruptTree(format!(
                    "NEXT chain under {} loops back to {}",
                    parent, sibling
                )));
            }
            if Self::node_value(tx, sibling)? > value {
                break;
            }
            previous = Some(sibling);
            current = tx.single_target(sibling, NEXT)?;
        }

        match previous {
            None => {
                tx.delete_edge(first_edge.id)?;
                tx.create_edge(parent, node, FIRST)?;
            }
            Some(prev) => {
                if let Some(next_edge) = tx.single_edge(prev, NEXT)? {
                    tx.delete_edge(next_edge.id)?;
                }
                tx.create_edge(prev, node, NEXT)?;
            }
        }

        match current {
            Some(next) => {
                tx.create_edge(node, next, NEXT)?;
            }
            None => {
                if let Some(last_edge) = tx.single_edge(parent, LAST)? {
                    tx.delete_edge(last_edge.id)?;
                }
                tx.create_edge(parent, node, LAST)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{GraphStore, MemoryGraph};

    #[test]
    fn test_out_of_order_inserts_keep_chain_sorted() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let root = tx.create_vertex(&["TimeTreeRoot"], Properties::new()).unwrap();

        for value in [5, 1, 3, 9, 7] {
            TreeNavigator::resolve(tx.as_mut(), root, Resolution::Year, value, true).unwrap();
            TreeNavigator::verify_siblings(tx.as_mut(), root).unwrap();
        }

        let values: Vec<i64> = TreeNavigator::children(tx.as_mut(), root)
            .unwrap()
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(values, vec![1, 3, 5, 7, 9]);
        tx.commit().unwrap();
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let root = tx.create_vertex(&["TimeTreeRoot"], Properties::new()).unwrap();

        let first = TreeNavigator::resolve(tx.as_mut(), root, Resolution::Year, 2013, true).unwrap();
        let second = TreeNavigator::resolve(tx.as_mut(), root, Resolution::Year, 2013, true).unwrap();
        assert_eq!(first, second);
        assert_eq!(tx.edges(root, Direction::Outgoing, Some(CHILD)).unwrap().len(), 1);
    }

    #[test]
    fn test_lookup_only_creates_nothing() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let root = tx.create_vertex(&["TimeTreeRoot"], Properties::new()).unwrap();

        let found = TreeNavigator::resolve(tx.as_mut(), root, Resolution::Year, 2013, false).unwrap();
        assert_eq!(found, None);
        assert!(tx.edges(root, Direction::Outgoing, None).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_path_reports_first_missing_level() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let root = tx.create_vertex(&["TimeTreeRoot"], Properties::new()).unwrap();

        let may = CalendarPath::from_values(&[2013, 5]).unwrap();
        TreeNavigator::resolve_path(tx.as_mut(), root, &may, true).unwrap();

        let day = CalendarPath::from_values(&[2013, 5, 4]).unwrap();
        match TreeNavigator::resolve_path(tx.as_mut(), root, &day, false) {
            Err(TimeTreeError::PathNotFound(missing)) => assert_eq!(missing, "2013-05-04"),
            other => panic!("expected PathNotFound, got {:?}", other),
        }

        let june = CalendarPath::from_values(&[2013, 6, 1]).unwrap();
        match TreeNavigator::resolve_path(tx.as_mut(), root, &june, false) {
            Err(TimeTreeError::PathNotFound(missing)) => assert_eq!(missing, "2013-06"),
            other => panic!("expected PathNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_detects_broken_chain() {
        let graph = MemoryGraph::new();
        let mut tx = graph.begin().unwrap();
        let root = tx.create_vertex(&["TimeTreeRoot"], Properties::new()).unwrap();
        let a = TreeNavigator::resolve(tx.as_mut(), root, Resolution::Year, 1, true).unwrap().unwrap();
        TreeNavigator::resolve(tx.as_mut(), root, Resolution::Year, 2, true).unwrap();

        let next = tx.single_edge(a, NEXT).unwrap().unwrap();
        tx.delete_edge(next.id).unwrap();
        assert!(matches!(
            TreeNavigator::verify_siblings(tx.as_mut(), root),
            Err(TimeTreeError::CorruptTree(_))
        ));
    }
}
