// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Entity attachment edges

use log::debug;

use super::is_tree_edge;
use crate::error::{Result, TimeTreeError};
use crate::storage::{Direction, EdgeId, GraphTransaction, GraphTransactionExt, VertexId};

/// Links entities to the time node they happened at.
///
/// An entity has at most one outgoing attachment edge of a given type.
pub struct EventAttachment;

impl EventAttachment {
    /// Create `entity -[edge_type]-> node`. Fails with `AttachmentConflict`
    /// when the entity already has an outgoing edge of that type.
    pub fn attach(
        tx: &mut dyn GraphTransaction,
        entity: VertexId,
        node: VertexId,
        edge_type: &str,
    ) -> Result<EdgeId> {
        Self::check_edge_type(edge_type)?;
        if tx.single_edge(entity, edge_type)?.is_some() {
            return Err(TimeTreeError::AttachmentConflict {
                entity,
                edge_type: edge_type.to_string(),
            });
        }
        let edge = tx.create_edge(entity, node, edge_type)?;
        debug!("Attached {} to {} via {}", entity, node, edge_type);
        Ok(edge)
    }

    /// Remove every outgoing `edge_type` edge of `entity`, returning how
    /// many were removed
    pub fn detach(tx: &mut dyn GraphTransaction, entity: VertexId, edge_type: &str) -> Result<usize> {
        Self::check_edge_type(edge_type)?;
        let edges = tx.edges(entity, Direction::Outgoing, Some(edge_type))?;
        for edge in &edges {
            tx.delete_edge(edge.id)?;
        }
        if !edges.is_empty() {
            debug!("Detached {} from {} time node(s)", entity, edges.len());
        }
        Ok(edges.len())
    }

    /// The node `entity` is currently attached to via `edge_type`
    pub fn attached_node(
        tx: &mut dyn GraphTransaction,
        entity: VertexId,
        edge_type: &str,
    ) -> Result<Option<VertexId>> {
        Ok(tx.single_target(entity, edge_type)?)
    }

    fn check_edge_type(edge_type: &str) -> Result<()> {
        if edge_type.is_empty() || is_tree_edge(edge_type) {
            return Err(TimeTreeError::Config(format!(
                "'{}' cannot be used as an attachment relationship",
                edge_type
            )));
        }
        Ok(())
    }
}
