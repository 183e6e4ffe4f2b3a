// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Root selection
//!
//! An entity is indexed under exactly one root, chosen in this order:
//! 1. an explicit root id held in the entity's custom root property
//! 2. a dynamic root: the first vertex with a configured label whose key
//!    property equals a value copied from the entity
//! 3. the default root, created on first use

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ROOT_LABEL;
use crate::error::{Result, TimeTreeError};
use crate::storage::{GraphTransaction, Properties, Vertex, VertexId};

/// The root an operation runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreeRoot {
    /// The single `TimeTreeRoot` vertex, created lazily
    #[default]
    Default,
    /// A caller-supplied vertex that must exist
    Custom(VertexId),
}

impl From<Option<VertexId>> for TreeRoot {
    fn from(id: Option<VertexId>) -> Self {
        id.map_or(TreeRoot::Default, TreeRoot::Custom)
    }
}

/// A dynamic root rule written as `Label:property:valueRef`
///
/// The root is the vertex labelled `Label` whose `property` equals the
/// entity's `valueRef` property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DynamicRoot {
    pub label: String,
    pub property: String,
    pub value_ref: String,
}

impl FromStr for DynamicRoot {
    type Err = TimeTreeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        match parts.as_slice() {
            [label, property, value_ref]
                if !label.is_empty() && !property.is_empty() && !value_ref.is_empty() =>
            {
                Ok(DynamicRoot {
                    label: label.to_string(),
                    property: property.to_string(),
                    value_ref: value_ref.to_string(),
                })
            }
            _ => Err(TimeTreeError::Config(format!(
                "dynamic root must look like Label:property:valueRef, got '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for DynamicRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.label, self.property, self.value_ref)
    }
}

impl TryFrom<String> for DynamicRoot {
    type Error = TimeTreeError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DynamicRoot> for String {
    fn from(root: DynamicRoot) -> Self {
        root.to_string()
    }
}

/// How the root for one particular entity is found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootStrategy {
    Default,
    Fixed(VertexId),
    Dynamic(DynamicRoot),
}

/// Outcome of root selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RootSelection {
    Root(VertexId),
    /// No dynamic root matched; the entity is left unindexed
    Skip,
}

/// Configured root rules
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootPolicy {
    pub custom_root_property: Option<String>,
    pub dynamic_root: Option<DynamicRoot>,
}

impl RootPolicy {
    /// Pick the strategy that applies to `entity`
    pub fn strategy_for(&self, entity: &Vertex) -> Result<RootStrategy> {
        if let Some(property) = &self.custom_root_property {
            if let Some(value) = entity.property(property) {
                return value
                    .as_vertex_ref()
                    .map(|id| RootStrategy::Fixed(VertexId(id)))
                    .ok_or_else(|| TimeTreeError::InvalidRootReference {
                        entity: entity.id,
                        property: property.clone(),
                    });
            }
        }
        if let Some(dynamic) = &self.dynamic_root {
            if entity.property(&dynamic.value_ref).is_some() {
                return Ok(RootStrategy::Dynamic(dynamic.clone()));
            }
        }
        Ok(RootStrategy::Default)
    }
}

impl RootStrategy {
    /// Resolve this strategy to a root vertex for `entity`
    pub fn resolve(&self, tx: &mut dyn GraphTransaction, entity: &Vertex) -> Result<RootSelection> {
        match self {
            RootStrategy::Default => RootSelector::anchor(tx, TreeRoot::Default).map(RootSelection::Root),
            RootStrategy::Fixed(id) => RootSelector::anchor(tx, TreeRoot::Custom(*id)).map(RootSelection::Root),
            RootStrategy::Dynamic(rule) => {
                let Some(key) = entity.property(&rule.value_ref) else {
                    return Ok(RootSelection::Skip);
                };
                match tx.find_vertex(&rule.label, &rule.property, key)? {
                    Some(root) => Ok(RootSelection::Root(root)),
                    None => {
                        debug!(
                            "No {} vertex with {} = {} for entity {}",
                            rule.label, rule.property, key, entity.id
                        );
                        Ok(RootSelection::Skip)
                    }
                }
            }
        }
    }
}

/// Locates roots inside a transaction
pub struct RootSelector;

impl RootSelector {
    /// Root vertex for `root`, creating the default root if needed.
    /// A custom root that no longer exists fails with `RootNotFound`.
    pub fn anchor(tx: &mut dyn GraphTransaction, root: TreeRoot) -> Result<VertexId> {
        match root {
            TreeRoot::Custom(id) => Self::require(tx, id),
            TreeRoot::Default => match Self::default_root(tx)? {
                Some(id) => Ok(id),
                None => {
                    let id = tx.create_vertex(&[ROOT_LABEL], Properties::new())?;
                    debug!("Created default time tree root {}", id);
                    Ok(id)
                }
            },
        }
    }

    /// Root vertex for `root` without creating anything. Returns None only
    /// for a default root that has not been created yet.
    pub fn existing(tx: &mut dyn GraphTransaction, root: TreeRoot) -> Result<Option<VertexId>> {
        match root {
            TreeRoot::Custom(id) => Self::require(tx, id).map(Some),
            TreeRoot::Default => Self::default_root(tx),
        }
    }

    /// Apply `policy` to the entity `entity`
    pub fn select(tx: &mut dyn GraphTransaction, entity: &Vertex, policy: &RootPolicy) -> Result<RootSelection> {
        policy.strategy_for(entity)?.resolve(tx, entity)
    }

    fn require(tx: &mut dyn GraphTransaction, id: VertexId) -> Result<VertexId> {
        match tx.vertex(id)? {
            Some(_) => Ok(id),
            None => Err(TimeTreeError::RootNotFound(id)),
        }
    }

    fn default_root(tx: &mut dyn GraphTransaction) -> Result<Option<VertexId>> {
        // lowest id wins should a second root ever appear
        Ok(tx.vertices_with_label(ROOT_LABEL)?.into_iter().min())
    }
}
