// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! Result formatting for table and JSON output

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use super::commands::OutputFormat;
use super::error::Result;
use timetree::{BackfillStats, Event, IndexOutcome, VertexId};

/// A record that can be shown as one table row
pub trait Tabular {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

/// A resolved time node
#[derive(Debug, Clone, Serialize)]
pub struct NodeRow {
    pub node: VertexId,
    pub path: String,
    pub resolution: String,
}

impl Tabular for NodeRow {
    fn headers() -> Vec<&'static str> {
        vec!["Node", "Path", "Resolution"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.node.to_string(), self.path.clone(), self.resolution.clone()]
    }
}

/// One node of a printed tree
#[derive(Debug, Clone, Serialize)]
pub struct TreeRow {
    pub node: VertexId,
    pub depth: usize,
    pub unit: String,
    pub value: i64,
    pub attached: usize,
}

impl Tabular for TreeRow {
    fn headers() -> Vec<&'static str> {
        vec!["Node", "Unit", "Value", "Attached"]
    }

    fn row(&self) -> Vec<String> {
        let indent = "  ".repeat(self.depth.saturating_sub(1));
        vec![
            self.node.to_string(),
            format!("{}{}", indent, self.unit),
            self.value.to_string(),
            self.attached.to_string(),
        ]
    }
}

impl Tabular for Event {
    fn headers() -> Vec<&'static str> {
        vec!["Entity", "Relationship", "Node", "Time"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.entity.to_string(),
            self.relationship.clone(),
            self.time_node.to_string(),
            self.path.to_string(),
        ]
    }
}

impl Tabular for IndexOutcome {
    fn headers() -> Vec<&'static str> {
        vec!["Entity", "Outcome", "Detail"]
    }

    fn row(&self) -> Vec<String> {
        match self {
            IndexOutcome::Attached { entity, node } => {
                vec![entity.to_string(), "attached".to_string(), format!("node {}", node)]
            }
            IndexOutcome::Skipped { entity, reason } => {
                vec![entity.to_string(), "skipped".to_string(), format!("{:?}", reason)]
            }
            IndexOutcome::Failed { entity, error } => {
                vec![entity.to_string(), "failed".to_string(), error.clone()]
            }
        }
    }
}

impl Tabular for BackfillStats {
    fn headers() -> Vec<&'static str> {
        vec!["Examined", "Attached", "Skipped", "Failed"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.examined.to_string(),
            self.attached.to_string(),
            self.skipped.to_string(),
            self.failed.to_string(),
        ]
    }
}

/// Formats command results
pub struct ResultFormatter;

impl ResultFormatter {
    pub fn format<T: Tabular + Serialize>(rows: &[T], format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Table => Ok(Self::format_table(rows)),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
        }
    }

    fn format_table<T: Tabular>(rows: &[T]) -> String {
        if rows.is_empty() {
            return "No results".to_string();
        }
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(T::headers());
        for row in rows {
            table.add_row(row.row());
        }
        format!("{}\n({} row{})", table, rows.len(), if rows.len() == 1 { "" } else { "s" })
    }
}
