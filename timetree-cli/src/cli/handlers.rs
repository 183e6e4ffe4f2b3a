// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command handlers for TimeTree
//!
//! Every invocation loads the persisted graph, runs one command against it
//! and, for commands that may create nodes or edges, saves it back.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use colored::Colorize;
use log::debug;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::commands::{Cli, Commands, OutputFormat, TreeArgs};
use super::error::{CliError, Result};
use super::output::{NodeRow, ResultFormatter, Tabular, TreeRow};
use timetree::storage::persistent::open_driver;
use timetree::tree::{is_tree_edge, RangeEnumerator, RootSelector, TreeNavigator};
use timetree::{
    CalendarPath, ChangeSet, Direction, EventIndexer, GraphTransaction, MemoryGraph, Properties,
    Resolution, SnapshotStore, StorageType, TimeTree, TimeTreeConfig, TimeZoneId, TreeRoot, Value,
    VertexId,
};

/// A persisted graph opened for one command
pub struct Database {
    store: SnapshotStore,
    tree: TimeTree<MemoryGraph>,
}

impl Database {
    pub fn open(path: &Path, storage: StorageType) -> Result<Self> {
        let store = SnapshotStore::new(open_driver(storage, path)?);
        let graph = store.load()?;
        debug!("Opened {} database at {:?}", storage, path);
        Ok(Self {
            store,
            tree: TimeTree::new(Arc::new(graph)),
        })
    }

    pub fn tree(&self) -> &TimeTree<MemoryGraph> {
        &self.tree
    }

    pub fn save(&self) -> Result<()> {
        self.store.save(self.tree.store())?;
        Ok(())
    }
}

/// Execute a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let db = Database::open(&cli.path, cli.storage)?;
    let format = cli.format;

    match cli.command {
        Commands::Single { time, tree, lookup } => handle_single(&db, &time, &tree, lookup, format),
        Commands::Range { start, end, tree } => handle_range(&db, &start, &end, &tree, format),
        Commands::Now { tree } => {
            let now = Utc::now().timestamp_millis().to_string();
            handle_single(&db, &now, &tree, false, format)
        }
        Commands::Events {
            start,
            end,
            tree,
            relationship,
        } => handle_events(&db, &start, &end, &tree, relationship.as_deref(), format),
        Commands::Record {
            label,
            time,
            properties,
            config,
        } => {
            let config = match config {
                Some(path) => TimeTreeConfig::from_file(path)?,
                None => TimeTreeConfig::default(),
            };
            handle_record(&db, &label, &time, &properties, config, format)
        }
        Commands::Backfill { config } => {
            handle_backfill(&db, TimeTreeConfig::from_file(config)?, format)
        }
        Commands::Tree { root } => handle_tree(&db, TreeRoot::from(root.map(VertexId)), format),
    }
}

/// Handle the single and now commands
pub fn handle_single(
    db: &Database,
    time: &str,
    args: &TreeArgs,
    lookup: bool,
    format: OutputFormat,
) -> Result<()> {
    let instant = parse_instant(time)?;
    let (root, resolution, zone) = tree_settings(args)?;
    let path = CalendarPath::resolve(instant, resolution, &zone)?;

    let node = if lookup {
        db.tree().find_single(root, instant, resolution, &zone)?
    } else {
        let node = db.tree().resolve_path(root, &path)?;
        db.save()?;
        node
    };
    print_rows(
        &[NodeRow {
            node,
            path: path.to_string(),
            resolution: resolution.to_string(),
        }],
        format,
    )
}

/// Handle the range command
pub fn handle_range(db: &Database, start: &str, end: &str, args: &TreeArgs, format: OutputFormat) -> Result<()> {
    let (start, end) = (parse_instant(start)?, parse_instant(end)?);
    let (root, resolution, zone) = tree_settings(args)?;

    let result = db.tree().resolve_range(root, start, end, resolution, &zone);
    // units resolved before a failure are committed, keep them
    db.save()?;
    let nodes = result?;

    let first = CalendarPath::resolve(start, resolution, &zone)?;
    let last = CalendarPath::resolve(end, resolution, &zone)?;
    let rows: Vec<NodeRow> = RangeEnumerator::units(&first, &last)?
        .zip(nodes)
        .map(|(path, node)| NodeRow {
            node,
            path: path.to_string(),
            resolution: resolution.to_string(),
        })
        .collect();
    print_rows(&rows, format)
}

/// Handle the events command
pub fn handle_events(
    db: &Database,
    start: &str,
    end: &str,
    args: &TreeArgs,
    relationship: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let (start, end) = (parse_instant(start)?, parse_instant(end)?);
    let (root, resolution, zone) = tree_settings(args)?;
    let events = db
        .tree()
        .events_in_range(root, start, end, resolution, &zone, relationship)?;
    print_rows(&events, format)
}

/// Handle the record command: create an entity and index it
pub fn handle_record(
    db: &Database,
    label: &str,
    time: &str,
    properties: &[String],
    config: TimeTreeConfig,
    format: OutputFormat,
) -> Result<()> {
    let instant = parse_instant(time)?;
    let mut props: Properties = properties
        .iter()
        .map(|p| parse_property(p))
        .collect::<Result<_>>()?;
    props.insert(config.timestamp_property.clone(), Value::Integer(instant));

    let entity = db
        .tree()
        .transaction(|tx| Ok(tx.create_vertex(&[label], props.clone())?))?;
    let indexer = EventIndexer::new(db.tree().clone(), config)?;
    let outcomes = indexer.on_changes(&ChangeSet {
        created: vec![entity],
        ..ChangeSet::default()
    });
    db.save()?;

    if format == OutputFormat::Table {
        println!("{}", format!("Created {} entity {}", label, entity).green());
    }
    print_rows(&outcomes, format)
}

/// Handle the backfill command
pub fn handle_backfill(db: &Database, config: TimeTreeConfig, format: OutputFormat) -> Result<()> {
    if !config.backfill_enabled() && format == OutputFormat::Table {
        println!(
            "{}",
            "Backfill needs auto_attach and a non-empty initialize_labels list".yellow()
        );
    }
    let stats = EventIndexer::new(db.tree().clone(), config)?.backfill()?;
    db.save()?;
    print_rows(&[stats], format)
}

/// Handle the tree command
pub fn handle_tree(db: &Database, root: TreeRoot, format: OutputFormat) -> Result<()> {
    let rows = db.tree().transaction(|tx| {
        let mut rows = Vec::new();
        if let Some(anchor) = RootSelector::existing(tx, root)? {
            collect_tree(tx, anchor, 1, &mut rows)?;
        }
        Ok(rows)
    })?;
    print_rows(&rows, format)
}

fn collect_tree(
    tx: &mut dyn GraphTransaction,
    parent: VertexId,
    depth: usize,
    rows: &mut Vec<TreeRow>,
) -> timetree::Result<()> {
    for (node, value) in TreeNavigator::children(tx, parent)? {
        let unit = tx
            .vertex(node)?
            .and_then(|v| v.labels.iter().find_map(|l| Resolution::from_label(l)))
            .map_or_else(|| "?".to_string(), |r| r.label().to_string());
        let attached = tx
            .edges(node, Direction::Incoming, None)?
            .iter()
            .filter(|e| !is_tree_edge(&e.edge_type))
            .count();
        rows.push(TreeRow {
            node,
            depth,
            unit,
            value,
            attached,
        });
        collect_tree(tx, node, depth + 1, rows)?;
    }
    Ok(())
}

fn print_rows<T: Tabular + Serialize>(rows: &[T], format: OutputFormat) -> Result<()> {
    println!("{}", ResultFormatter::format(rows, format)?);
    Ok(())
}

fn tree_settings(args: &TreeArgs) -> Result<(TreeRoot, Resolution, TimeZoneId)> {
    let resolution: Resolution = args.resolution.parse()?;
    let zone: TimeZoneId = args.timezone.parse()?;
    Ok((TreeRoot::from(args.root.map(VertexId)), resolution, zone))
}

/// Parse epoch milliseconds, an RFC 3339 timestamp or a plain date
pub fn parse_instant(s: &str) -> Result<i64> {
    let s = s.trim();
    if let Ok(millis) = s.parse::<i64>() {
        return Ok(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.timestamp_millis());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&midnight).timestamp_millis());
    }
    Err(CliError::InvalidArgument(format!(
        "'{}' is not epoch milliseconds, an RFC 3339 timestamp or YYYY-MM-DD",
        s
    )))
}

/// Parse `key=value`; integers, floats and booleans keep their type
pub fn parse_property(s: &str) -> Result<(String, Value)> {
    let (key, raw) = s
        .split_once('=')
        .filter(|(key, _)| !key.trim().is_empty())
        .ok_or_else(|| CliError::InvalidArgument(format!("property '{}' must look like key=value", s)))?;
    let value = if let Ok(i) = raw.parse::<i64>() {
        Value::Integer(i)
    } else if let Ok(b) = raw.parse::<bool>() {
        Value::Boolean(b)
    } else if let Ok(f) = raw.parse::<f64>() {
        Value::Float(f)
    } else {
        Value::String(raw.to_string())
    };
    Ok((key.trim().to_string(), value))
}
