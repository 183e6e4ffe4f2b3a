// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command definitions for TimeTree

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use timetree::StorageType;

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above (verbose)
    Debug,
    /// All messages including trace (very verbose)
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    /// Convert to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// TimeTree CLI - calendar time index over a graph
#[derive(Parser)]
#[command(name = "timetree")]
#[command(about = "TimeTree - index timestamped entities by calendar time")]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, global = true, default_value = "./timetree-db")]
    pub path: PathBuf,

    /// Storage backend (sled, redb, memory)
    #[arg(long, global = true, default_value = "sled")]
    pub storage: StorageType,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Set log level (error, warn, info, debug, trace, off)
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn level_filter(&self) -> log::LevelFilter {
        if self.verbose {
            log::LevelFilter::Debug
        } else {
            self.log_level
                .map_or(log::LevelFilter::Warn, LogLevel::to_level_filter)
        }
    }
}

/// Resolution, zone and root shared by every tree command
#[derive(Args, Clone, Debug)]
pub struct TreeArgs {
    /// Calendar resolution (year, month, day, hour, minute, second, millisecond)
    #[arg(short, long, default_value = "day")]
    pub resolution: String,

    /// Time zone (IANA name, GMT+1 style offset or legacy short id)
    #[arg(short = 'z', long, default_value = "UTC")]
    pub timezone: String,

    /// Custom root vertex id (defaults to the shared TimeTreeRoot)
    #[arg(long)]
    pub root: Option<u64>,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Find or create the node for one instant
    Single {
        /// Epoch milliseconds, RFC 3339 timestamp or YYYY-MM-DD (midnight UTC)
        time: String,

        #[command(flatten)]
        tree: TreeArgs,

        /// Only look the node up, never create it
        #[arg(long)]
        lookup: bool,
    },

    /// Find or create every node between two instants
    Range {
        start: String,
        end: String,

        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Find or create the node for the current instant
    Now {
        #[command(flatten)]
        tree: TreeArgs,
    },

    /// List entities attached between two instants
    Events {
        start: String,
        end: String,

        #[command(flatten)]
        tree: TreeArgs,

        /// Only report attachments of this relationship type
        #[arg(long)]
        relationship: Option<String>,
    },

    /// Create a timestamped entity and index it
    Record {
        /// Label of the new entity
        #[arg(long)]
        label: String,

        /// When the entity happened
        time: String,

        /// Extra properties as key=value
        #[arg(short, long = "property")]
        properties: Vec<String>,

        /// Indexer configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Attach every pre-existing entity selected by the configuration
    Backfill {
        /// Indexer configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the tree under a root
    Tree {
        /// Custom root vertex id (defaults to the shared TimeTreeRoot)
        #[arg(long)]
        root: Option<u64>,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
