// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! CLI module for TimeTree
//!
//! Provides one-shot commands to resolve instants and ranges, record and
//! backfill entities, and inspect a persisted tree.

pub mod commands;
pub mod error;
pub mod handlers;
pub mod output;

pub use commands::Cli;
pub use handlers::run;
