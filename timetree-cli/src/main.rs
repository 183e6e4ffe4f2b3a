// Copyright (c) 2024-2025 TimeTree Contributors
// SPDX-License-Identifier: Apache-2.0
//
//! TimeTree command-line entry point

mod cli;

use clap::Parser;
use colored::Colorize;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.level_filter())
        .format_timestamp(None)
        .init();

    if let Err(e) = cli::run(cli) {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(e.exit_code());
    }
}
