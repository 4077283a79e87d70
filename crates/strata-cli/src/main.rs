// Dweve Strata - Streaming Record Import
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Strata Command Line Interface

use clap::Parser;
use std::process::ExitCode;
use strata_cli::cli::Commands;
use tracing_subscriber::EnvFilter;

/// Strata - streaming record import from XML
///
/// # Examples
///
/// ```bash
/// # Import accessions as a JSON array
/// strata import accessions.xml --schema schema.json --profile profile.json
///
/// # Stream records as NDJSON into a file
/// strata import accessions.xml -s schema.json -p profile.json --ndjson -o out.ndjson
///
/// # Show the event stream the engine sees
/// strata events accessions.xml
/// ```
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about = "Strata - streaming record import from XML", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn,strata_stream=info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.execute() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
