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

//! CLI command definitions and argument parsing.

use crate::commands::{self, ImportOptions};
use crate::error::CliError;
use clap::{Args, Subcommand};
use strata_stream::ImportConfig;

/// Engine options shared by every command reading XML.
#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Maximum element nesting depth
    #[arg(long, default_value_t = 100)]
    pub max_depth: usize,

    /// Keep leading and trailing whitespace in text nodes
    #[arg(long)]
    pub no_trim: bool,

    /// Read buffer size in bytes
    #[arg(long, default_value_t = 64 * 1024)]
    pub buffer_size: usize,
}

impl EngineArgs {
    /// Engine configuration for these arguments.
    pub fn config(&self) -> ImportConfig {
        ImportConfig {
            buffer_size: self.buffer_size,
            max_depth: self.max_depth,
            trim_text: !self.no_trim,
            ..ImportConfig::default()
        }
    }
}

/// Top-level CLI commands.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use strata_cli::cli::Commands;
///
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
/// ```
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import records from an XML document
    ///
    /// Runs the handlers described by a JSON profile over the document and
    /// writes the completed top-level records as JSON.
    Import {
        /// Input XML file
        #[arg(value_name = "FILE")]
        file: String,

        /// Schema descriptor (JSON)
        #[arg(short, long)]
        schema: String,

        /// Import profile (JSON)
        #[arg(short, long)]
        profile: String,

        /// Write newline-delimited JSON as records complete
        #[arg(long)]
        ndjson: bool,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Print the node event stream of an XML document
    ///
    /// Shows the Open/Text/Close events the import engine receives, with
    /// their depths.
    Events {
        /// Input XML file
        #[arg(value_name = "FILE")]
        file: String,

        /// Output file path (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        engine: EngineArgs,
    },
}

impl Commands {
    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns `Err` if file I/O, schema or profile loading, or the import
    /// fails.
    pub fn execute(self) -> Result<(), CliError> {
        match self {
            Commands::Import {
                file,
                schema,
                profile,
                ndjson,
                output,
                engine,
            } => {
                let options = ImportOptions {
                    ndjson,
                    output,
                    config: engine.config(),
                };
                commands::import(&file, &schema, &profile, &options)
            }
            Commands::Events {
                file,
                output,
                engine,
            } => commands::events(&file, &engine.config(), output.as_deref()),
        }
    }
}
