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

//! Import command - run a profile-driven import and write records as JSON

use super::{open_input, output_writer, read_file};
use crate::error::CliError;
use crate::profile::Profile;
use colored::Colorize;
use std::io::Write;
use strata_core::{RecordRef, SchemaRegistry};
use strata_stream::{ImportConfig, Importer};
use tracing::debug;

/// Options for [`import`].
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Write one JSON record per line as records complete, instead of a
    /// single pretty-printed array at the end.
    pub ndjson: bool,
    /// Output file (defaults to stdout).
    pub output: Option<String>,
    /// Engine configuration.
    pub config: ImportConfig,
}

/// Import `file` with the given schema and profile.
///
/// Records are written as JSON; a summary with counts and any diagnostics
/// (duplicate assignments, undischarged proxies) goes to stderr.
///
/// # Errors
///
/// Returns `Err` if any input cannot be read, the schema or profile is
/// invalid, or the import fails.
///
/// # Examples
///
/// ```no_run
/// use strata_cli::commands::{import, ImportOptions};
///
/// # fn main() -> Result<(), strata_cli::error::CliError> {
/// import("accessions.xml", "schema.json", "profile.json", &ImportOptions::default())?;
/// # Ok(())
/// # }
/// ```
pub fn import(
    file: &str,
    schema: &str,
    profile: &str,
    options: &ImportOptions,
) -> Result<(), CliError> {
    let registry: SchemaRegistry =
        serde_json::from_str(&read_file(schema)?).map_err(|e| CliError::schema(schema, e))?;
    let handlers = Profile::from_json(&read_file(profile)?)?.into_handlers(&registry)?;
    debug!(
        record_types = registry.len(),
        elements = handlers.len(),
        "Loaded schema and profile"
    );

    let input = open_input(file)?;
    let mut importer = Importer::from_reader(input, registry, handlers, options.config.clone());
    let mut out = output_writer(options.output.as_deref())?;
    let target = options.output.as_deref().unwrap_or("stdout");

    let result = if options.ndjson {
        write_ndjson(&mut importer, &mut out, target)
    } else {
        write_array(&mut importer, &mut out, target)
    };
    if let Err(e) = result {
        eprintln!("{} {}", "✗".red().bold(), file);
        return Err(e);
    }
    out.flush().map_err(|e| CliError::io_error(target, e))?;

    let stats = importer.stats();
    let diagnostics = importer.diagnostics();
    eprintln!("{} {}", "✓".green().bold(), file);
    eprintln!("  Records: {}", stats.records_emitted);
    eprintln!("  Events: {}", stats.events);
    eprintln!("  Peak depth: {}", stats.peak_context_depth);
    for diagnostic in &diagnostics {
        eprintln!("  {} {}", "warning:".yellow().bold(), diagnostic);
    }
    Ok(())
}

fn write_ndjson<S: strata_stream::EventSource>(
    importer: &mut Importer<S>,
    out: &mut dyn Write,
    target: &str,
) -> Result<(), CliError> {
    while let Some(record) = importer.next_record()? {
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out).map_err(|e| CliError::io_error(target, e))?;
    }
    Ok(())
}

fn write_array<S: strata_stream::EventSource>(
    importer: &mut Importer<S>,
    out: &mut dyn Write,
    target: &str,
) -> Result<(), CliError> {
    let mut records: Vec<RecordRef> = Vec::new();
    while let Some(record) = importer.next_record()? {
        records.push(record);
    }
    serde_json::to_writer_pretty(&mut *out, &records)?;
    writeln!(out).map_err(|e| CliError::io_error(target, e))
}
