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

//! Events command - dump the normalized node event stream

use super::{open_input, output_writer};
use crate::error::CliError;
use std::io::Write;
use strata_stream::{EventSource, ImportConfig, XmlEventReader};

/// Print every node event of `file` with its depth, one per line.
///
/// This is the stream the import engine sees: empty elements expanded,
/// whitespace-only text dropped, text trimmed.
///
/// # Errors
///
/// Returns `Err` if the file cannot be read or is not well-formed XML.
pub fn events(file: &str, config: &ImportConfig, output: Option<&str>) -> Result<(), CliError> {
    let input = open_input(file)?;
    let mut reader = XmlEventReader::from_read(input, config);
    let mut out = output_writer(output)?;
    let target = output.unwrap_or("stdout");

    while let Some(event) = reader.next_event()? {
        writeln!(out, "{:>3} {}", event.depth(), event)
            .map_err(|e| CliError::io_error(target, e))?;
    }
    out.flush().map_err(|e| CliError::io_error(target, e))
}
