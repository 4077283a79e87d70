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

//! CLI command implementations

mod events;
mod import;

pub use events::events;
pub use import::{import, ImportOptions};

use crate::error::CliError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

/// Default maximum input size (1 GB).
/// Can be overridden via the STRATA_MAX_FILE_SIZE environment variable.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

fn get_max_file_size() -> u64 {
    std::env::var("STRATA_MAX_FILE_SIZE")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_MAX_FILE_SIZE)
}

fn check_size(path: &str) -> Result<(), CliError> {
    let metadata = fs::metadata(path).map_err(|e| CliError::io_error(path, e))?;
    let max_file_size = get_max_file_size();
    if metadata.len() > max_file_size {
        return Err(CliError::file_too_large(path, metadata.len(), max_file_size));
    }
    Ok(())
}

/// Read a whole file (schema, profile) with size validation.
///
/// # Errors
///
/// Returns `Err` if the file is missing, larger than the configured maximum
/// (`STRATA_MAX_FILE_SIZE`), or not valid UTF-8.
pub fn read_file(path: &str) -> Result<String, CliError> {
    check_size(path)?;
    fs::read_to_string(path).map_err(|e| CliError::io_error(path, e))
}

/// Open a document for streaming, with the same size validation as
/// [`read_file`].
pub fn open_input(path: &str) -> Result<File, CliError> {
    check_size(path)?;
    File::open(path).map_err(|e| CliError::io_error(path, e))
}

/// Buffered writer to a file, or to stdout if no path is given.
pub fn output_writer(path: Option<&str>) -> Result<Box<dyn Write>, CliError> {
    match path {
        Some(p) => {
            let file = File::create(p).map_err(|e| CliError::io_error(p, e))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_missing_file() {
        let err = read_file("/nonexistent/schema.json").unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }
}
