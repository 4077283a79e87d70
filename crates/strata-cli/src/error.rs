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

//! Structured error types for the Strata CLI.
//!
//! All CLI operations return `Result<T, CliError>` for consistent error
//! reporting.

use std::io;
use std::path::PathBuf;
use strata_stream::ImportError;
use thiserror::Error;

/// The main error type for Strata CLI operations.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_cli::error::CliError;
///
/// fn read(path: &str) -> Result<String, CliError> {
///     std::fs::read_to_string(path).map_err(|e| CliError::io_error(path, e))
/// }
/// ```
#[derive(Error, Debug, Clone)]
pub enum CliError {
    /// I/O operation failed (file read, write, or metadata access).
    #[error("I/O error for '{path}': {message}")]
    Io {
        /// The file path that caused the error
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// File size exceeds the maximum allowed limit.
    #[error("File '{path}' is too large ({actual} bytes). Maximum allowed: {max} bytes ({max_mb} MB)")]
    FileTooLarge {
        /// The file path that exceeded the limit
        path: PathBuf,
        /// The actual file size in bytes
        actual: u64,
        /// The maximum allowed file size in bytes
        max: u64,
        /// The maximum allowed file size in MB (for display)
        max_mb: u64,
    },

    /// The schema descriptor could not be loaded.
    #[error("Schema error in '{path}': {message}")]
    Schema {
        /// Schema file
        path: PathBuf,
        /// The error message
        message: String,
    },

    /// The import profile is malformed or inconsistent with the schema.
    #[error("Profile error: {0}")]
    Profile(String),

    /// The import pass failed.
    #[error("Import failed: {0}")]
    Import(String),

    /// JSON serialization error.
    #[error("JSON format error: {message}")]
    JsonFormat {
        /// The error message
        message: String,
    },
}

impl CliError {
    /// Create an I/O error with file path context.
    pub fn io_error(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Create a file-too-large error.
    pub fn file_too_large(path: impl Into<PathBuf>, actual: u64, max: u64) -> Self {
        Self::FileTooLarge {
            path: path.into(),
            actual,
            max,
            max_mb: max / (1024 * 1024),
        }
    }

    /// Create a schema error.
    pub fn schema(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Schema {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a profile error.
    pub fn profile(msg: impl Into<String>) -> Self {
        Self::Profile(msg.into())
    }
}

impl From<ImportError> for CliError {
    fn from(source: ImportError) -> Self {
        Self::Import(source.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(source: serde_json::Error) -> Self {
        Self::JsonFormat {
            message: source.to_string(),
        }
    }
}
