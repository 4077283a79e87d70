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

//! Error types for the streaming import engine.
//!
//! Every error in this module is fatal for the document being imported: the
//! engine stops pulling events and the partially built records are dropped.
//! Non-fatal conditions (duplicate scalar assignments, undischarged proxies)
//! are reported as [`Diagnostic`](crate::Diagnostic)s instead.
//!
//! # Error Categories
//!
//! - **Structural**: closing order does not match what was opened
//!   ([`StructuralMismatch`](ImportError::StructuralMismatch),
//!   [`SlotReopened`](ImportError::SlotReopened),
//!   [`UnclosedRecords`](ImportError::UnclosedRecords),
//!   [`UnclosedElement`](ImportError::UnclosedElement))
//! - **Schema**: unknown record type or property, uncoercible value
//! - **Input**: malformed XML, I/O failures, nesting limits
//! - **Configuration**: invalid handler tables
//!
//! # Examples
//!
//! ```rust
//! use strata_stream::ImportError;
//!
//! let err = ImportError::structural_mismatch("date", 2, "date", Some("extent"));
//! assert!(err.is_structural());
//! assert!(err.to_string().contains("expected 'date'"));
//! ```

use strata_core::CoreError;
use thiserror::Error;

/// Errors that abort an import.
#[derive(Error, Debug)]
pub enum ImportError {
    /// A close was requested for a record type that is not on top of the
    /// context stack.
    #[error("Structural mismatch closing <{element}> at depth {depth}: expected '{expected}' on top of the context stack, found {found}")]
    StructuralMismatch {
        element: String,
        depth: usize,
        expected: String,
        found: String,
    },

    /// An element re-opened a (name, depth) slot whose records are still open.
    #[error("Element <{element}> at depth {depth} reopened while records opened there are still open")]
    SlotReopened { element: String, depth: usize },

    /// The stream ended with records still open.
    #[error("Unexpected end of stream: {open} record(s) still open, innermost '{innermost}'")]
    UnclosedRecords { open: usize, innermost: String },

    /// The document ended inside an element.
    #[error("Unexpected end of document: element <{element}> at depth {depth} was never closed")]
    UnclosedElement { element: String, depth: usize },

    /// Element nesting exceeded the configured maximum.
    #[error("Element nesting exceeded maximum depth (max: {max}, found: {depth})")]
    DepthLimitExceeded { max: usize, depth: usize },

    /// Malformed XML.
    #[error("XML error at position {position}: {message}")]
    Xml { position: usize, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema lookup or coercion failure.
    #[error(transparent)]
    Schema(#[from] CoreError),

    /// A property was set on a record that does not exist.
    #[error("No target record for property '{property}' in <{element}>")]
    MissingTarget { element: String, property: String },

    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ImportError {
    /// Create a structural mismatch error. `found` is `None` when the context
    /// stack is empty.
    pub fn structural_mismatch(
        element: impl Into<String>,
        depth: usize,
        expected: impl Into<String>,
        found: Option<&str>,
    ) -> Self {
        Self::StructuralMismatch {
            element: element.into(),
            depth,
            expected: expected.into(),
            found: found.map_or_else(|| "an empty stack".to_string(), |t| format!("'{}'", t)),
        }
    }

    /// Create an XML error.
    #[inline]
    pub fn xml(position: usize, message: impl Into<String>) -> Self {
        Self::Xml {
            position,
            message: message.into(),
        }
    }

    /// Create a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for the errors signalling unbalanced open/close structure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::StructuralMismatch { .. }
                | Self::SlotReopened { .. }
                | Self::UnclosedRecords { .. }
                | Self::UnclosedElement { .. }
        )
    }

    /// True for schema lookup errors (unknown record type or property).
    pub fn is_schema_lookup(&self) -> bool {
        matches!(
            self,
            Self::Schema(CoreError::SchemaLookup { .. } | CoreError::UnknownRecordType(_))
        )
    }
}

/// Result type for import operations.
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_mismatch_display() {
        let err = ImportError::structural_mismatch("date", 2, "date", Some("extent"));
        assert_eq!(
            err.to_string(),
            "Structural mismatch closing <date> at depth 2: expected 'date' on top of the context stack, found 'extent'"
        );

        let empty = ImportError::structural_mismatch("date", 2, "date", None);
        assert!(empty.to_string().ends_with("found an empty stack"));
    }

    #[test]
    fn test_categories() {
        assert!(ImportError::SlotReopened {
            element: "a".to_string(),
            depth: 1
        }
        .is_structural());
        assert!(!ImportError::config("x").is_structural());

        let lookup: ImportError = CoreError::schema_lookup("accession", "x").into();
        assert!(lookup.is_schema_lookup());
        assert!(!lookup.is_structural());
    }

    #[test]
    fn test_schema_error_is_transparent() {
        let err: ImportError = CoreError::UnknownRecordType("widget".to_string()).into();
        assert_eq!(err.to_string(), "Unknown record type 'widget'");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated");
        let err: ImportError = io.into();
        assert!(err.to_string().starts_with("IO error"));
    }
}
