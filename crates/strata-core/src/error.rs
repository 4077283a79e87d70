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

//! Error types for the record model and schema lookups.

use thiserror::Error;

/// Errors raised while looking up schema descriptors or coercing values.
///
/// Every variant is fatal for the document being imported: an import that
/// hits one of these cannot produce a consistent record forest and is
/// abandoned rather than resumed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No schema is registered for the record type.
    #[error("Unknown record type '{0}'")]
    UnknownRecordType(String),

    /// The record type exists but does not declare the property.
    #[error("Schema lookup failed: record type '{record_type}' has no property '{property}'")]
    SchemaLookup {
        /// Record type that was searched.
        record_type: String,
        /// Property that was not found.
        property: String,
    },

    /// A raw value could not be coerced to the declared kind.
    #[error("Invalid value for {record_type}.{property} ({kind}): {value:?}")]
    InvalidValue {
        /// Record type owning the property.
        record_type: String,
        /// Property being assigned.
        property: String,
        /// Declared kind of the property.
        kind: String,
        /// Offending raw value.
        value: String,
    },

    /// A value of the wrong shape was assigned (e.g. text into a record slot).
    #[error("Type mismatch for {record_type}.{property}: expected {expected}, got {found}")]
    TypeMismatch {
        /// Record type owning the property.
        record_type: String,
        /// Property being assigned.
        property: String,
        /// Declared kind.
        expected: String,
        /// Kind of the supplied value.
        found: String,
    },

    /// The same record type was registered twice in one registry.
    #[error("Record type '{0}' is already registered")]
    DuplicateRecordType(String),
}

impl CoreError {
    /// Create a schema lookup error.
    #[inline]
    pub fn schema_lookup(record_type: impl Into<String>, property: impl Into<String>) -> Self {
        Self::SchemaLookup {
            record_type: record_type.into(),
            property: property.into(),
        }
    }

    /// Record type the error refers to, when there is one.
    pub fn record_type(&self) -> Option<&str> {
        match self {
            Self::UnknownRecordType(t) | Self::DuplicateRecordType(t) => Some(t),
            Self::SchemaLookup { record_type, .. }
            | Self::InvalidValue { record_type, .. }
            | Self::TypeMismatch { record_type, .. } => Some(record_type),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
