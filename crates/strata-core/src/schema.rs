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

//! Schema descriptors for record types.
//!
//! A [`SchemaRegistry`] is loaded once before an import and queried by name
//! for every property assignment. Each [`RecordSchema`] declares the
//! properties a record type accepts, their [`PropertyKind`], whether they are
//! list-valued, and optional raw default values applied when the record
//! closes.
//!
//! # Examples
//!
//! ```rust
//! use strata_core::{PropertyType, RecordSchema, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         RecordSchema::builder("accession")
//!             .property("title", PropertyType::string())
//!             .property("dates", PropertyType::record("date").list())
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let dates = registry.property_type("accession", "dates").unwrap();
//! assert!(dates.is_list());
//! assert!(registry.property_type("accession", "nope").is_err());
//! ```
//!
//! With the `serde` feature the registry can be read from JSON:
//!
//! ```text
//! {
//!   "accession": {
//!     "properties": {
//!       "title": { "type": "string" },
//!       "dates": { "type": "record", "record_type": "date", "list": true }
//!     },
//!     "defaults": { "title": "Untitled" }
//!   }
//! }
//! ```

use crate::coerce;
use crate::error::{CoreError, CoreResult};
use crate::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Declared scalar kind of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum PropertyKind {
    /// Free text.
    String,
    /// Boolean, normalized from `1/T/Y/YES/TRUE`.
    Boolean,
    /// Signed integer.
    Integer,
    /// Date in `YYYY`, `YYYY-MM` or `YYYY-MM-DD` form.
    Date,
    /// One of a closed set of values, matched case-insensitively.
    Enum {
        /// Canonical values.
        values: Vec<String>,
    },
    /// Nested record, optionally restricted to one record type.
    Record {
        /// Required record type, if any.
        #[cfg_attr(feature = "serde", serde(default))]
        record_type: Option<String>,
    },
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::Date => write!(f, "date"),
            Self::Enum { .. } => write!(f, "enum"),
            Self::Record { record_type: None } => write!(f, "record"),
            Self::Record {
                record_type: Some(t),
            } => write!(f, "record<{}>", t),
        }
    }
}

/// Declared type of a property: a kind plus list-ness.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct PropertyType {
    /// Scalar kind of the property (or of each list element).
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub kind: PropertyKind,
    /// True if the property holds a list.
    #[cfg_attr(feature = "serde", serde(default))]
    pub list: bool,
}

impl PropertyType {
    /// Scalar of the given kind.
    pub fn new(kind: PropertyKind) -> Self {
        Self { kind, list: false }
    }

    /// Free-text property.
    pub fn string() -> Self {
        Self::new(PropertyKind::String)
    }

    /// Boolean property.
    pub fn boolean() -> Self {
        Self::new(PropertyKind::Boolean)
    }

    /// Integer property.
    pub fn integer() -> Self {
        Self::new(PropertyKind::Integer)
    }

    /// Date property.
    pub fn date() -> Self {
        Self::new(PropertyKind::Date)
    }

    /// Enumerated property.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(PropertyKind::Enum {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// Nested record of the given type.
    pub fn record(record_type: impl Into<String>) -> Self {
        Self::new(PropertyKind::Record {
            record_type: Some(record_type.into()),
        })
    }

    /// Nested record of any type.
    pub fn any_record() -> Self {
        Self::new(PropertyKind::Record { record_type: None })
    }

    /// Turn this type into a list of the same kind.
    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    /// True if the property holds a list.
    #[inline]
    pub fn is_list(&self) -> bool {
        self.list
    }

    /// Coerce a raw value to this type's kind.
    ///
    /// `record_type` and `property` are only used to build error messages.
    pub fn coerce(&self, record_type: &str, property: &str, raw: Value) -> CoreResult<Value> {
        coerce::coerce(&self.kind, raw).map_err(|failure| failure.into_error(record_type, property))
    }
}

/// Schema descriptor for one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    record_type: String,
    properties: BTreeMap<String, PropertyType>,
    defaults: BTreeMap<String, String>,
}

impl RecordSchema {
    /// Start building a schema for `record_type`.
    pub fn builder(record_type: impl Into<String>) -> RecordSchemaBuilder {
        RecordSchemaBuilder {
            schema: RecordSchema {
                record_type: record_type.into(),
                properties: BTreeMap::new(),
                defaults: BTreeMap::new(),
            },
        }
    }

    /// The record type this schema describes.
    #[inline]
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Look up a property's declared type.
    pub fn property(&self, name: &str) -> CoreResult<&PropertyType> {
        self.properties
            .get(name)
            .ok_or_else(|| CoreError::schema_lookup(&self.record_type, name))
    }

    /// All declared properties.
    pub fn properties(&self) -> &BTreeMap<String, PropertyType> {
        &self.properties
    }

    /// Raw default values keyed by property.
    pub fn defaults(&self) -> &BTreeMap<String, String> {
        &self.defaults
    }
}

/// Builder for [`RecordSchema`].
#[derive(Debug, Clone)]
pub struct RecordSchemaBuilder {
    schema: RecordSchema,
}

impl RecordSchemaBuilder {
    /// Declare a property.
    pub fn property(mut self, name: impl Into<String>, property_type: PropertyType) -> Self {
        self.schema.properties.insert(name.into(), property_type);
        self
    }

    /// Declare a raw default for a property, applied at close if unset.
    pub fn default_value(mut self, name: impl Into<String>, raw: impl Into<String>) -> Self {
        self.schema.defaults.insert(name.into(), raw.into());
        self
    }

    /// Finish the schema.
    pub fn build(self) -> RecordSchema {
        self.schema
    }
}

/// All record schemas known to an import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, RecordSchema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateRecordType`] if the type is already known.
    pub fn register(&mut self, schema: RecordSchema) -> CoreResult<()> {
        if self.schemas.contains_key(&schema.record_type) {
            return Err(CoreError::DuplicateRecordType(schema.record_type));
        }
        self.schemas.insert(schema.record_type.clone(), schema);
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, schema: RecordSchema) -> CoreResult<Self> {
        self.register(schema)?;
        Ok(self)
    }

    /// Get the schema for a record type.
    pub fn get(&self, record_type: &str) -> CoreResult<&RecordSchema> {
        self.schemas
            .get(record_type)
            .ok_or_else(|| CoreError::UnknownRecordType(record_type.to_string()))
    }

    /// True if the record type is registered.
    #[inline]
    pub fn contains(&self, record_type: &str) -> bool {
        self.schemas.contains_key(record_type)
    }

    /// Look up the declared type of `record_type.property`.
    pub fn property_type(&self, record_type: &str, property: &str) -> CoreResult<&PropertyType> {
        self.get(record_type)?.property(property)
    }

    /// Registered record types, in name order.
    pub fn record_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Number of registered record types.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(feature = "serde")]
mod descriptor {
    use super::{PropertyType, RecordSchema, SchemaRegistry};
    use serde::{Deserialize, Deserializer};
    use std::collections::BTreeMap;

    #[derive(Deserialize)]
    #[serde(deny_unknown_fields)]
    struct RecordDescriptor {
        #[serde(default)]
        properties: BTreeMap<String, PropertyType>,
        #[serde(default)]
        defaults: BTreeMap<String, String>,
    }

    impl<'de> Deserialize<'de> for SchemaRegistry {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let descriptors = BTreeMap::<String, RecordDescriptor>::deserialize(deserializer)?;
            let mut registry = SchemaRegistry::new();
            for (record_type, descriptor) in descriptors {
                for property in descriptor.defaults.keys() {
                    if !descriptor.properties.contains_key(property) {
                        return Err(serde::de::Error::custom(format!(
                            "default for undeclared property {}.{}",
                            record_type, property
                        )));
                    }
                }
                let schema = RecordSchema {
                    record_type: record_type.clone(),
                    properties: descriptor.properties,
                    defaults: descriptor.defaults,
                };
                registry
                    .register(schema)
                    .map_err(<D::Error as serde::de::Error>::custom)?;
            }
            Ok(registry)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with(
                RecordSchema::builder("date")
                    .property("begin", PropertyType::date())
                    .property("label", PropertyType::enumeration(["creation", "other"]))
                    .default_value("label", "other")
                    .build(),
            )
            .unwrap()
    }

    #[test]
    fn test_property_lookup() {
        let registry = registry();
        assert_eq!(
            registry.property_type("date", "begin").unwrap(),
            &PropertyType::date()
        );
        assert_eq!(
            registry.property_type("date", "end").unwrap_err(),
            CoreError::schema_lookup("date", "end")
        );
        assert_eq!(
            registry.property_type("event", "begin").unwrap_err(),
            CoreError::UnknownRecordType("event".to_string())
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = registry();
        let err = registry
            .with(RecordSchema::builder("date").build())
            .unwrap_err();
        assert_eq!(err, CoreError::DuplicateRecordType("date".to_string()));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(PropertyType::record("date").kind.to_string(), "record<date>");
        assert_eq!(PropertyType::any_record().kind.to_string(), "record");
        assert_eq!(PropertyType::enumeration(["a"]).kind.to_string(), "enum");
    }

    #[test]
    fn test_list_builder() {
        let ty = PropertyType::string().list();
        assert!(ty.is_list());
        assert_eq!(ty.kind, PropertyKind::String);
    }

    #[test]
    fn test_record_types_sorted() {
        let registry = registry()
            .with(RecordSchema::builder("accession").build())
            .unwrap();
        let types: Vec<_> = registry.record_types().collect();
        assert_eq!(types, vec!["accession", "date"]);
        assert_eq!(registry.len(), 2);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_registry() {
        let json = r#"{
            "accession": {
                "properties": {
                    "title": { "type": "string" },
                    "dates": { "type": "record", "record_type": "date", "list": true },
                    "acquisition_type": { "type": "enum", "values": ["deposit", "gift"] }
                },
                "defaults": { "title": "Untitled" }
            },
            "date": {
                "properties": { "begin": { "type": "date" } }
            }
        }"#;
        let registry: SchemaRegistry = serde_json::from_str(json).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.property_type("accession", "dates").unwrap(),
            &PropertyType::record("date").list()
        );
        assert_eq!(
            registry.get("accession").unwrap().defaults().get("title"),
            Some(&"Untitled".to_string())
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_rejects_default_for_unknown_property() {
        let json = r#"{ "date": { "properties": {}, "defaults": { "begin": "2020" } } }"#;
        let result: Result<SchemaRegistry, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
