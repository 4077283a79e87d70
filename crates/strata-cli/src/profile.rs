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

//! Declarative import profiles.
//!
//! A profile is a JSON description of the element handlers for an import, so
//! the CLI can drive the engine without compiled-in handlers:
//!
//! ```json
//! {
//!   "elements": {
//!     "record": { "open": [{ "type": "accession" }] },
//!     "title":  { "set": [{ "property": "title", "value": "text" }] },
//!     "date": {
//!       "open": [{ "type": "date", "attach": { "to": ["accession"], "property": "dates" } }],
//!       "set":  [{ "property": "label", "value": { "attribute_lowercase": "type" } }]
//!     }
//!   }
//! }
//! ```
//!
//! For each element, `open` rules run first (in order), then `set` rules. An
//! `attach` requests a proxy for the new record and assigns it to the nearest
//! ancestor of one of the listed types, so the record lands there once it
//! closes. A `set` rule targets the context record by default, or
//! `{"ancestor": [types...]}`.
//!
//! Profiles are checked against the schema before any input is read.

use crate::error::CliError;
use serde::Deserialize;
use std::collections::BTreeMap;
use strata_core::SchemaRegistry;
use strata_stream::{ElementNode, HandlerTable, ImportResult, ImportScope, PropertyValue};

/// A complete profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    /// Rules per element name.
    pub elements: BTreeMap<String, ElementRule>,
}

/// What to do when an element opens.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementRule {
    /// Records to open.
    #[serde(default)]
    pub open: Vec<OpenRule>,
    /// Properties to set.
    #[serde(default)]
    pub set: Vec<SetRule>,
}

/// Open a record, optionally attaching it to an ancestor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OpenRule {
    /// Record type to open.
    #[serde(rename = "type")]
    pub record_type: String,
    /// Where the completed record goes.
    #[serde(default)]
    pub attach: Option<AttachRule>,
}

/// Attach a completed record to the nearest matching ancestor.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachRule {
    /// Candidate ancestor types.
    pub to: Vec<String>,
    /// Property of the ancestor receiving the record.
    pub property: String,
}

/// Set one property.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetRule {
    /// Record receiving the value.
    #[serde(default)]
    pub target: Target,
    /// Property name.
    pub property: String,
    /// Where the value comes from.
    pub value: ValueSource,
}

/// Record a [`SetRule`] writes to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// The innermost open record.
    #[default]
    Context,
    /// The nearest open record of one of these types.
    Ancestor(Vec<String>),
}

/// Source of a [`SetRule`] value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    /// The element's text, delivered through a text proxy.
    Text,
    /// An attribute value as written. Skipped if absent.
    Attribute(String),
    /// An attribute value lower-cased. Skipped if absent.
    AttributeLowercase(String),
    /// A fixed value.
    Literal(String),
}

impl Profile {
    /// Parse a profile from JSON.
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        serde_json::from_str(json).map_err(|e| CliError::profile(e.to_string()))
    }

    /// Check every record type and property the profile names against
    /// `schema`.
    ///
    /// # Errors
    ///
    /// Returns [`CliError::Profile`] listing every problem found.
    pub fn validate(&self, schema: &SchemaRegistry) -> Result<(), CliError> {
        let mut problems = Vec::new();

        for (element, rule) in &self.elements {
            for open in &rule.open {
                if !schema.contains(&open.record_type) {
                    problems.push(format!(
                        "<{}> opens unknown record type '{}'",
                        element, open.record_type
                    ));
                }
                if let Some(attach) = &open.attach {
                    if attach.to.is_empty() {
                        problems.push(format!("<{}> attaches to no ancestor type", element));
                    }
                    for ancestor in &attach.to {
                        if let Err(e) = schema.property_type(ancestor, &attach.property) {
                            problems.push(format!("<{}> attach: {}", element, e));
                        }
                    }
                }
            }

            for set in &rule.set {
                match &set.target {
                    Target::Context => {
                        // Only checkable when the element opens the record itself.
                        if let Some(last) = rule.open.last() {
                            if let Err(e) = schema.property_type(&last.record_type, &set.property) {
                                problems.push(format!("<{}> set: {}", element, e));
                            }
                        }
                    }
                    Target::Ancestor(types) => {
                        if types.is_empty() {
                            problems.push(format!("<{}> sets on no ancestor type", element));
                        }
                        for ancestor in types {
                            if let Err(e) = schema.property_type(ancestor, &set.property) {
                                problems.push(format!("<{}> set: {}", element, e));
                            }
                        }
                    }
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CliError::profile(problems.join("; ")))
        }
    }

    /// Validate against `schema` and compile into a handler table.
    pub fn into_handlers(self, schema: &SchemaRegistry) -> Result<HandlerTable, CliError> {
        self.validate(schema)?;

        self.elements
            .into_iter()
            .fold(HandlerTable::builder(), |builder, (element, rule)| {
                builder.on(element, move |scope, node| apply(&rule, scope, node))
            })
            .build()
            .map_err(|e| CliError::profile(e.to_string()))
    }
}

fn apply(rule: &ElementRule, scope: &mut ImportScope<'_>, node: &ElementNode) -> ImportResult<()> {
    for open in &rule.open {
        if let Some(attach) = &open.attach {
            let proxy = scope.proxy_for(&open.record_type);
            let to: Vec<&str> = attach.to.iter().map(String::as_str).collect();
            scope.set_ancestor_property(&to, &attach.property, proxy)?;
        }
        scope.open(&open.record_type)?;
    }

    for set in &rule.set {
        let value: PropertyValue = match &set.value {
            ValueSource::Text => scope.inner_text().into(),
            ValueSource::Attribute(name) => match node.attribute(name) {
                Some(raw) => raw.into(),
                None => continue,
            },
            ValueSource::AttributeLowercase(name) => match node.attribute_lowercase(name) {
                Some(raw) => raw.into(),
                None => continue,
            },
            ValueSource::Literal(raw) => raw.as_str().into(),
        };

        match &set.target {
            Target::Context => scope.set_context_property(&set.property, value)?,
            Target::Ancestor(types) => {
                let types: Vec<&str> = types.iter().map(String::as_str).collect();
                scope.set_ancestor_property(&types, &set.property, value)?;
            }
        }
    }
    Ok(())
}
