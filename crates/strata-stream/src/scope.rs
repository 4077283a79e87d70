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

//! The API handlers use to build records.
//!
//! An [`ImportScope`] is handed to each handler together with the element's
//! open event. It exposes the context stack (open records, ancestor lookup),
//! the proxy registry (deferred values), and property assignment with schema
//! coercion. Assigning a [`Proxy`] defers the write until the proxy is
//! discharged.

use crate::context::ContextStack;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ImportError, ImportResult};
use crate::proxy::{Proxy, ProxyKey, ProxyOrigin, ProxyRegistry};
use std::sync::Arc;
use strata_core::{Assignment, RecordRef, SchemaRegistry, Value};
use tracing::warn;

/// A value to assign: either known now or deferred behind a proxy.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    /// Known value.
    Value(Value),
    /// Value delivered when the proxy is discharged.
    Proxy(Proxy),
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Proxy> for PropertyValue {
    fn from(proxy: Proxy) -> Self {
        Self::Proxy(proxy)
    }
}

impl From<&Proxy> for PropertyValue {
    fn from(proxy: &Proxy) -> Self {
        Self::Proxy(proxy.clone())
    }
}

impl From<RecordRef> for PropertyValue {
    fn from(record: RecordRef) -> Self {
        Self::Value(Value::Record(record))
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::Value(Value::from(s))
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::Value(Value::String(s))
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Value(Value::Bool(b))
    }
}

impl From<i64> for PropertyValue {
    fn from(n: i64) -> Self {
        Self::Value(Value::Int(n))
    }
}

/// Handler-facing view of one import, scoped to the element being handled.
pub struct ImportScope<'a> {
    pub(crate) stack: &'a mut ContextStack,
    pub(crate) proxies: &'a mut ProxyRegistry,
    pub(crate) schema: &'a Arc<SchemaRegistry>,
    pub(crate) diagnostics: &'a Diagnostics,
    pub(crate) element: &'a str,
    pub(crate) depth: usize,
    pub(crate) occurrence: u64,
}

impl<'a> ImportScope<'a> {
    /// Name of the element being handled.
    pub fn element(&self) -> &str {
        self.element
    }

    /// Depth of the element being handled.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Open a new record of `record_type`, owned by the current element.
    ///
    /// The record is closed when the current element closes.
    ///
    /// # Errors
    ///
    /// Fails if `record_type` is not in the schema, or if the element's
    /// (name, depth) slot belongs to another occurrence that is still open.
    pub fn open(&mut self, record_type: &str) -> ImportResult<RecordRef> {
        self.schema.get(record_type)?;
        self.stack
            .open(record_type, self.element, self.depth, self.occurrence)
    }

    /// Assign `value` to `property` of `target`.
    ///
    /// A proxy value defers the assignment until the proxy is discharged; the
    /// property is still checked against the schema now.
    ///
    /// # Errors
    ///
    /// Unknown properties fail immediately. Coercion failures fail
    /// immediately for known values and at discharge time for proxies.
    pub fn set_property(
        &mut self,
        target: &RecordRef,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> ImportResult<()> {
        let record_type = target.record_type();
        self.schema.property_type(&record_type, property)?;

        match value.into() {
            PropertyValue::Value(value) => {
                assign(self.schema, self.diagnostics, target, property, value)
            }
            PropertyValue::Proxy(proxy) => {
                let schema = Arc::clone(self.schema);
                let diagnostics = self.diagnostics.clone();
                let target = target.clone();
                let property = property.to_string();
                proxy.on_discharge(move |value| {
                    assign(&schema, &diagnostics, &target, &property, value)
                })
            }
        }
    }

    /// Assign to the context record.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::MissingTarget`] if no record is open.
    pub fn set_context_property(
        &mut self,
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> ImportResult<()> {
        let target = self
            .context_record()
            .ok_or_else(|| self.missing_target(property))?;
        self.set_property(&target, property, value)
    }

    /// Assign to the nearest ancestor whose type is in `types`.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::MissingTarget`] if there is no such ancestor.
    pub fn set_ancestor_property(
        &mut self,
        types: &[&str],
        property: &str,
        value: impl Into<PropertyValue>,
    ) -> ImportResult<()> {
        let target = self
            .ancestor_of(types)
            .ok_or_else(|| self.missing_target(property))?;
        self.set_property(&target, property, value)
    }

    /// Proxy for the next completed record of `record_type`.
    pub fn proxy_for(&mut self, record_type: &str) -> Proxy {
        self.proxies
            .proxy_for(ProxyKey::record(record_type), self.origin())
    }

    /// Proxy for the next text node.
    ///
    /// Text proxies are discharged in request order by text nodes in stream
    /// order, whichever element those belong to.
    pub fn inner_text(&mut self) -> Proxy {
        self.proxies.proxy_for(ProxyKey::Text, self.origin())
    }

    /// Nearest open record whose type is in `types`, skipping records opened
    /// by the current element.
    pub fn ancestor_of(&self, types: &[&str]) -> Option<RecordRef> {
        self.stack.ancestor_of(types, self.element, self.depth)
    }

    /// The innermost open record.
    pub fn context_record(&self) -> Option<RecordRef> {
        self.stack.current().cloned()
    }

    /// Type of the innermost open record.
    pub fn context_type(&self) -> Option<&str> {
        self.stack.current_type()
    }

    /// Schema registry of this import.
    pub fn schema(&self) -> &SchemaRegistry {
        self.schema
    }

    fn origin(&self) -> ProxyOrigin {
        ProxyOrigin::new(self.element, self.depth)
    }

    fn missing_target(&self, property: &str) -> ImportError {
        ImportError::MissingTarget {
            element: self.element.to_string(),
            property: property.to_string(),
        }
    }
}

/// Coerce and store `value`, reporting overwritten scalars.
fn assign(
    schema: &SchemaRegistry,
    diagnostics: &Diagnostics,
    target: &RecordRef,
    property: &str,
    value: Value,
) -> ImportResult<()> {
    if let Value::Record(child) = &value {
        if RecordRef::ptr_eq(child, target) {
            return Err(ImportError::config(format!(
                "record '{}' cannot be assigned to its own property '{}'",
                target.record_type(),
                property
            )));
        }
    }

    let record_type = target.record_type();
    let record_schema = schema.get(&record_type)?;
    let outcome = target.borrow_mut().assign(record_schema, property, value)?;

    if let Assignment::Overwrote { previous } = outcome {
        let current = target
            .get(property)
            .map(|v| v.to_string())
            .unwrap_or_default();
        warn!(
            record_type = %record_type,
            property = %property,
            previous = %previous,
            current = %current,
            "Setting a property that has already been set"
        );
        diagnostics.push(Diagnostic::DuplicateAssignment {
            record_type,
            property: property.to_string(),
            previous: previous.to_string(),
            current,
        });
    }
    Ok(())
}
