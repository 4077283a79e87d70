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

//! Record structure built by an import.

use crate::error::{CoreError, CoreResult};
use crate::schema::RecordSchema;
use crate::Value;
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A schema-typed structured object.
///
/// A record is identified by its `record_type` tag and holds a mapping from
/// property name to [`Value`]. Properties are only ever written through
/// [`Record::assign`], which consults the record's [`RecordSchema`] for the
/// declared kind and list-ness of the property.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    record_type: String,
    properties: BTreeMap<String, Value>,
}

/// Outcome of a successful [`Record::assign`].
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// A scalar property was set for the first time.
    Set,
    /// A value was appended to a list property, which now has `len` items.
    Appended { len: usize },
    /// A scalar property that was already set has been overwritten.
    Overwrote { previous: Value },
}

impl Assignment {
    /// True if the assignment replaced an existing scalar value.
    pub fn is_overwrite(&self) -> bool {
        matches!(self, Self::Overwrote { .. })
    }
}

impl Record {
    /// Create an empty record of the given type.
    pub fn new(record_type: impl Into<String>) -> Self {
        Self {
            record_type: record_type.into(),
            properties: BTreeMap::new(),
        }
    }

    /// The record's type tag.
    #[inline]
    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    /// Get a property value.
    #[inline]
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.properties.get(property)
    }

    /// True if the property has a value.
    #[inline]
    pub fn is_set(&self, property: &str) -> bool {
        self.properties.contains_key(property)
    }

    /// All set properties, ordered by name.
    pub fn properties(&self) -> &BTreeMap<String, Value> {
        &self.properties
    }

    /// Number of set properties.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// True if no property is set.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Coerce `raw` to the declared kind of `property` and store it.
    ///
    /// List-valued properties append the coerced value (creating the list on
    /// first use). Scalar properties are overwritten; the previous value is
    /// returned in [`Assignment::Overwrote`] so callers can report it.
    ///
    /// A stored record value is marked as attached (see
    /// [`RecordRef::is_attached`]).
    ///
    /// # Errors
    ///
    /// - [`CoreError::SchemaLookup`](crate::CoreError::SchemaLookup) if the
    ///   schema does not declare `property`.
    /// - [`CoreError::InvalidValue`](crate::CoreError::InvalidValue) or
    ///   [`CoreError::TypeMismatch`](crate::CoreError::TypeMismatch) if the
    ///   value cannot be coerced, or if a list property holds a non-list
    ///   value.
    pub fn assign(
        &mut self,
        schema: &RecordSchema,
        property: &str,
        raw: Value,
    ) -> CoreResult<Assignment> {
        let property_type = schema.property(property)?;
        let value = property_type.coerce(&self.record_type, property, raw)?;
        let child = value.as_record().cloned();

        let outcome = if property_type.is_list() {
            let slot = self
                .properties
                .entry(property.to_string())
                .or_insert_with(|| Value::List(Vec::new()));
            match slot {
                Value::List(items) => {
                    items.push(value);
                    Assignment::Appended { len: items.len() }
                }
                other => {
                    return Err(CoreError::TypeMismatch {
                        record_type: self.record_type.clone(),
                        property: property.to_string(),
                        expected: "list".to_string(),
                        found: other.kind_name().to_string(),
                    })
                }
            }
        } else {
            match self.properties.insert(property.to_string(), value) {
                Some(previous) => Assignment::Overwrote { previous },
                None => Assignment::Set,
            }
        };

        if let Some(child) = child {
            child.mark_attached();
        }
        Ok(outcome)
    }

    /// Fill every unset property that has a declared default.
    ///
    /// Returns the number of properties filled.
    pub fn apply_defaults(&mut self, schema: &RecordSchema) -> CoreResult<usize> {
        let mut filled = 0;
        for (property, raw) in schema.defaults() {
            if !self.is_set(property) {
                self.assign(schema, property, Value::String(raw.clone()))?;
                filled += 1;
            }
        }
        Ok(filled)
    }
}

/// Shared handle to a [`Record`] under construction.
///
/// While an import runs, the same record is reachable from the context stack,
/// from discharge actions waiting to write into it, and (once attached) from
/// its parent's property map. All of that happens on a single thread, so the
/// handle is a reference-counted cell.
#[derive(Clone, Default)]
pub struct RecordRef(Rc<RecordCell>);

#[derive(Default)]
struct RecordCell {
    record: RefCell<Record>,
    attached: Cell<bool>,
}

impl RecordRef {
    /// Wrap a record in a new handle.
    pub fn new(record: Record) -> Self {
        Self(Rc::new(RecordCell {
            record: RefCell::new(record),
            attached: Cell::new(false),
        }))
    }

    /// Create a handle to an empty record of the given type.
    pub fn of_type(record_type: impl Into<String>) -> Self {
        Self::new(Record::new(record_type))
    }

    /// Borrow the record.
    ///
    /// # Panics
    ///
    /// Panics if the record is currently mutably borrowed.
    #[inline]
    pub fn borrow(&self) -> Ref<'_, Record> {
        self.0.record.borrow()
    }

    /// Mutably borrow the record.
    ///
    /// # Panics
    ///
    /// Panics if the record is currently borrowed.
    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, Record> {
        self.0.record.borrow_mut()
    }

    /// The record's type tag.
    pub fn record_type(&self) -> String {
        self.0.record.borrow().record_type.clone()
    }

    /// Clone a property value out of the record.
    pub fn get(&self, property: &str) -> Option<Value> {
        self.0.record.borrow().get(property).cloned()
    }

    /// True if both handles point at the same record.
    #[inline]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    /// True once the record has been stored in a property of another record.
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.0.attached.get()
    }

    fn mark_attached(&self) {
        self.0.attached.set(true);
    }

    /// Take the record out of the handle if this is the last reference,
    /// otherwise clone it.
    pub fn into_record(self) -> Record {
        match Rc::try_unwrap(self.0) {
            Ok(cell) => cell.record.into_inner(),
            Err(shared) => shared.record.borrow().clone(),
        }
    }
}

impl PartialEq for RecordRef {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other) || *self.0.record.borrow() == *other.0.record.borrow()
    }
}

impl fmt::Debug for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.record.try_borrow() {
            Ok(record) => record.fmt(f),
            Err(_) => f.write_str("RecordRef(<borrowed>)"),
        }
    }
}

impl From<Record> for RecordRef {
    fn from(record: Record) -> Self {
        Self::new(record)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Record {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.properties.len() + 1))?;
        map.serialize_entry("record_type", &self.record_type)?;
        for (property, value) in &self.properties {
            map.serialize_entry(property, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.record.try_borrow() {
            Ok(record) => record.serialize(serializer),
            Err(_) => Err(serde::ser::Error::custom("record is being modified")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PropertyType;
    use crate::CoreError;

    fn accession_schema() -> RecordSchema {
        RecordSchema::builder("accession")
            .property("title", PropertyType::string())
            .property("publish", PropertyType::boolean())
            .property("dates", PropertyType::record("date").list())
            .property("general_note", PropertyType::string())
            .default_value("general_note", "none")
            .build()
    }

    #[test]
    fn test_scalar_set_then_overwrite() {
        let schema = accession_schema();
        let mut record = Record::new("accession");

        let first = record.assign(&schema, "title", "Foo".into()).unwrap();
        assert_eq!(first, Assignment::Set);

        let second = record.assign(&schema, "title", "Bar".into()).unwrap();
        assert_eq!(
            second,
            Assignment::Overwrote {
                previous: Value::String("Foo".to_string())
            }
        );
        assert_eq!(record.get("title"), Some(&Value::String("Bar".to_string())));
    }

    #[test]
    fn test_list_append_keeps_order() {
        let schema = accession_schema();
        let mut record = Record::new("accession");
        let d1 = RecordRef::of_type("date");
        let d2 = RecordRef::of_type("date");

        record.assign(&schema, "dates", d1.clone().into()).unwrap();
        let outcome = record.assign(&schema, "dates", d2.clone().into()).unwrap();
        assert_eq!(outcome, Assignment::Appended { len: 2 });

        let dates = record.get("dates").and_then(Value::as_list).unwrap();
        assert!(RecordRef::ptr_eq(dates[0].as_record().unwrap(), &d1));
        assert!(RecordRef::ptr_eq(dates[1].as_record().unwrap(), &d2));
    }

    #[test]
    fn test_list_property_holding_scalar_is_rejected() {
        let schema = accession_schema();
        let mut record = Record::new("accession");
        record
            .properties
            .insert("dates".to_string(), Value::String("2020".to_string()));

        let err = record
            .assign(&schema, "dates", RecordRef::of_type("date").into())
            .unwrap_err();
        assert!(matches!(err, CoreError::TypeMismatch { ref expected, .. } if expected == "list"));
        assert_eq!(record.get("dates"), Some(&Value::String("2020".to_string())));
    }

    #[test]
    fn test_stored_record_is_attached() {
        let schema = accession_schema();
        let mut record = Record::new("accession");
        let date = RecordRef::of_type("date");
        let kept = date.clone();
        assert!(!kept.is_attached());

        record.assign(&schema, "dates", date.into()).unwrap();
        assert!(kept.is_attached());
    }

    #[test]
    fn test_extra_handles_do_not_attach() {
        let date = RecordRef::of_type("date");
        let _pending = date.clone();
        assert!(!date.is_attached());
    }

    #[test]
    fn test_unknown_property_is_schema_lookup_error() {
        let schema = accession_schema();
        let mut record = Record::new("accession");
        let err = record.assign(&schema, "titel", "Foo".into()).unwrap_err();
        assert_eq!(err, CoreError::schema_lookup("accession", "titel"));
        assert!(record.is_empty());
    }

    #[test]
    fn test_coercion_applied_on_assign() {
        let schema = accession_schema();
        let mut record = Record::new("accession");
        record.assign(&schema, "publish", "yes".into()).unwrap();
        assert_eq!(record.get("publish"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_apply_defaults_only_fills_unset() {
        let schema = accession_schema();
        let mut record = Record::new("accession");
        assert_eq!(record.apply_defaults(&schema).unwrap(), 1);
        assert_eq!(record.get("general_note").and_then(Value::as_str), Some("none"));

        let mut noted = Record::new("accession");
        noted.assign(&schema, "general_note", "fragile".into()).unwrap();
        assert_eq!(noted.apply_defaults(&schema).unwrap(), 0);
        assert_eq!(noted.get("general_note").and_then(Value::as_str), Some("fragile"));
    }

    #[test]
    fn test_record_ref_shares_mutations() {
        let handle = RecordRef::of_type("accession");
        let alias = handle.clone();
        let schema = accession_schema();
        alias.borrow_mut().assign(&schema, "title", "Shared".into()).unwrap();
        assert_eq!(handle.get("title"), Some(Value::String("Shared".to_string())));
        assert!(RecordRef::ptr_eq(&handle, &alias));
    }

    #[test]
    fn test_into_record_unwraps_or_clones() {
        let handle = RecordRef::of_type("extent");
        let keep = handle.clone();
        let cloned = handle.into_record();
        assert_eq!(cloned.record_type(), "extent");
        assert_eq!(keep.into_record().record_type(), "extent");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_nested_record() {
        let schema = accession_schema();
        let date_schema = RecordSchema::builder("date")
            .property("begin", PropertyType::date())
            .build();

        let date = RecordRef::of_type("date");
        date.borrow_mut().assign(&date_schema, "begin", "2020".into()).unwrap();
        let accession = RecordRef::of_type("accession");
        accession.borrow_mut().assign(&schema, "title", "Foo".into()).unwrap();
        accession.borrow_mut().assign(&schema, "dates", date.into()).unwrap();

        let json = serde_json::to_value(&accession).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "record_type": "accession",
                "title": "Foo",
                "dates": [{ "record_type": "date", "begin": "2020" }]
            })
        );
    }
}
