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

//! Value types stored in record properties.

use crate::record::RecordRef;
use std::fmt;

/// A property value held by a [`Record`](crate::Record).
///
/// Raw input handed to a property setter is usually a [`Value::String`]
/// carrying the text of a node or attribute; coercion turns it into the
/// canonical variant for the declared property kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text value.
    String(String),
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Normalized date (`YYYY`, `YYYY-MM` or `YYYY-MM-DD`).
    Date(String),
    /// Nested record.
    Record(RecordRef),
    /// List-valued property, in insertion order.
    List(Vec<Value>),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Date(_) => "date",
            Self::Record(_) => "record",
            Self::List(_) => "list",
        }
    }

    /// Try to get the value as a string slice (strings and dates).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Date(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get the value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a nested record.
    pub fn as_record(&self) -> Option<&RecordRef> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Try to get the value as a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) | Self::Date(s) => write!(f, "{}", s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Record(r) => write!(f, "<{}>", r.record_type()),
            Self::List(items) => write!(f, "[{} items]", items.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<RecordRef> for Value {
    fn from(r: RecordRef) -> Self {
        Self::Record(r)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Value {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) | Self::Date(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::Record(r) => r.serialize(serializer),
            Self::List(items) => serializer.collect_seq(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Record;

    #[test]
    fn test_accessors() {
        assert_eq!(Value::from("Foo").as_str(), Some("Foo"));
        assert_eq!(Value::Date("2020-01".to_string()).as_str(), Some("2020-01"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(7).as_int(), Some(7));
        assert_eq!(Value::Int(7).as_str(), None);
        assert!(Value::List(vec![]).as_list().is_some_and(|l| l.is_empty()));
    }

    #[test]
    fn test_display() {
        let date = RecordRef::new(Record::new("date"));
        assert_eq!(Value::Record(date).to_string(), "<date>");
        assert_eq!(Value::List(vec![Value::Int(1), Value::Int(2)]).to_string(), "[2 items]");
        assert_eq!(Value::Bool(false).to_string(), "false");
    }

    #[test]
    fn test_kind_name() {
        assert_eq!(Value::from("x").kind_name(), "string");
        assert_eq!(Value::Int(1).kind_name(), "integer");
        let r = RecordRef::new(Record::new("extent"));
        assert_eq!(Value::from(r).kind_name(), "record");
    }
}
