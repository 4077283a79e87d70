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

//! Value coercion.
//!
//! Pure functions turning raw textual values into the canonical in-memory
//! representation of a declared [`PropertyKind`].

use crate::error::CoreError;
use crate::schema::PropertyKind;
use crate::Value;

/// Why a raw value could not be coerced. Carries no record context; see
/// [`PropertyType::coerce`](crate::PropertyType::coerce).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CoercionFailure {
    Invalid { kind: String, value: String },
    Mismatch { expected: String, found: String },
}

impl CoercionFailure {
    pub(crate) fn into_error(self, record_type: &str, property: &str) -> CoreError {
        match self {
            Self::Invalid { kind, value } => CoreError::InvalidValue {
                record_type: record_type.to_string(),
                property: property.to_string(),
                kind,
                value,
            },
            Self::Mismatch { expected, found } => CoreError::TypeMismatch {
                record_type: record_type.to_string(),
                property: property.to_string(),
                expected,
                found,
            },
        }
    }
}

pub(crate) fn coerce(kind: &PropertyKind, raw: Value) -> Result<Value, CoercionFailure> {
    let mismatch = |raw: &Value| CoercionFailure::Mismatch {
        expected: kind.to_string(),
        found: raw.kind_name().to_string(),
    };
    let invalid = |text: &str| CoercionFailure::Invalid {
        kind: kind.to_string(),
        value: text.to_string(),
    };

    match kind {
        PropertyKind::String => match raw {
            Value::String(s) | Value::Date(s) => Ok(Value::String(s)),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::Int(n) => Ok(Value::String(n.to_string())),
            other => Err(mismatch(&other)),
        },
        PropertyKind::Boolean => match raw {
            Value::String(s) => Ok(Value::Bool(normalize_boolean(&s))),
            Value::Bool(b) => Ok(Value::Bool(b)),
            other => Err(mismatch(&other)),
        },
        PropertyKind::Integer => match raw {
            Value::String(s) => parse_integer(&s).map(Value::Int).ok_or_else(|| invalid(&s)),
            Value::Int(n) => Ok(Value::Int(n)),
            other => Err(mismatch(&other)),
        },
        PropertyKind::Date => match raw {
            Value::String(s) | Value::Date(s) => {
                normalize_date(&s).map(Value::Date).ok_or_else(|| invalid(&s))
            }
            other => Err(mismatch(&other)),
        },
        PropertyKind::Enum { values } => match raw {
            Value::String(s) => match_enum(values, &s)
                .map(|v| Value::String(v.to_string()))
                .ok_or_else(|| invalid(&s)),
            other => Err(mismatch(&other)),
        },
        PropertyKind::Record { record_type } => match raw {
            Value::Record(record) => match record_type {
                Some(expected) if record.record_type() != *expected => {
                    Err(CoercionFailure::Mismatch {
                        expected: kind.to_string(),
                        found: format!("record<{}>", record.record_type()),
                    })
                }
                _ => Ok(Value::Record(record)),
            },
            other => Err(mismatch(&other)),
        },
    }
}

/// Normalize a textual flag: `1`, `T`, `Y`, `YES` and `TRUE` (any case,
/// surrounding whitespace ignored) are true, everything else is false.
pub fn normalize_boolean(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_uppercase().as_str(),
        "1" | "T" | "Y" | "YES" | "TRUE"
    )
}

/// Parse a signed integer, ignoring surrounding whitespace.
pub fn parse_integer(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Validate and normalize a date in `YYYY`, `YYYY-MM` or `YYYY-MM-DD` form.
///
/// Month and day are range-checked (including leap years); the trimmed input
/// is returned unchanged when valid.
pub fn normalize_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut parts = trimmed.split('-');

    let year = parts.next().filter(|y| y.len() == 4).and_then(digits)?;
    let month = match parts.next() {
        Some(m) if m.len() == 2 => Some(digits(m).filter(|m| (1..=12).contains(m))?),
        Some(_) => return None,
        None => None,
    };
    let day = match parts.next() {
        Some(d) if d.len() == 2 && month.is_some() => Some(digits(d)?),
        Some(_) => return None,
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }

    if let (Some(month), Some(day)) = (month, day) {
        if day == 0 || day > days_in_month(year, month) {
            return None;
        }
    }

    Some(trimmed.to_string())
}

/// Match `raw` against an enumeration, case-insensitively.
///
/// Returns the canonical spelling from `values`.
pub fn match_enum<'a>(values: &'a [String], raw: &str) -> Option<&'a str> {
    let needle = raw.trim();
    values
        .iter()
        .find(|v| v.eq_ignore_ascii_case(needle))
        .map(String::as_str)
}

fn digits(s: &str) -> Option<u32> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

fn days_in_month(year: u32, month: u32) -> u32 {
    match month {
        2 if year % 4 == 0 && (year % 100 != 0 || year % 400 == 0) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}
