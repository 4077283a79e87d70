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

//! Record model, schema descriptors and value coercion for Strata imports.
//!
//! This crate holds the data side of an import: the [`Record`]s an import
//! builds, the [`SchemaRegistry`] describing which properties each record type
//! accepts, and the coercion rules turning raw text into typed [`Value`]s.
//! The streaming engine itself lives in `strata-stream`.
//!
//! # Example
//!
//! ```rust
//! use strata_core::{PropertyType, Record, RecordSchema, Value};
//!
//! let schema = RecordSchema::builder("accession")
//!     .property("title", PropertyType::string())
//!     .property("publish", PropertyType::boolean())
//!     .build();
//!
//! let mut record = Record::new("accession");
//! record.assign(&schema, "title", "Foo".into()).unwrap();
//! record.assign(&schema, "publish", "Y".into()).unwrap();
//!
//! assert_eq!(record.get("publish"), Some(&Value::Bool(true)));
//! ```
//!
//! # Features
//!
//! - `serde`: `Serialize` for records and values, `Deserialize` for
//!   [`SchemaRegistry`].

pub mod coerce;
mod error;
mod record;
mod schema;
mod value;

pub use error::{CoreError, CoreResult};
pub use record::{Assignment, Record, RecordRef};
pub use schema::{PropertyKind, PropertyType, RecordSchema, RecordSchemaBuilder, SchemaRegistry};
pub use value::Value;
