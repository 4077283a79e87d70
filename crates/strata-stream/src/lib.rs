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

//! Streaming XML Record Import
//!
//! This crate turns a stream of XML node events into a forest of typed
//! records. Handlers registered per element name open records, look up
//! ancestors, and assign properties; values that appear later in the stream
//! (the text of the element, a nested record still being built) are wired up
//! through proxies that are filled in when the value arrives.
//!
//! # Features
//!
//! - **Streaming**: one event at a time, memory bounded by nesting depth
//! - **Deferred values**: FIFO proxies for text and completed records
//! - **Typed records**: schema-checked properties with coercion
//! - **Iterator-based**: top-level records are yielded as soon as they close
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::fs::File;
//! use strata_core::{PropertyType, RecordSchema, SchemaRegistry};
//! use strata_stream::{HandlerTable, ImportConfig, Importer};
//!
//! let schema = SchemaRegistry::new()
//!     .with(
//!         RecordSchema::builder("accession")
//!             .property("title", PropertyType::string())
//!             .property("publish", PropertyType::boolean())
//!             .default_value("publish", "false")
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let handlers = HandlerTable::builder()
//!     .on("record", |scope, _| scope.open("accession").map(|_| ()))
//!     .on("title", |scope, _| {
//!         let text = scope.inner_text();
//!         scope.set_context_property("title", text)
//!     })
//!     .build()
//!     .unwrap();
//!
//! let file = File::open("accessions.xml").unwrap();
//! let importer = Importer::from_reader(file, schema, handlers, ImportConfig::default());
//!
//! for record in importer {
//!     match record {
//!         Ok(record) => println!("{:?}", record),
//!         Err(e) => {
//!             eprintln!("Error: {}", e);
//!             break;
//!         }
//!     }
//! }
//! ```
//!
//! # Text proxies
//!
//! Text proxies are matched to text nodes by order alone. A handler that asks
//! for [`ImportScope::inner_text`] on an element with no text content will
//! receive the next text node in the stream, wherever it is.

mod config;
mod context;
mod diagnostics;
mod error;
mod event;
mod handler;
mod importer;
mod proxy;
mod reader;
mod scope;

pub use config::ImportConfig;
pub use context::{ClosedRecord, ContextStack, DepthIndex};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{ImportError, ImportResult};
pub use event::{ElementNode, NodeEvent};
pub use handler::{Handler, HandlerTable, HandlerTableBuilder};
pub use importer::{ImportOutcome, ImportStats, Importer};
pub use proxy::{DischargeAction, Proxy, ProxyKey, ProxyOrigin, ProxyRegistry, UndischargedProxy};
pub use reader::{events, EventSource, IterEvents, XmlEventReader};
pub use scope::{ImportScope, PropertyValue};

/// Re-export core types for convenience.
pub use strata_core::{RecordRef, Value};
