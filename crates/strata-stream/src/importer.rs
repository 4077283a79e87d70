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

//! The stream driver.
//!
//! [`Importer`] pulls events from an [`EventSource`] one at a time and
//! dispatches them:
//!
//! - **Open**: the handler registered for the element name runs with an
//!   [`ImportScope`](crate::ImportScope). Elements without a handler are
//!   ignored.
//! - **Text**: the oldest pending text proxy is discharged with the text.
//!   Text nobody asked for is dropped.
//! - **Close**: every record the matching open event created is closed,
//!   innermost first. Closed records that no proxy claims are emitted as
//!   top-level output.
//!
//! Each event is dropped once dispatched, so memory stays proportional to the
//! nesting depth plus whatever the handlers keep in records and proxies.
//!
//! # Examples
//!
//! ```rust
//! use strata_core::{PropertyType, RecordSchema, SchemaRegistry, Value};
//! use strata_stream::{HandlerTable, ImportConfig, Importer};
//!
//! let schema = SchemaRegistry::new()
//!     .with(
//!         RecordSchema::builder("accession")
//!             .property("title", PropertyType::string())
//!             .build(),
//!     )
//!     .unwrap();
//!
//! let handlers = HandlerTable::builder()
//!     .on("accession", |scope, _| scope.open("accession").map(|_| ()))
//!     .on("title", |scope, _| {
//!         let text = scope.inner_text();
//!         scope.set_context_property("title", text)
//!     })
//!     .build()
//!     .unwrap();
//!
//! let xml = "<accession><title>Foo</title></accession>";
//! let outcome = Importer::from_str(xml, schema, handlers, ImportConfig::default())
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(outcome.records.len(), 1);
//! assert_eq!(outcome.records[0].get("title"), Some(Value::from("Foo")));
//! ```

use crate::config::ImportConfig;
use crate::context::ContextStack;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{ImportError, ImportResult};
use crate::event::NodeEvent;
use crate::handler::HandlerTable;
use crate::proxy::{ProxyKey, ProxyRegistry, UndischargedProxy};
use crate::reader::{EventSource, XmlEventReader};
use crate::scope::ImportScope;
use std::collections::VecDeque;
use std::io::{BufReader, Read};
use std::sync::Arc;
use strata_core::{RecordRef, SchemaRegistry, Value};
use tracing::{debug, info, trace};

/// Counters for one import pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    /// Events pulled from the source.
    pub events: u64,
    /// Open events whose element had no handler.
    pub unhandled_elements: u64,
    /// Text events no proxy was waiting for.
    pub unclaimed_text: u64,
    /// Records opened by handlers.
    pub records_opened: u64,
    /// Records emitted as top-level output.
    pub records_emitted: u64,
    /// Largest number of simultaneously open records.
    pub peak_context_depth: usize,
    /// Largest number of node representations held by the source at once.
    pub peak_retained_nodes: usize,
}

/// Result of [`Importer::run`].
#[derive(Debug)]
pub struct ImportOutcome {
    /// Top-level records in completion order.
    pub records: Vec<RecordRef>,
    /// Non-fatal findings.
    pub diagnostics: Vec<Diagnostic>,
    /// Counters.
    pub stats: ImportStats,
}

impl ImportOutcome {
    /// Proxies that were never discharged.
    pub fn undischarged(&self) -> impl Iterator<Item = &UndischargedProxy> {
        self.diagnostics.iter().filter_map(|d| match d {
            Diagnostic::UndischargedProxy(p) => Some(p),
            Diagnostic::DuplicateAssignment { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Ready,
    Running,
    Finished,
    Failed,
}

/// Streaming import of one document.
///
/// Use [`run`](Self::run) to collect everything, or iterate to receive
/// top-level records as soon as they close.
pub struct Importer<S: EventSource> {
    source: S,
    schema: Arc<SchemaRegistry>,
    handlers: Arc<HandlerTable>,
    config: ImportConfig,
    stack: ContextStack,
    proxies: ProxyRegistry,
    diagnostics: Diagnostics,
    output: VecDeque<RecordRef>,
    stats: ImportStats,
    state: DriverState,
}

impl<'a> Importer<XmlEventReader<&'a [u8]>> {
    /// Import an in-memory XML document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(
        xml: &'a str,
        schema: impl Into<Arc<SchemaRegistry>>,
        handlers: impl Into<Arc<HandlerTable>>,
        config: ImportConfig,
    ) -> Self {
        let source = XmlEventReader::from_str(xml, &config);
        Self::new(source, schema, handlers, config)
    }
}

impl<R: Read> Importer<XmlEventReader<BufReader<R>>> {
    /// Import an XML document from any reader.
    pub fn from_reader(
        reader: R,
        schema: impl Into<Arc<SchemaRegistry>>,
        handlers: impl Into<Arc<HandlerTable>>,
        config: ImportConfig,
    ) -> Self {
        let source = XmlEventReader::from_read(reader, &config);
        Self::new(source, schema, handlers, config)
    }
}

impl<S: EventSource> Importer<S> {
    /// Create an importer over any event source.
    pub fn new(
        source: S,
        schema: impl Into<Arc<SchemaRegistry>>,
        handlers: impl Into<Arc<HandlerTable>>,
        config: ImportConfig,
    ) -> Self {
        Self {
            source,
            schema: schema.into(),
            handlers: handlers.into(),
            config,
            stack: ContextStack::new(),
            proxies: ProxyRegistry::new(),
            diagnostics: Diagnostics::new(),
            output: VecDeque::new(),
            stats: ImportStats::default(),
            state: DriverState::Ready,
        }
    }

    /// Process one event.
    ///
    /// Returns `false` once the stream is exhausted and end-of-stream checks
    /// have run, or after an earlier error.
    ///
    /// # Errors
    ///
    /// Source errors, handler errors, structural errors and, at end of
    /// stream, [`ImportError::UnclosedRecords`]. The importer is unusable
    /// after an error.
    pub fn step(&mut self) -> ImportResult<bool> {
        match self.state {
            DriverState::Finished | DriverState::Failed => return Ok(false),
            DriverState::Ready => {
                info!(handlers = self.handlers.len(), "Processing XML: started");
                self.state = DriverState::Running;
            }
            DriverState::Running => {}
        }

        let result = match self.source.next_event() {
            Ok(Some(event)) => {
                let occurrence = self.stats.events;
                self.stats.events += 1;
                self.dispatch(occurrence, event).map(|()| true)
            }
            Ok(None) => self.finish().map(|()| false),
            Err(e) => Err(e),
        };

        self.stats.peak_retained_nodes = self
            .stats
            .peak_retained_nodes
            .max(self.source.retained_nodes());

        if result.is_err() {
            self.state = DriverState::Failed;
        }
        result
    }

    /// Advance until the next top-level record is complete.
    ///
    /// Returns `None` at end of stream.
    pub fn next_record(&mut self) -> ImportResult<Option<RecordRef>> {
        loop {
            if let Some(record) = self.output.pop_front() {
                return Ok(Some(record));
            }
            if !self.step()? {
                return Ok(self.output.pop_front());
            }
        }
    }

    /// Run the pass to completion.
    ///
    /// # Errors
    ///
    /// The first fatal error; records completed before it are discarded.
    pub fn run(mut self) -> ImportResult<ImportOutcome> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(ImportOutcome {
            records,
            diagnostics: self.diagnostics.snapshot(),
            stats: self.stats,
        })
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.snapshot()
    }

    /// Counters so far.
    pub fn stats(&self) -> ImportStats {
        self.stats
    }

    /// Number of records currently open.
    pub fn context_depth(&self) -> usize {
        self.stack.len()
    }

    /// Number of proxies currently pending.
    pub fn pending_proxies(&self) -> usize {
        self.proxies.total_pending()
    }

    /// The configuration of this pass.
    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    fn dispatch(&mut self, occurrence: u64, event: NodeEvent) -> ImportResult<()> {
        match event {
            NodeEvent::Open(node) => {
                let handlers = Arc::clone(&self.handlers);
                let Some(handler) = handlers.get(&node.name) else {
                    self.stats.unhandled_elements += 1;
                    trace!(element = %node.name, depth = node.depth, "No handler for element");
                    return Ok(());
                };

                let mut scope = ImportScope {
                    stack: &mut self.stack,
                    proxies: &mut self.proxies,
                    schema: &self.schema,
                    diagnostics: &self.diagnostics,
                    element: &node.name,
                    depth: node.depth,
                    occurrence,
                };
                handler(&mut scope, &node)?;

                self.stats.records_opened = self.stack.opened();
                self.stats.peak_context_depth = self.stack.peak();
            }
            NodeEvent::Text { value, depth } => {
                if !self.proxies.discharge(&ProxyKey::Text, Value::String(value))? {
                    self.stats.unclaimed_text += 1;
                    trace!(depth, "Text with no pending proxy");
                }
            }
            NodeEvent::Close { name, depth } => {
                let closed = self.stack.on_close_event(
                    &name,
                    depth,
                    &self.schema,
                    &mut self.proxies,
                )?;
                for entry in closed {
                    if !entry.claimed {
                        self.stats.records_emitted += 1;
                        self.output.push_back(entry.record);
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> ImportResult<()> {
        if let Some(innermost) = self.stack.current_type() {
            return Err(ImportError::UnclosedRecords {
                open: self.stack.len(),
                innermost: innermost.to_string(),
            });
        }

        if self.config.report_undischarged {
            for proxy in self.proxies.undischarged() {
                debug!(
                    id = proxy.id,
                    key = %proxy.key,
                    element = %proxy.origin.element,
                    depth = proxy.origin.depth,
                    "Undischarged proxy"
                );
                self.diagnostics.push(Diagnostic::UndischargedProxy(proxy));
            }
        }

        self.state = DriverState::Finished;
        info!(
            events = self.stats.events,
            records = self.stats.records_emitted,
            diagnostics = self.diagnostics.len(),
            "Processing XML: done"
        );
        Ok(())
    }
}

impl<S: EventSource> Iterator for Importer<S> {
    type Item = ImportResult<RecordRef>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::events;
    use strata_core::{PropertyType, RecordSchema};

    fn schema() -> SchemaRegistry {
        SchemaRegistry::new()
            .with(
                RecordSchema::builder("accession")
                    .property("title", PropertyType::string())
                    .property("dates", PropertyType::record("date").list())
                    .build(),
            )
            .unwrap()
            .with(
                RecordSchema::builder("date")
                    .property("expression", PropertyType::string())
                    .build(),
            )
            .unwrap()
    }

    fn handlers() -> HandlerTable {
        HandlerTable::builder()
            .on("accession", |scope, _| scope.open("accession").map(|_| ()))
            .on("title", |scope, _| {
                let text = scope.inner_text();
                scope.set_context_property("title", text)
            })
            .on("date", |scope, _| {
                let date = scope.proxy_for("date");
                scope.set_ancestor_property(&["accession"], "dates", date)?;
                scope.open("date")?;
                let text = scope.inner_text();
                scope.set_context_property("expression", text)
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_stream_records_one_at_a_time() {
        let source = events(vec![
            NodeEvent::open("accession", 0),
            NodeEvent::close("accession", 0),
            NodeEvent::open("accession", 0),
            NodeEvent::close("accession", 0),
        ]);
        let mut importer = Importer::new(source, schema(), handlers(), ImportConfig::default());

        assert!(importer.next_record().unwrap().is_some());
        assert_eq!(importer.stats().events, 2);
        assert!(importer.next_record().unwrap().is_some());
        assert!(importer.next_record().unwrap().is_none());
        assert!(importer.next_record().unwrap().is_none());
    }

    #[test]
    fn test_nested_record_attached_not_emitted() {
        let xml = "<accession><date>1999</date></accession>";
        let outcome = Importer::from_str(xml, schema(), handlers(), ImportConfig::default())
            .run()
            .unwrap();

        assert_eq!(outcome.records.len(), 1);
        let dates = outcome.records[0].get("dates").unwrap();
        let date = dates.as_list().unwrap()[0].as_record().unwrap().clone();
        assert_eq!(date.get("expression"), Some(Value::from("1999")));
        assert_eq!(outcome.stats.records_opened, 2);
        assert_eq!(outcome.stats.records_emitted, 1);
    }

    #[test]
    fn test_unclosed_records_at_end() {
        let source = events(vec![NodeEvent::open("accession", 0)]);
        let err = Importer::new(source, schema(), handlers(), ImportConfig::default())
            .run()
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::UnclosedRecords { open: 1, ref innermost } if innermost == "accession"
        ));
    }

    #[test]
    fn test_iteration_stops_after_error() {
        let source = events(vec![
            NodeEvent::open("accession", 0),
            NodeEvent::open("accession", 0),
        ]);
        let mut importer = Importer::new(source, schema(), handlers(), ImportConfig::default());
        assert!(matches!(importer.next(), Some(Err(ImportError::SlotReopened { .. }))));
        assert!(importer.next().is_none());
    }

    #[test]
    fn test_undischarged_reported_when_enabled() {
        let source = events(vec![
            NodeEvent::open("accession", 0),
            NodeEvent::open("title", 1),
            NodeEvent::close("title", 1),
            NodeEvent::close("accession", 0),
        ]);
        let outcome = Importer::new(source, schema(), handlers(), ImportConfig::default())
            .run()
            .unwrap();
        assert_eq!(outcome.undischarged().count(), 1);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].get("title"), None);

        let source = events(vec![
            NodeEvent::open("accession", 0),
            NodeEvent::open("title", 1),
            NodeEvent::close("title", 1),
            NodeEvent::close("accession", 0),
        ]);
        let config = ImportConfig {
            report_undischarged: false,
            ..ImportConfig::default()
        };
        let outcome = Importer::new(source, schema(), handlers(), config)
            .run()
            .unwrap();
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_unhandled_and_unclaimed_counted() {
        let xml = "<root><note>free text</note></root>";
        let outcome = Importer::from_str(xml, schema(), handlers(), ImportConfig::default())
            .run()
            .unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stats.unhandled_elements, 2);
        assert_eq!(outcome.stats.unclaimed_text, 1);
    }
}
