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

//! Pull-based node event sources.
//!
//! The driver only needs a forward cursor over [`NodeEvent`]s. The
//! [`EventSource`] trait is that cursor; [`XmlEventReader`] implements it on
//! top of `quick-xml`, and [`IterEvents`] adapts any iterator of ready-made
//! events (handy for tests and for callers with their own tokenizer).
//!
//! # Memory
//!
//! [`XmlEventReader`] reuses one byte buffer for every event and keeps only
//! the names of the currently open elements. Nothing it has yielded is
//! retained, so a document of any size is read with memory proportional to
//! its nesting depth.

use crate::config::ImportConfig;
use crate::error::{ImportError, ImportResult};
use crate::event::{ElementNode, NodeEvent};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};

/// A forward-only source of node events.
pub trait EventSource {
    /// Pull the next event, or `None` at end of stream.
    fn next_event(&mut self) -> ImportResult<Option<NodeEvent>>;

    /// Number of low-level node representations currently held by the
    /// source. Used to check the memory bound of a pass.
    fn retained_nodes(&self) -> usize {
        0
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn next_event(&mut self) -> ImportResult<Option<NodeEvent>> {
        (**self).next_event()
    }

    fn retained_nodes(&self) -> usize {
        (**self).retained_nodes()
    }
}

/// Event source over an iterator of prepared events.
///
/// # Examples
///
/// ```rust
/// use strata_stream::{events, EventSource, NodeEvent};
///
/// let mut source = events(vec![NodeEvent::open("a", 0), NodeEvent::close("a", 0)]);
/// assert!(source.next_event().unwrap().unwrap().is_open());
/// assert!(source.next_event().unwrap().unwrap().is_close());
/// assert!(source.next_event().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct IterEvents<I> {
    iter: I,
}

/// Wrap an iterator of events as an [`EventSource`].
pub fn events<I>(events: I) -> IterEvents<I::IntoIter>
where
    I: IntoIterator<Item = NodeEvent>,
{
    IterEvents {
        iter: events.into_iter(),
    }
}

impl<I: Iterator<Item = NodeEvent>> EventSource for IterEvents<I> {
    fn next_event(&mut self) -> ImportResult<Option<NodeEvent>> {
        Ok(self.iter.next())
    }
}

/// Streaming XML reader producing [`NodeEvent`]s.
///
/// - Empty elements (`<x/>`) are expanded into an open and a close event.
/// - Whitespace-only text is skipped; other text is trimmed when
///   [`ImportConfig::trim_text`] is set.
/// - CDATA sections are reported as text.
/// - Comments, processing instructions and declarations are skipped.
///
/// # Examples
///
/// ```rust
/// use strata_stream::{EventSource, ImportConfig, NodeEvent, XmlEventReader};
///
/// let xml = "<accession><title>Foo</title></accession>";
/// let mut reader = XmlEventReader::from_str(xml, &ImportConfig::default());
///
/// let mut seen = Vec::new();
/// while let Some(event) = reader.next_event().unwrap() {
///     seen.push(event);
/// }
/// assert_eq!(seen[2], NodeEvent::text("Foo", 2));
/// assert_eq!(seen.len(), 5);
/// ```
pub struct XmlEventReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: Vec<String>,
    max_depth: usize,
    trim_text: bool,
    finished: bool,
    peak_open: usize,
}

impl<'a> XmlEventReader<&'a [u8]> {
    /// Read events from an in-memory document.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(xml: &'a str, config: &ImportConfig) -> Self {
        Self::new(xml.as_bytes(), config)
    }
}

impl<R: Read> XmlEventReader<BufReader<R>> {
    /// Read events from any `Read`, buffered with
    /// [`ImportConfig::buffer_size`].
    pub fn from_read(reader: R, config: &ImportConfig) -> Self {
        Self::new(BufReader::with_capacity(config.buffer_size, reader), config)
    }
}

impl<R: BufRead> XmlEventReader<R> {
    /// Read events from a buffered reader.
    pub fn new(reader: R, config: &ImportConfig) -> Self {
        let mut reader = Reader::from_reader(reader);
        reader.expand_empty_elements(true);
        reader.check_end_names(true);

        Self {
            reader,
            buf: Vec::with_capacity(8192),
            open: Vec::new(),
            max_depth: config.max_depth,
            trim_text: config.trim_text,
            finished: false,
            peak_open: 0,
        }
    }

    /// Byte offset of the reader in the input.
    #[inline]
    pub fn position(&self) -> usize {
        self.reader.buffer_position()
    }

    /// Current element nesting depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Largest number of simultaneously open elements seen so far.
    #[inline]
    pub fn peak_retained(&self) -> usize {
        self.peak_open
    }
}

/// Text event for `text` inside the open elements, if it carries content.
fn text_event(open: &[String], trim: bool, text: &str) -> Option<NodeEvent> {
    if open.is_empty() || text.trim().is_empty() {
        return None;
    }
    let value = if trim {
        text.trim().to_string()
    } else {
        text.to_string()
    };
    Some(NodeEvent::Text {
        value,
        depth: open.len(),
    })
}

impl<R: BufRead> EventSource for XmlEventReader<R> {
    fn next_event(&mut self) -> ImportResult<Option<NodeEvent>> {
        if self.finished {
            return Ok(None);
        }

        loop {
            self.buf.clear();
            let position = self.reader.buffer_position();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(e) => {
                    self.finished = true;
                    return Err(ImportError::xml(self.reader.buffer_position(), e.to_string()));
                }
            };

            match event {
                Event::Start(e) => {
                    let depth = self.open.len();
                    if depth > self.max_depth {
                        self.finished = true;
                        return Err(ImportError::DepthLimitExceeded {
                            max: self.max_depth,
                            depth,
                        });
                    }

                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let mut attributes = BTreeMap::new();
                    for attr in e.attributes() {
                        let attr = attr.map_err(|err| ImportError::xml(position, err.to_string()))?;
                        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                        let value = attr
                            .unescape_value()
                            .map_err(|err| ImportError::xml(position, err.to_string()))?
                            .into_owned();
                        attributes.insert(key, value);
                    }

                    self.open.push(name.clone());
                    self.peak_open = self.peak_open.max(self.open.len());
                    return Ok(Some(NodeEvent::Open(ElementNode {
                        name,
                        depth,
                        attributes,
                    })));
                }
                Event::End(e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    match self.open.pop() {
                        Some(open) if open == name => {}
                        Some(open) => {
                            self.finished = true;
                            return Err(ImportError::xml(
                                position,
                                format!("expected </{}>, found </{}>", open, name),
                            ));
                        }
                        None => {
                            self.finished = true;
                            return Err(ImportError::xml(
                                position,
                                format!("unexpected </{}> outside the root element", name),
                            ));
                        }
                    }
                    return Ok(Some(NodeEvent::Close {
                        name,
                        depth: self.open.len(),
                    }));
                }
                Event::Text(e) => {
                    let text = e
                        .unescape()
                        .map_err(|err| ImportError::xml(position, err.to_string()))?
                        .into_owned();
                    if let Some(event) = text_event(&self.open, self.trim_text, &text) {
                        return Ok(Some(event));
                    }
                }
                Event::CData(e) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    if let Some(event) = text_event(&self.open, self.trim_text, &text) {
                        return Ok(Some(event));
                    }
                }
                Event::Eof => {
                    self.finished = true;
                    if let Some(element) = self.open.pop() {
                        return Err(ImportError::UnclosedElement {
                            element,
                            depth: self.open.len(),
                        });
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    fn retained_nodes(&self) -> usize {
        self.open.len()
    }
}

impl<R: BufRead> Iterator for XmlEventReader<R> {
    type Item = ImportResult<NodeEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
