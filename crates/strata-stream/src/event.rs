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

//! Node events consumed by the import driver.
//!
//! An [`EventSource`](crate::EventSource) yields [`NodeEvent`]s in document
//! order. For this document:
//!
//! ```text
//! <accession><title>Foo</title></accession>
//! ```
//!
//! the source yields:
//!
//! ```text
//! Open(accession, depth 0)
//! Open(title, depth 1)
//! Text("Foo", depth 2)
//! Close(title, depth 1)
//! Close(accession, depth 0)
//! ```
//!
//! Depths follow the element nesting (root = 0); a text node sits one level
//! below the element that contains it.

use std::collections::BTreeMap;
use std::fmt;

/// An element as seen by a handler: name, depth and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    /// Element name, including any namespace prefix.
    pub name: String,
    /// Nesting depth (root element = 0).
    pub depth: usize,
    /// Attribute values by name.
    pub attributes: BTreeMap<String, String>,
}

impl ElementNode {
    /// Create an element without attributes.
    pub fn new(name: impl Into<String>, depth: usize) -> Self {
        Self {
            name: name.into(),
            depth,
            attributes: BTreeMap::new(),
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Get an attribute value as written.
    #[inline]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Get an attribute value lower-cased, for case-insensitive codes such as
    /// `type="Inclusive"`.
    pub fn attribute_lowercase(&self, name: &str) -> Option<String> {
        self.attribute(name).map(str::to_lowercase)
    }
}

/// A single event pulled from the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    /// An element was opened.
    Open(ElementNode),
    /// A text (or CDATA) node.
    Text {
        /// Unescaped text content.
        value: String,
        /// Depth of the text node (its element's depth + 1).
        depth: usize,
    },
    /// An element was closed.
    Close {
        /// Element name.
        name: String,
        /// Depth of the element being closed.
        depth: usize,
    },
}

impl NodeEvent {
    /// Open event for an element without attributes.
    pub fn open(name: impl Into<String>, depth: usize) -> Self {
        Self::Open(ElementNode::new(name, depth))
    }

    /// Text event.
    pub fn text(value: impl Into<String>, depth: usize) -> Self {
        Self::Text {
            value: value.into(),
            depth,
        }
    }

    /// Close event.
    pub fn close(name: impl Into<String>, depth: usize) -> Self {
        Self::Close {
            name: name.into(),
            depth,
        }
    }

    /// Depth of the event.
    pub fn depth(&self) -> usize {
        match self {
            Self::Open(node) => node.depth,
            Self::Text { depth, .. } | Self::Close { depth, .. } => *depth,
        }
    }

    /// Element name for open and close events.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Open(node) => Some(&node.name),
            Self::Close { name, .. } => Some(name),
            Self::Text { .. } => None,
        }
    }

    /// True for open events.
    #[inline]
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// True for text events.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text { .. })
    }

    /// True for close events.
    #[inline]
    pub fn is_close(&self) -> bool {
        matches!(self, Self::Close { .. })
    }
}

impl fmt::Display for NodeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(node) => {
                write!(f, "{:indent$}<{}", "", node.name, indent = node.depth * 2)?;
                for (name, value) in &node.attributes {
                    write!(f, " {}={:?}", name, value)?;
                }
                write!(f, ">")
            }
            Self::Text { value, depth } => {
                write!(f, "{:indent$}{:?}", "", value, indent = depth * 2)
            }
            Self::Close { name, depth } => {
                write!(f, "{:indent$}</{}>", "", name, indent = depth * 2)
            }
        }
    }
}
