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

//! Element handler table.
//!
//! Maps element names to the handler invoked when an element with that name
//! opens. The table is built once, validated, and can then be shared between
//! imports behind an `Arc`.
//!
//! # Examples
//!
//! ```rust
//! use strata_stream::HandlerTable;
//!
//! let handlers = HandlerTable::builder()
//!     .on("record", |scope, _node| {
//!         scope.open("accession")?;
//!         Ok(())
//!     })
//!     .on("title", |scope, _node| {
//!         let text = scope.inner_text();
//!         scope.set_context_property("title", text)
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(handlers.element_names(), vec!["record", "title"]);
//! ```

use crate::error::{ImportError, ImportResult};
use crate::event::ElementNode;
use crate::scope::ImportScope;
use std::collections::HashMap;
use std::fmt;

/// Handler invoked with the open event of an element.
pub type Handler = dyn Fn(&mut ImportScope<'_>, &ElementNode) -> ImportResult<()> + Send + Sync;

/// Immutable map from element name to [`Handler`].
pub struct HandlerTable {
    handlers: HashMap<String, Box<Handler>>,
}

impl HandlerTable {
    /// Start building a table.
    pub fn builder() -> HandlerTableBuilder {
        HandlerTableBuilder::default()
    }

    /// Handler for `element`, if any.
    pub fn get(&self, element: &str) -> Option<&Handler> {
        self.handlers.get(element).map(Box::as_ref)
    }

    /// True if `element` has a handler.
    pub fn contains(&self, element: &str) -> bool {
        self.handlers.contains_key(element)
    }

    /// Number of handled element names.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no element is handled.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handled element names, sorted.
    pub fn element_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable")
            .field("elements", &self.element_names())
            .finish()
    }
}

/// Builder for [`HandlerTable`].
#[derive(Default)]
pub struct HandlerTableBuilder {
    handlers: HashMap<String, Box<Handler>>,
    problems: Vec<String>,
}

impl HandlerTableBuilder {
    /// Register `handler` for elements named `element`.
    pub fn on<F>(mut self, element: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut ImportScope<'_>, &ElementNode) -> ImportResult<()> + Send + Sync + 'static,
    {
        self.insert(element.into(), Box::new(handler));
        self
    }

    /// Register an already boxed handler.
    pub fn on_boxed(mut self, element: impl Into<String>, handler: Box<Handler>) -> Self {
        self.insert(element.into(), handler);
        self
    }

    fn insert(&mut self, element: String, handler: Box<Handler>) {
        if element.trim().is_empty() {
            self.problems.push("empty element name".to_string());
            return;
        }
        if self.handlers.contains_key(&element) {
            self.problems
                .push(format!("duplicate handler for element '{}'", element));
            return;
        }
        self.handlers.insert(element, handler);
    }

    /// Validate and build the table.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::Config`] listing every empty or duplicated
    /// element name.
    pub fn build(self) -> ImportResult<HandlerTable> {
        if !self.problems.is_empty() {
            return Err(ImportError::config(self.problems.join("; ")));
        }
        Ok(HandlerTable {
            handlers: self.handlers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_lookup() {
        let table = HandlerTable::builder()
            .on("record", |_, _| Ok(()))
            .on("date", |_, _| Ok(()))
            .build()
            .unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.contains("date"));
        assert!(table.get("extent").is_none());
        assert_eq!(format!("{:?}", table), r#"HandlerTable { elements: ["date", "record"] }"#);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = HandlerTable::builder()
            .on("date", |_, _| Ok(()))
            .on("date", |_, _| Ok(()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate handler for element 'date'"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = HandlerTable::builder()
            .on("  ", |_, _| Ok(()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }

    #[test]
    fn test_table_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HandlerTable>();
    }
}
