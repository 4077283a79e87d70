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

//! Non-fatal findings collected during an import.

use crate::proxy::UndischargedProxy;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A non-fatal finding.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A scalar property was assigned more than once; the last value won.
    DuplicateAssignment {
        record_type: String,
        property: String,
        previous: String,
        current: String,
    },
    /// A proxy was still pending when the stream ended.
    UndischargedProxy(UndischargedProxy),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateAssignment {
                record_type,
                property,
                previous,
                current,
            } => write!(
                f,
                "{}.{} set more than once ('{}' replaced by '{}')",
                record_type, property, previous, current
            ),
            Self::UndischargedProxy(proxy) => write!(f, "undischarged {}", proxy),
        }
    }
}

/// Shared, append-only diagnostic sink.
///
/// Clones share the same buffer, so discharge actions can hold one.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Rc<RefCell<Vec<Diagnostic>>>);

impl Diagnostics {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&self, diagnostic: Diagnostic) {
        self.0.borrow_mut().push(diagnostic);
    }

    /// Number of diagnostics collected.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// True if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Copy of everything collected so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.0.borrow().clone()
    }

    /// Number of duplicate assignments collected.
    pub fn duplicate_assignments(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|d| matches!(d, Diagnostic::DuplicateAssignment { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::{ProxyKey, ProxyOrigin};

    #[test]
    fn test_clones_share_buffer() {
        let diagnostics = Diagnostics::new();
        let handle = diagnostics.clone();
        handle.push(Diagnostic::DuplicateAssignment {
            record_type: "accession".to_string(),
            property: "title".to_string(),
            previous: "A".to_string(),
            current: "B".to_string(),
        });
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.duplicate_assignments(), 1);
        assert_eq!(
            diagnostics.snapshot()[0].to_string(),
            "accession.title set more than once ('A' replaced by 'B')"
        );
    }

    #[test]
    fn test_undischarged_display() {
        let diagnostic = Diagnostic::UndischargedProxy(UndischargedProxy {
            id: 3,
            key: ProxyKey::record("extent"),
            origin: ProxyOrigin::new("extent", 2),
            waiting_actions: 1,
        });
        assert!(diagnostic.to_string().starts_with("undischarged proxy #3 for extent"));
    }
}
