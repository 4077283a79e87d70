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

//! Context stack and depth index.
//!
//! The [`ContextStack`] holds the records currently under construction,
//! innermost last. Alongside it the [`DepthIndex`] remembers which record
//! types were opened by which element occurrence, keyed by element name and
//! depth, so that the matching close event can close exactly those records
//! in reverse order.

use crate::error::{ImportError, ImportResult};
use crate::proxy::{ProxyKey, ProxyRegistry};
use std::collections::HashMap;
use strata_core::{RecordRef, SchemaRegistry, Value};

/// One record on the context stack.
#[derive(Debug, Clone)]
struct OpenRecord {
    record: RecordRef,
    record_type: String,
    element: String,
    depth: usize,
}

#[derive(Debug)]
struct DepthSlot {
    occurrence: u64,
    types: Vec<String>,
}

/// Map from element name and depth to the record types opened there.
///
/// A slot is owned by one element occurrence (the index of its open event).
/// Registering a type for the same (name, depth) from a different occurrence
/// while the slot is occupied is an error.
#[derive(Debug, Default)]
pub struct DepthIndex {
    slots: HashMap<String, Vec<Option<DepthSlot>>>,
    occupied: usize,
}

impl DepthIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    fn register(
        &mut self,
        element: &str,
        depth: usize,
        occurrence: u64,
        record_type: &str,
    ) -> ImportResult<()> {
        let by_depth = self.slots.entry(element.to_string()).or_default();
        if by_depth.len() <= depth {
            by_depth.resize_with(depth + 1, || None);
        }

        match &mut by_depth[depth] {
            Some(slot) if slot.occurrence != occurrence => Err(ImportError::SlotReopened {
                element: element.to_string(),
                depth,
            }),
            Some(slot) => {
                slot.types.push(record_type.to_string());
                Ok(())
            }
            empty => {
                *empty = Some(DepthSlot {
                    occurrence,
                    types: vec![record_type.to_string()],
                });
                self.occupied += 1;
                Ok(())
            }
        }
    }

    /// Record types opened at (`element`, `depth`), in opening order.
    pub fn types_at(&self, element: &str, depth: usize) -> Option<&[String]> {
        self.slots
            .get(element)
            .and_then(|by_depth| by_depth.get(depth))
            .and_then(Option::as_ref)
            .map(|slot| slot.types.as_slice())
    }

    /// Drop the most recent `record_type` from the slot, clearing the slot
    /// once it holds no type.
    fn release(&mut self, element: &str, depth: usize, record_type: &str) {
        let emptied = match self
            .slots
            .get_mut(element)
            .and_then(|by_depth| by_depth.get_mut(depth))
            .and_then(Option::as_mut)
        {
            Some(slot) => {
                if let Some(pos) = slot.types.iter().rposition(|t| t == record_type) {
                    slot.types.remove(pos);
                }
                slot.types.is_empty()
            }
            None => false,
        };
        if emptied {
            self.clear(element, depth);
        }
    }

    fn clear(&mut self, element: &str, depth: usize) {
        let Some(by_depth) = self.slots.get_mut(element) else {
            return;
        };
        if let Some(slot) = by_depth.get_mut(depth) {
            if slot.take().is_some() {
                self.occupied -= 1;
            }
        }
        while matches!(by_depth.last(), Some(None)) {
            by_depth.pop();
        }
        if by_depth.is_empty() {
            self.slots.remove(element);
        }
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// True if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }
}

/// A record taken off the context stack.
#[derive(Debug, Clone)]
pub struct ClosedRecord {
    /// The completed record.
    pub record: RecordRef,
    /// True if a pending proxy took the record or another record already
    /// holds it; unclaimed records are top-level output.
    pub claimed: bool,
}

/// Stack of records under construction.
#[derive(Debug, Default)]
pub struct ContextStack {
    stack: Vec<OpenRecord>,
    index: DepthIndex,
    opened: u64,
    peak: usize,
}

impl ContextStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new record of `record_type` for the element occurrence
    /// `occurrence` at (`element`, `depth`) and push it.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::SlotReopened`] if another occurrence of the same
    /// element at the same depth still has open records.
    pub fn open(
        &mut self,
        record_type: &str,
        element: &str,
        depth: usize,
        occurrence: u64,
    ) -> ImportResult<RecordRef> {
        self.index.register(element, depth, occurrence, record_type)?;

        let record = RecordRef::of_type(record_type);
        self.stack.push(OpenRecord {
            record: record.clone(),
            record_type: record_type.to_string(),
            element: element.to_string(),
            depth,
        });
        self.opened += 1;
        self.peak = self.peak.max(self.stack.len());
        Ok(record)
    }

    /// Close the innermost record, which must be of `record_type`.
    ///
    /// Schema defaults are applied to unset properties, the record is offered
    /// to the oldest pending proxy for its type, and then it is popped and
    /// removed from its depth slot.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::StructuralMismatch`] if the innermost record is
    /// of another type or the stack is empty. Default coercion and discharge
    /// action errors propagate.
    pub fn close(
        &mut self,
        record_type: &str,
        schema: &SchemaRegistry,
        proxies: &mut ProxyRegistry,
    ) -> ImportResult<ClosedRecord> {
        let (element, depth) = match self.stack.last() {
            Some(top) => (top.element.clone(), top.depth),
            None => (String::new(), 0),
        };
        let closed = self.close_at(record_type, &element, depth, schema, proxies)?;
        self.index.release(&element, depth, record_type);
        Ok(closed)
    }

    fn close_at(
        &mut self,
        record_type: &str,
        element: &str,
        depth: usize,
        schema: &SchemaRegistry,
        proxies: &mut ProxyRegistry,
    ) -> ImportResult<ClosedRecord> {
        let record = match self.stack.last() {
            Some(top) if top.record_type == record_type => top.record.clone(),
            top => {
                return Err(ImportError::structural_mismatch(
                    element,
                    depth,
                    record_type,
                    top.map(|t| t.record_type.as_str()),
                ))
            }
        };

        let record_schema = schema.get(record_type)?;
        record.borrow_mut().apply_defaults(record_schema)?;

        let discharged = proxies.discharge(
            &ProxyKey::record(record_type),
            Value::Record(record.clone()),
        )?;
        self.stack.pop();

        let claimed = discharged || record.is_attached();
        Ok(ClosedRecord { record, claimed })
    }

    /// Handle the close event of (`element`, `depth`).
    ///
    /// Closes every record that occurrence opened, innermost first, and clears
    /// its slot. Elements that opened nothing yield an empty list.
    pub fn on_close_event(
        &mut self,
        element: &str,
        depth: usize,
        schema: &SchemaRegistry,
        proxies: &mut ProxyRegistry,
    ) -> ImportResult<Vec<ClosedRecord>> {
        let types = match self.index.types_at(element, depth) {
            Some(types) => types.to_vec(),
            None => return Ok(Vec::new()),
        };

        let mut closed = Vec::with_capacity(types.len());
        for record_type in types.iter().rev() {
            closed.push(self.close_at(record_type, element, depth, schema, proxies)?);
        }
        self.index.clear(element, depth);
        Ok(closed)
    }

    /// Innermost open record whose type is in `types`, skipping records
    /// opened by the element at (`element`, `depth`) itself.
    pub fn ancestor_of(&self, types: &[&str], element: &str, depth: usize) -> Option<RecordRef> {
        self.stack
            .iter()
            .rev()
            .filter(|open| !(open.depth == depth && open.element == element))
            .find(|open| types.contains(&open.record_type.as_str()))
            .map(|open| open.record.clone())
    }

    /// The innermost open record.
    pub fn current(&self) -> Option<&RecordRef> {
        self.stack.last().map(|open| &open.record)
    }

    /// Type of the innermost open record.
    pub fn current_type(&self) -> Option<&str> {
        self.stack.last().map(|open| open.record_type.as_str())
    }

    /// Number of open records.
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// True if no record is open.
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Largest number of simultaneously open records so far.
    pub fn peak(&self) -> usize {
        self.peak
    }

    /// Number of records opened so far.
    pub fn opened(&self) -> u64 {
        self.opened
    }

    /// The depth index.
    pub fn depth_index(&self) -> &DepthIndex {
        &self.index
    }
}
