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

//! Proxies for values that are not available yet.
//!
//! A handler that needs a value the stream has not produced yet (the text
//! following the current element, or a record still being built) asks the
//! [`ProxyRegistry`] for a [`Proxy`] and registers discharge actions on it.
//! When a value of the proxy's kind arrives the registry discharges the
//! oldest pending proxy for that kind, running its actions in registration
//! order.
//!
//! # Ordering
//!
//! Discharge is FIFO per [`ProxyKey`]: if proxies `P1`, `P2` are requested for
//! the same key and values `V1`, `V2` arrive in that order, `P1` receives `V1`
//! and `P2` receives `V2`. `text` proxies are matched to text nodes purely by
//! this order, not by the element that requested them.
//!
//! # Examples
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use strata_core::Value;
//! use strata_stream::{ProxyKey, ProxyOrigin, ProxyRegistry};
//!
//! let mut registry = ProxyRegistry::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let proxy = registry.proxy_for(ProxyKey::Text, ProxyOrigin::new("title", 1));
//! let sink = Rc::clone(&seen);
//! proxy
//!     .on_discharge(move |value| {
//!         sink.borrow_mut().push(value);
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert!(registry.discharge(&ProxyKey::Text, Value::from("Foo")).unwrap());
//! assert_eq!(*seen.borrow(), vec![Value::from("Foo")]);
//! ```

use crate::error::ImportResult;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;
use strata_core::Value;
use tracing::debug;

/// What a proxy is waiting for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProxyKey {
    /// The next text node.
    Text,
    /// The next completed record of the given type.
    Record(String),
}

impl ProxyKey {
    /// Key for the next completed record of `record_type`.
    pub fn record(record_type: impl Into<String>) -> Self {
        Self::Record(record_type.into())
    }
}

impl fmt::Display for ProxyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Record(t) => write!(f, "{}", t),
        }
    }
}

/// Where a proxy was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyOrigin {
    /// Element being handled when the proxy was requested.
    pub element: String,
    /// Depth of that element.
    pub depth: usize,
}

impl ProxyOrigin {
    /// Create an origin.
    pub fn new(element: impl Into<String>, depth: usize) -> Self {
        Self {
            element: element.into(),
            depth,
        }
    }
}

/// Deferred action run with the value a proxy resolves to.
pub type DischargeAction = Box<dyn FnOnce(Value) -> ImportResult<()>>;

enum ProxyState {
    Pending(Vec<DischargeAction>),
    Discharged(Value),
}

struct ProxyInner {
    id: u64,
    key: ProxyKey,
    origin: ProxyOrigin,
    state: ProxyState,
}

/// Placeholder for the next value of a [`ProxyKey`].
///
/// Cloning a proxy yields another handle to the same placeholder.
#[derive(Clone)]
pub struct Proxy(Rc<RefCell<ProxyInner>>);

impl Proxy {
    fn new(id: u64, key: ProxyKey, origin: ProxyOrigin) -> Self {
        Self(Rc::new(RefCell::new(ProxyInner {
            id,
            key,
            origin,
            state: ProxyState::Pending(Vec::new()),
        })))
    }

    /// Registry-wide sequence number, in request order.
    pub fn id(&self) -> u64 {
        self.0.borrow().id
    }

    /// What the proxy is waiting for.
    pub fn key(&self) -> ProxyKey {
        self.0.borrow().key.clone()
    }

    /// Where the proxy was requested.
    pub fn origin(&self) -> ProxyOrigin {
        self.0.borrow().origin.clone()
    }

    /// True once a value has been delivered.
    pub fn is_discharged(&self) -> bool {
        matches!(self.0.borrow().state, ProxyState::Discharged(_))
    }

    /// The delivered value, if any.
    pub fn value(&self) -> Option<Value> {
        match &self.0.borrow().state {
            ProxyState::Discharged(value) => Some(value.clone()),
            ProxyState::Pending(_) => None,
        }
    }

    /// Number of actions waiting for the value.
    pub fn waiting_actions(&self) -> usize {
        match &self.0.borrow().state {
            ProxyState::Pending(actions) => actions.len(),
            ProxyState::Discharged(_) => 0,
        }
    }

    /// Register an action to run with the proxy's value.
    ///
    /// If the proxy has already been discharged the action runs immediately
    /// with the stored value, exactly once.
    pub fn on_discharge<F>(&self, action: F) -> ImportResult<()>
    where
        F: FnOnce(Value) -> ImportResult<()> + 'static,
    {
        let stored = {
            let mut inner = self.0.borrow_mut();
            match &mut inner.state {
                ProxyState::Pending(actions) => {
                    actions.push(Box::new(action));
                    return Ok(());
                }
                ProxyState::Discharged(value) => value.clone(),
            }
        };
        action(stored)
    }

    /// Deliver the value and run every waiting action in registration order.
    ///
    /// A proxy is discharged at most once; later calls are ignored.
    fn discharge(&self, value: Value) -> ImportResult<()> {
        let actions = {
            let mut inner = self.0.borrow_mut();
            if let ProxyState::Discharged(_) = inner.state {
                return Ok(());
            }
            match std::mem::replace(&mut inner.state, ProxyState::Discharged(value.clone())) {
                ProxyState::Pending(actions) => actions,
                ProxyState::Discharged(_) => Vec::new(),
            }
        };

        for action in actions {
            action(value.clone())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("Proxy")
            .field("id", &inner.id)
            .field("key", &inner.key)
            .field("origin", &inner.origin)
            .field("discharged", &matches!(inner.state, ProxyState::Discharged(_)))
            .finish()
    }
}

/// A proxy that was never discharged, reported at end of stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndischargedProxy {
    /// Registry-wide sequence number.
    pub id: u64,
    /// What the proxy was waiting for.
    pub key: ProxyKey,
    /// Where it was requested.
    pub origin: ProxyOrigin,
    /// Actions that never ran.
    pub waiting_actions: usize,
}

impl fmt::Display for UndischargedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "proxy #{} for {} requested in <{}> at depth {} ({} waiting action(s))",
            self.id, self.key, self.origin.element, self.origin.depth, self.waiting_actions
        )
    }
}

/// Owns every live proxy of one import, keyed by [`ProxyKey`].
#[derive(Default)]
pub struct ProxyRegistry {
    pending: HashMap<ProxyKey, VecDeque<Proxy>>,
    next_id: u64,
    discharged: u64,
    unmatched: u64,
}

impl ProxyRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a proxy for the next value of `key`.
    ///
    /// Every request yields a distinct proxy queued behind earlier requests
    /// for the same key.
    pub fn proxy_for(&mut self, key: ProxyKey, origin: ProxyOrigin) -> Proxy {
        let proxy = Proxy::new(self.next_id, key.clone(), origin);
        self.next_id += 1;
        self.pending.entry(key).or_default().push_back(proxy.clone());
        proxy
    }

    /// Discharge the oldest pending proxy for `key` with `value`.
    ///
    /// Returns `false` when nothing was waiting for `key`; that is tolerated
    /// since many values never have a consumer.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by a discharge action.
    pub fn discharge(&mut self, key: &ProxyKey, value: Value) -> ImportResult<bool> {
        let proxy = match self.pending.get_mut(key) {
            Some(queue) => {
                let proxy = queue.pop_front();
                if queue.is_empty() {
                    self.pending.remove(key);
                }
                proxy
            }
            None => None,
        };

        match proxy {
            Some(proxy) => {
                self.discharged += 1;
                proxy.discharge(value)?;
                Ok(true)
            }
            None => {
                self.unmatched += 1;
                debug!(key = %key, "No pending proxy to discharge");
                Ok(false)
            }
        }
    }

    /// Number of pending proxies for `key`.
    pub fn pending_count(&self, key: &ProxyKey) -> usize {
        self.pending.get(key).map_or(0, VecDeque::len)
    }

    /// Number of pending proxies for all keys.
    pub fn total_pending(&self) -> usize {
        self.pending.values().map(VecDeque::len).sum()
    }

    /// Number of proxies requested so far.
    pub fn requested(&self) -> u64 {
        self.next_id
    }

    /// Number of proxies discharged so far.
    pub fn discharged(&self) -> u64 {
        self.discharged
    }

    /// Number of discharges that found no pending proxy.
    pub fn unmatched(&self) -> u64 {
        self.unmatched
    }

    /// Every pending proxy, in request order.
    pub fn undischarged(&self) -> Vec<UndischargedProxy> {
        let mut report: Vec<_> = self
            .pending
            .values()
            .flatten()
            .map(|proxy| {
                let inner = proxy.0.borrow();
                UndischargedProxy {
                    id: inner.id,
                    key: inner.key.clone(),
                    origin: inner.origin.clone(),
                    waiting_actions: match &inner.state {
                        ProxyState::Pending(actions) => actions.len(),
                        ProxyState::Discharged(_) => 0,
                    },
                }
            })
            .collect();
        report.sort_by_key(|p| p.id);
        report
    }
}

impl fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRegistry")
            .field("pending", &self.total_pending())
            .field("requested", &self.next_id)
            .field("discharged", &self.discharged)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ImportError;

    fn origin() -> ProxyOrigin {
        ProxyOrigin::new("test", 0)
    }

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&'static str) -> DischargeAction) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |label: &'static str| -> DischargeAction {
            let sink = Rc::clone(&sink);
            Box::new(move |value: Value| {
                sink.borrow_mut().push(format!("{}={}", label, value));
                Ok(())
            })
        };
        (log, make)
    }

    #[test]
    fn test_fifo_per_key() {
        let mut registry = ProxyRegistry::new();
        let (log, make) = recorder();

        let p1 = registry.proxy_for(ProxyKey::Text, origin());
        let p2 = registry.proxy_for(ProxyKey::Text, origin());
        p1.on_discharge(make("p1")).unwrap();
        p2.on_discharge(make("p2")).unwrap();

        registry.discharge(&ProxyKey::Text, "V1".into()).unwrap();
        registry.discharge(&ProxyKey::Text, "V2".into()).unwrap();

        assert_eq!(*log.borrow(), vec!["p1=V1", "p2=V2"]);
        assert_eq!(registry.total_pending(), 0);
    }

    #[test]
    fn test_actions_run_in_registration_order() {
        let mut registry = ProxyRegistry::new();
        let (log, make) = recorder();

        let proxy = registry.proxy_for(ProxyKey::record("date"), origin());
        proxy.on_discharge(make("first")).unwrap();
        proxy.on_discharge(make("second")).unwrap();
        assert_eq!(proxy.waiting_actions(), 2);

        registry
            .discharge(&ProxyKey::record("date"), "x".into())
            .unwrap();
        assert_eq!(*log.borrow(), vec!["first=x", "second=x"]);
    }

    #[test]
    fn test_late_registration_runs_immediately_once() {
        let mut registry = ProxyRegistry::new();
        let (log, make) = recorder();

        let proxy = registry.proxy_for(ProxyKey::Text, origin());
        registry.discharge(&ProxyKey::Text, "early".into()).unwrap();
        assert!(proxy.is_discharged());

        proxy.on_discharge(make("late")).unwrap();
        assert_eq!(*log.borrow(), vec!["late=early"]);

        // Further discharges of the same key do not reach the spent proxy.
        registry.discharge(&ProxyKey::Text, "other".into()).unwrap();
        assert_eq!(*log.borrow(), vec!["late=early"]);
        assert_eq!(proxy.value(), Some(Value::from("early")));
    }

    #[test]
    fn test_keys_are_independent() {
        let mut registry = ProxyRegistry::new();
        let (log, make) = recorder();

        let date = registry.proxy_for(ProxyKey::record("date"), origin());
        let extent = registry.proxy_for(ProxyKey::record("extent"), origin());
        date.on_discharge(make("date")).unwrap();
        extent.on_discharge(make("extent")).unwrap();

        registry
            .discharge(&ProxyKey::record("extent"), "e".into())
            .unwrap();
        assert_eq!(*log.borrow(), vec!["extent=e"]);
        assert_eq!(registry.pending_count(&ProxyKey::record("date")), 1);
    }

    #[test]
    fn test_discharge_without_pending_is_tolerated() {
        let mut registry = ProxyRegistry::new();
        assert!(!registry.discharge(&ProxyKey::Text, "stray".into()).unwrap());
        assert_eq!(registry.unmatched(), 1);
        assert_eq!(registry.discharged(), 0);
    }

    #[test]
    fn test_undischarged_report_in_request_order() {
        let mut registry = ProxyRegistry::new();
        let a = registry.proxy_for(ProxyKey::record("extent"), ProxyOrigin::new("extent", 2));
        registry.proxy_for(ProxyKey::Text, ProxyOrigin::new("title", 1));
        a.on_discharge(|_| Ok(())).unwrap();

        let report = registry.undischarged();
        assert_eq!(report.len(), 2);
        assert_eq!(report[0].id, 0);
        assert_eq!(report[0].key, ProxyKey::record("extent"));
        assert_eq!(report[0].waiting_actions, 1);
        assert_eq!(report[1].key, ProxyKey::Text);
        assert_eq!(
            report[1].to_string(),
            "proxy #1 for text requested in <title> at depth 1 (0 waiting action(s))"
        );
    }

    #[test]
    fn test_action_error_propagates() {
        let mut registry = ProxyRegistry::new();
        let proxy = registry.proxy_for(ProxyKey::Text, origin());
        proxy
            .on_discharge(|_| Err(ImportError::config("boom")))
            .unwrap();
        let err = registry.discharge(&ProxyKey::Text, "x".into()).unwrap_err();
        assert!(matches!(err, ImportError::Config(_)));
    }
}
