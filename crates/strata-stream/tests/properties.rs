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

//! Property tests for proxy ordering and record nesting

use proptest::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use strata_core::{PropertyType, RecordRef, RecordSchema, SchemaRegistry, Value};
use strata_stream::{
    events, ElementNode, HandlerTable, ImportConfig, ImportResult, ImportScope, Importer,
    NodeEvent, ProxyKey, ProxyOrigin, ProxyRegistry,
};

#[derive(Debug, Clone, PartialEq)]
struct Tree {
    name: String,
    children: Vec<Tree>,
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = "[abc]".prop_map(|name| Tree {
        name,
        children: Vec::new(),
    });
    leaf.prop_recursive(5, 48, 4, |inner| {
        ("[abc]", prop::collection::vec(inner, 0..4))
            .prop_map(|(name, children)| Tree { name, children })
    })
}

fn flatten(tree: &Tree, depth: usize, out: &mut Vec<NodeEvent>) {
    out.push(NodeEvent::open(tree.name.clone(), depth));
    for child in &tree.children {
        flatten(child, depth + 1, out);
    }
    out.push(NodeEvent::close(tree.name.clone(), depth));
}

fn rebuild(record: &RecordRef) -> Tree {
    let name = record
        .get("name")
        .map(|v| v.to_string())
        .unwrap_or_default();
    let children = record
        .get("children")
        .and_then(|v| v.as_list().map(|items| items.to_vec()))
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_record().map(rebuild))
        .collect();
    Tree { name, children }
}

fn node_handler(scope: &mut ImportScope<'_>, node: &ElementNode) -> ImportResult<()> {
    let record = scope.open("node")?;
    scope.set_property(&record, "name", node.name.as_str())?;
    if scope.ancestor_of(&["node"]).is_some() {
        scope.set_ancestor_property(&["node"], "children", record)?;
    }
    Ok(())
}

fn tree_import(stream: Vec<NodeEvent>) -> ImportResult<Vec<RecordRef>> {
    let schema = SchemaRegistry::new()
        .with(
            RecordSchema::builder("node")
                .property("name", PropertyType::string())
                .property("children", PropertyType::record("node").list())
                .build(),
        )?;
    let handlers = HandlerTable::builder()
        .on("a", node_handler)
        .on("b", node_handler)
        .on("c", node_handler)
        .build()?;

    Ok(Importer::new(events(stream), schema, handlers, ImportConfig::default())
        .run()?
        .records)
}

proptest! {
    #[test]
    fn prop_fifo_discharge(values in prop::collection::vec("[a-z]{1,8}", 1..20)) {
        let mut registry = ProxyRegistry::new();
        let received = Rc::new(RefCell::new(vec![None; values.len()]));

        for i in 0..values.len() {
            let proxy = registry.proxy_for(ProxyKey::Text, ProxyOrigin::new("p", i));
            let sink = Rc::clone(&received);
            proxy.on_discharge(move |value| {
                sink.borrow_mut()[i] = Some(value);
                Ok(())
            }).unwrap();
        }
        for value in &values {
            prop_assert!(registry.discharge(&ProxyKey::Text, Value::from(value.as_str())).unwrap());
        }

        let expected: Vec<_> = values.iter().map(|v| Some(Value::from(v.as_str()))).collect();
        prop_assert_eq!(&*received.borrow(), &expected);
        prop_assert_eq!(registry.total_pending(), 0);
    }

    #[test]
    fn prop_fifo_interleaved_keys(order in prop::collection::vec(any::<bool>(), 1..30)) {
        let mut registry = ProxyRegistry::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (i, is_text) in order.iter().enumerate() {
            let key = if *is_text { ProxyKey::Text } else { ProxyKey::record("date") };
            let proxy = registry.proxy_for(key, ProxyOrigin::new("p", i));
            let sink = Rc::clone(&log);
            proxy.on_discharge(move |value| {
                sink.borrow_mut().push((i, value));
                Ok(())
            }).unwrap();
        }

        // Discharging one key never disturbs the other key's queue.
        let texts: Vec<_> = order.iter().enumerate().filter(|(_, t)| **t).map(|(i, _)| i).collect();
        for n in 0..texts.len() {
            registry.discharge(&ProxyKey::Text, Value::Int(n as i64)).unwrap();
        }
        let log = log.borrow();
        prop_assert_eq!(log.len(), texts.len());
        for (n, (i, value)) in log.iter().enumerate() {
            prop_assert_eq!(*i, texts[n]);
            prop_assert_eq!(value, &Value::Int(n as i64));
        }
        prop_assert_eq!(
            registry.pending_count(&ProxyKey::record("date")),
            order.len() - texts.len()
        );
    }

    #[test]
    fn prop_late_registration_runs_once(value in "[a-z]{1,8}", late in 1usize..5) {
        let mut registry = ProxyRegistry::new();
        let proxy = registry.proxy_for(ProxyKey::Text, ProxyOrigin::new("p", 0));
        registry.discharge(&ProxyKey::Text, Value::from(value.as_str())).unwrap();

        let calls = Rc::new(RefCell::new(0usize));
        for _ in 0..late {
            let calls = Rc::clone(&calls);
            proxy.on_discharge(move |_| {
                *calls.borrow_mut() += 1;
                Ok(())
            }).unwrap();
        }
        registry.discharge(&ProxyKey::Text, Value::from("again")).unwrap();
        prop_assert_eq!(*calls.borrow(), late);
    }

    #[test]
    fn prop_nesting_is_reconstructed(root in tree()) {
        let mut stream = Vec::new();
        flatten(&root, 0, &mut stream);

        let records = tree_import(stream).unwrap();
        prop_assert_eq!(records.len(), 1);
        prop_assert_eq!(rebuild(&records[0]), root);
    }

    #[test]
    fn prop_truncated_stream_fails(root in tree(), cut in 1usize..8) {
        let mut stream = Vec::new();
        flatten(&root, 0, &mut stream);
        let keep = stream.len().saturating_sub(cut).max(1);
        stream.truncate(keep);

        let err = tree_import(stream).unwrap_err();
        prop_assert!(err.is_structural());
    }
}

#[test]
fn test_siblings_of_same_name() {
    let stream = vec![
        NodeEvent::open("a", 0),
        NodeEvent::open("b", 1),
        NodeEvent::close("b", 1),
        NodeEvent::open("b", 1),
        NodeEvent::close("b", 1),
        NodeEvent::close("a", 0),
    ];
    let records = tree_import(stream).unwrap();
    let tree = rebuild(&records[0]);
    assert_eq!(tree.children.len(), 2);
    assert!(tree.children.iter().all(|c| c.name == "b"));
}
