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

//! Driver throughput over synthetic accession documents.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use strata_core::{PropertyType, RecordSchema, SchemaRegistry};
use strata_stream::{EventSource, HandlerTable, ImportConfig, Importer, XmlEventReader};

fn schema() -> Arc<SchemaRegistry> {
    let registry = SchemaRegistry::new()
        .with(
            RecordSchema::builder("accession")
                .property("title", PropertyType::string())
                .property("publish", PropertyType::boolean())
                .property("dates", PropertyType::record("date").list())
                .default_value("publish", "false")
                .build(),
        )
        .and_then(|r| {
            r.with(
                RecordSchema::builder("date")
                    .property("begin", PropertyType::date())
                    .property("expression", PropertyType::string())
                    .build(),
            )
        })
        .expect("valid schema");
    Arc::new(registry)
}

fn handlers() -> Arc<HandlerTable> {
    let table = HandlerTable::builder()
        .on("accession", |scope, node| {
            let record = scope.open("accession")?;
            if let Some(publish) = node.attribute("publish") {
                scope.set_property(&record, "publish", publish)?;
            }
            Ok(())
        })
        .on("title", |scope, _| {
            let text = scope.inner_text();
            scope.set_context_property("title", text)
        })
        .on("date", |scope, _| {
            let date = scope.proxy_for("date");
            scope.set_ancestor_property(&["accession"], "dates", date)?;
            scope.open("date").map(|_| ())
        })
        .on("begin", |scope, _| {
            let text = scope.inner_text();
            scope.set_context_property("begin", text)
        })
        .build()
        .expect("valid handlers");
    Arc::new(table)
}

fn generate(records: usize) -> String {
    let mut xml = String::with_capacity(records * 160);
    xml.push_str("<?xml version=\"1.0\"?>\n<accessions>\n");
    for i in 0..records {
        xml.push_str(&format!(
            "  <accession publish=\"{}\">\n    <title>Accession {}</title>\n    <date><begin>19{:02}</begin></date>\n    <notes>unhandled</notes>\n  </accession>\n",
            if i % 2 == 0 { "yes" } else { "no" },
            i,
            i % 100
        ));
    }
    xml.push_str("</accessions>\n");
    xml
}

fn bench_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("reader");
    let config = ImportConfig::default();

    for size in [100, 1_000, 10_000] {
        let xml = generate(size);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &xml, |b, xml| {
            b.iter(|| {
                let mut reader = XmlEventReader::from_str(black_box(xml), &config);
                let mut count = 0usize;
                while let Ok(Some(_)) = reader.next_event() {
                    count += 1;
                }
                count
            })
        });
    }
    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut group = c.benchmark_group("import");
    let schema = schema();
    let handlers = handlers();

    for size in [100, 1_000, 10_000] {
        let xml = generate(size);
        group.throughput(Throughput::Bytes(xml.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &xml, |b, xml| {
            b.iter(|| {
                let importer = Importer::from_str(
                    black_box(xml),
                    Arc::clone(&schema),
                    Arc::clone(&handlers),
                    ImportConfig::default(),
                );
                importer.filter_map(Result::ok).count()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_reader, bench_import);
criterion_main!(benches);
