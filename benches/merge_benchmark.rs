// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use criterion::{Criterion, criterion_group, criterion_main};
use docmerge::{DocumentPackage, EngineConfig, MergeEngine, MergeOptions, PackagePart, parse};
use serde_json::{Value, json};
use std::hint::black_box;

fn rows(count: usize) -> Value {
    let rows: Vec<_> = (0..count)
        .map(|i| {
            json!({
                "name": format!("Item {i}"),
                "qty": i % 7 + 1,
                "price": 3.25 * (i % 13) as f64,
                "shipped": format!("{:02}/{:02}/2024", i % 28 + 1, i % 12 + 1),
            })
        })
        .collect();
    json!({"customer": {"name": "Ada"}, "rows": rows})
}

fn template() -> DocumentPackage {
    let body = concat!(
        "<w:p><w:r><w:t>Invoice for {customer.name | upper}</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>{#rows}</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>{$index + 1}. {name}: {qty} x {price | currency} = </w:t></w:r>",
        "<w:r><w:t>{qty * price | number:2} ({shipped | date:'yyyy-MM-dd'})</w:t></w:r></w:p>",
        "<w:p><w:r><w:t>{/rows}</w:t></w:r></w:p>",
    );
    DocumentPackage::from_parts(vec![PackagePart::new(
        "word/document.xml",
        format!("<w:document><w:body>{body}</w:body></w:document>"),
    )])
}

fn benchmark_parser(c: &mut Criterion) {
    let expression = "qty * price > 100 ? (total | currency) : 'small' | upper";

    c.bench_function("parser", |b| {
        b.iter(|| black_box(parse(black_box(expression))))
    });
}

fn benchmark_large_section(c: &mut Criterion) {
    let template = template();
    let data = rows(1_000);
    let options = MergeOptions::paragraphs();

    let cached = MergeEngine::default();
    c.bench_function("merge_1000_rows", |b| {
        b.iter(|| black_box(cached.merge(black_box(&template), &data, &options)))
    });

    let uncached = MergeEngine::new(EngineConfig::no_cache());
    c.bench_function("merge_1000_rows_no_cache", |b| {
        b.iter(|| black_box(uncached.merge(black_box(&template), &data, &options)))
    });
}

fn benchmark_zip_round_trip(c: &mut Criterion) {
    let engine = MergeEngine::default();
    let bytes = template().write_zip().unwrap_or_default();
    let data = rows(100);
    let options = MergeOptions::default();

    c.bench_function("merge_bytes_100_rows", |b| {
        b.iter(|| black_box(engine.merge_bytes(black_box(&bytes), &data, &options)))
    });
}

criterion_group!(
    benches,
    benchmark_parser,
    benchmark_large_section,
    benchmark_zip_round_trip
);
criterion_main!(benches);
