//! Benchmarks for reshaping backend rows into canonical records.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eeu_complaints::api::normalize::Normalizer;
use eeu_complaints::api::DemoStore;
use eeu_complaints::utils::text_processing::split_list;
use serde_json::{json, Value};

fn raw_complaints(count: usize) -> Value {
    let demo = DemoStore::seeded(Utc::now());
    let rows: Vec<Value> = demo
        .complaints()
        .iter()
        .cycle()
        .take(count)
        .map(|complaint| {
            json!({
                "ID": complaint.id,
                "Title": complaint.title,
                "Category": complaint.category.label(),
                "Priority": complaint.priority.as_str().to_uppercase(),
                "Status": complaint.status.as_str().replace('_', " "),
                "Region": complaint.region,
                "Created At": complaint.created_at,
                "Customer Name": complaint.customer.name,
                "Notes": complaint.notes.join(", "),
            })
        })
        .collect();
    Value::Array(rows)
}

fn bench_normalize_complaints(c: &mut Criterion) {
    let normalizer = Normalizer::new();
    let data = raw_complaints(500);
    c.bench_function("normalize_500_complaints", |b| {
        b.iter(|| normalizer.many(Some(black_box(&data)), Normalizer::complaint))
    });
}

fn bench_split_list(c: &mut Criterion) {
    let text = "Called customer, Technician dispatched, Meter replaced, Customer confirmed";
    c.bench_function("split_notes", |b| b.iter(|| split_list(black_box(text))));
}

criterion_group!(benches, bench_normalize_complaints, bench_split_list);
criterion_main!(benches);
