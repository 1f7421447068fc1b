use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};

use studyguide_core::model::IndexBase;
use studyguide_core::normalize::{normalize, normalize_with, NormalizeOptions};

fn array_bank(n: usize) -> Value {
    let questions: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "id": format!("q{i}"),
                "stem": format!("Which option is number {i}?"),
                "options": ["first", "second", "third", "fourth"],
                "correct": ["B"],
                "rationale": "Second is always right here.",
            })
        })
        .collect();
    json!({ "questions": questions })
}

fn lettered_bank(n: usize) -> Value {
    let questions: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "question": format!("Lettered question {i}"),
                "A": "alpha",
                "B": "beta",
                "C": "gamma",
                "D": "delta",
                "answer": if i % 2 == 0 { "A, C" } else { "2" },
                "type": "multi",
            })
        })
        .collect();
    json!({ "data": { "items": questions } })
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    let small = array_bank(10);
    let large = array_bank(1000);
    let lettered = lettered_bank(500);
    let one_based = NormalizeOptions {
        index_base: IndexBase::One,
    };

    group.bench_function("array_10", |b| b.iter(|| normalize(black_box(&small))));

    group.bench_function("array_1000", |b| b.iter(|| normalize(black_box(&large))));

    group.bench_function("lettered_500", |b| {
        b.iter(|| normalize_with(black_box(&lettered), black_box(&one_based)))
    });

    group.finish();
}

criterion_group!(benches, bench_normalize);
criterion_main!(benches);
