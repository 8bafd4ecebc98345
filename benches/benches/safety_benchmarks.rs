use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use postbox::{
    pubsub::{find_unsafe, is_safe_to_publish},
    CallbackId, Value,
};

/// Дерево ширины `width` и глубины `depth`.
fn tree(
    width: usize,
    depth: usize,
) -> Value {
    if depth == 0 {
        return Value::from("leaf");
    }
    Value::List((0..width).map(|_| tree(width, depth - 1)).collect())
}

fn bench_is_safe(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_safe_to_publish");
    for &(width, depth) in &[(4usize, 3usize), (4, 6), (8, 5)] {
        let value = tree(width, depth);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{width}x{depth}")),
            &value,
            |b, v| b.iter(|| is_safe_to_publish(black_box(v))),
        );
    }
    group.finish();
}

fn bench_find_unsafe_last_leaf(c: &mut Criterion) {
    let mut value = tree(4, 6);
    if let Value::List(items) = &mut value {
        items.push(Value::Callback(CallbackId(1)));
    }
    c.bench_function("find_unsafe_last_leaf", |b| {
        b.iter(|| find_unsafe(black_box(&value)))
    });
}

criterion_group!(benches, bench_is_safe, bench_find_unsafe_last_leaf);
criterion_main!(benches);
