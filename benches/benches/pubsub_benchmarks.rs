use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use postbox::{
    pubsub::receiver_fn, DispatchMode, Hub, Origin, OriginFilter, PubSubConfig,
    SubscriptionRegistry, Value,
};

fn payload() -> Value {
    Value::map([
        ("kind", Value::from("update")),
        ("items", Value::List((0..16).map(Value::from).collect())),
        ("meta", Value::map([("page", Value::from(3)), ("ok", Value::from(true))])),
    ])
}

/// Реестр с `hubs` hub-ами по одному слушателю.
fn populated(
    mode: DispatchMode,
    hubs: usize,
) -> (Arc<SubscriptionRegistry>, Vec<Hub>) {
    let registry = SubscriptionRegistry::new(PubSubConfig::default().with_dispatch(mode));
    let hubs = (0..hubs)
        .map(|i| {
            let hub = Hub::with_origin(&registry, Origin::new(format!("http://www.h{i}.com")));
            hub.subscribe(
                receiver_fn(|env| {
                    black_box(env.data());
                    Ok(())
                }),
                OriginFilter::Any,
            );
            hub
        })
        .collect();
    (registry, hubs)
}

fn bench_publish_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fan_out");
    let data = payload();

    for &n in &[1usize, 10, 100] {
        for mode in [DispatchMode::Locked, DispatchMode::Snapshot] {
            let (_registry, hubs) = populated(mode, n);
            group.bench_with_input(BenchmarkId::new(format!("{mode:?}"), n), &n, |b, _| {
                b.iter(|| {
                    hubs[0]
                        .publish(black_box(&data), &OriginFilter::Any)
                        .unwrap()
                })
            });
        }
    }
    group.finish();
}

fn bench_publish_targeted(c: &mut Criterion) {
    let (_registry, hubs) = populated(DispatchMode::Locked, 100);
    let data = payload();
    let target = OriginFilter::parse("http://www.h42.com");
    c.bench_function("publish_targeted_100_hubs", |b| {
        b.iter(|| hubs[0].publish(black_box(&data), &target).unwrap())
    });
}

fn bench_subscribe_unsubscribe(c: &mut Criterion) {
    let registry = SubscriptionRegistry::new(PubSubConfig::default());
    let hub = Hub::with_origin(&registry, Origin::new("http://www.a.com"));
    c.bench_function("subscribe_unsubscribe", |b| {
        b.iter(|| {
            let id = hub.subscribe(receiver_fn(|_| Ok(())), OriginFilter::Any);
            black_box(hub.unsubscribe(id));
        })
    });
}

criterion_group!(
    benches,
    bench_publish_fan_out,
    bench_publish_targeted,
    bench_subscribe_unsubscribe
);
criterion_main!(benches);
