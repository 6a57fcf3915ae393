//! # Context Bridge Benchmarks
//!
//! | Area | Measured |
//! |------|----------|
//! | Messaging | One request/response round trip through the runtime |
//! | Messaging | Fan-out to N targets plus one broadcast |
//! | Storage | Plain and encrypted single-key writes and reads |
//! | Storage | Batched writes of N keys |

use cb_01_messaging::{
    define_protocol, HandlerMap, ListenerConfig, MessageListener, Messenger, RuntimeChannel,
};
use cb_02_storage::StoreContext;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Map, Value};
use shared_bus::InMemoryRuntime;
use shared_crypto::StorageCodec;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

define_protocol! {
    pub protocol BenchProtocol: BenchCalls {
        echo => Echo("echo"): String => String;
    }
}

fn echo_handlers() -> HandlerMap<BenchProtocol> {
    HandlerMap::new().on::<Echo, _, _>(|ctx| async move {
        let data = ctx.data.clone();
        ctx.respond(data)
    })
}

fn rt() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

// ============================================================================
// Messaging
// ============================================================================

fn bench_round_trip(c: &mut Criterion) {
    let rt = rt();
    let mut group = c.benchmark_group("cb-01-messaging");
    group.measurement_time(Duration::from_secs(5));

    let runtime = InMemoryRuntime::new();
    let (_listener, messenger) = rt.block_on(async {
        let coordinator: Arc<dyn RuntimeChannel> = Arc::new(runtime.coordinator());
        let listener =
            MessageListener::new(coordinator, ListenerConfig::background(), echo_handlers());
        listener.listen();
        let page: Arc<dyn RuntimeChannel> = Arc::new(runtime.page());
        (listener, Messenger::<BenchProtocol>::to_background(page))
    });

    group.bench_function("round_trip", |b| {
        b.iter(|| {
            rt.block_on(async {
                black_box(messenger.echo("ping".to_string()).await.expect("echo"))
            })
        })
    });

    for targets in [1u32, 8, 32] {
        let runtime = InMemoryRuntime::new();
        let (_views, messenger) = rt.block_on(async {
            let mut views = Vec::new();
            for id in 1..=targets {
                let port: Arc<dyn RuntimeChannel> =
                    Arc::new(runtime.target(id, &format!("https://example.com/{id}")));
                let view = MessageListener::new(port, ListenerConfig::view(), echo_handlers());
                view.listen();
                views.push(view);
            }
            let page: Arc<dyn RuntimeChannel> = Arc::new(runtime.page());
            let view = MessageListener::new(page, ListenerConfig::view(), echo_handlers());
            view.listen();
            views.push(view);

            let coordinator: Arc<dyn RuntimeChannel> = Arc::new(runtime.coordinator());
            (views, Messenger::<BenchProtocol>::to_views(coordinator))
        });

        group.throughput(Throughput::Elements(u64::from(targets) + 1));
        group.bench_with_input(BenchmarkId::new("fan_out", targets), &targets, |b, _| {
            b.iter(|| {
                rt.block_on(async {
                    black_box(
                        messenger
                            .call_all::<Echo>("ping".to_string())
                            .await
                            .expect("fan-out"),
                    )
                })
            })
        });
    }

    group.finish();
}

// ============================================================================
// Storage
// ============================================================================

fn defaults(keys: usize) -> Value {
    let mut map = Map::new();
    for i in 0..keys {
        map.insert(format!("key_{i}"), json!(0));
    }
    Value::Object(map)
}

fn bench_store(c: &mut Criterion) {
    let rt = rt();
    let mut group = c.benchmark_group("cb-02-storage");
    group.measurement_time(Duration::from_secs(5));

    for encrypted in [false, true] {
        let mut context = StoreContext::in_memory();
        if encrypted {
            context = context.with_codec(StorageCodec::from_secret(Some("bench")).expect("codec"));
        }
        let store = context
            .local_store::<Value>("bench", defaults(1), encrypted)
            .expect("store");
        let label = if encrypted { "encrypted" } else { "plain" };

        group.bench_function(BenchmarkId::new("set_get", label), |b| {
            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                rt.block_on(async {
                    store.set("key_0", Some(n)).await.expect("set");
                    black_box(store.get::<u64>("key_0").await.expect("get"))
                })
            })
        });
    }

    for keys in [10usize, 100] {
        let context = StoreContext::in_memory();
        let store = context
            .local_store::<Value>("batch", defaults(keys), false)
            .expect("store");

        group.throughput(Throughput::Elements(keys as u64));
        group.bench_with_input(BenchmarkId::new("set_many", keys), &keys, |b, &keys| {
            let mut n = 0u64;
            b.iter(|| {
                n += 1;
                let entries: Vec<(String, Option<Value>)> = (0..keys)
                    .map(|i| (format!("key_{i}"), Some(json!(n))))
                    .collect();
                rt.block_on(async { store.set_many(entries).await.expect("set_many") })
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_round_trip, bench_store);
criterion_main!(benches);
