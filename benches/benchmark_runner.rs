/// Benchmark runner for the callback bridge.
///
/// Times end-to-end callback dispatch and raw registry churn.

extern crate just_bridge;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use just_bridge::runner::binary_value::{BinaryValue, BinaryValueFactory};
use just_bridge::runner::callback::registry::{JsCallbackCallerRegistry, RegistryConfig};
use just_bridge::runner::config::RuntimeConfig;
use just_bridge::runner::session::JsSession;

/// Call one minted callback `iterations` times with `args`.
fn run_dispatch(args: &[BinaryValue], iterations: u32) -> Duration {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let session = JsSession::new(
        &RuntimeConfig::default(),
        Arc::new(move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
        }),
    )
    .expect("Failed to create session");
    let callback = session
        .make_js_callback(1)
        .expect("Failed to mint callback");

    let start = Instant::now();
    for _ in 0..iterations {
        let _ = session.call_function(&callback, args.to_vec());
    }
    let elapsed = start.elapsed();

    assert_eq!(hits.load(Ordering::Relaxed), iterations as usize);
    elapsed
}

/// Register and unregister `iterations` callers on a private registry.
fn run_registry_churn(iterations: u32) -> Duration {
    let registry = JsCallbackCallerRegistry::new(&RegistryConfig { max_callers: None });
    let bv_factory = Arc::new(BinaryValueFactory::default());

    let start = Instant::now();
    for _ in 0..iterations {
        let id = registry
            .register(bv_factory.clone(), Arc::new(|_, _| {}))
            .expect("Failed to register caller");
        registry.unregister(id);
    }
    start.elapsed()
}

/// Create and drop whole sessions.
fn run_session_churn(iterations: u32) -> Duration {
    let start = Instant::now();
    for _ in 0..iterations {
        let session = JsSession::new(&RuntimeConfig::default(), Arc::new(|_, _| {}))
            .expect("Failed to create session");
        let _ = session.make_js_callback(1);
    }
    start.elapsed()
}

fn report(name: &str, elapsed: Duration, iterations: u32) {
    let per_op = elapsed.as_nanos() / iterations.max(1) as u128;
    println!("{:<36} {:>10.2?} total {:>8} ns/op", name, elapsed, per_op);
}

fn main() {
    println!("=======================================================");
    println!("  just-bridge - Callback Benchmarks");
    println!("=======================================================\n");

    let no_args: Vec<BinaryValue> = vec![];
    let few_args = vec![
        BinaryValue::Integer(1),
        BinaryValue::String("two".to_string()),
        BinaryValue::Bool(true),
    ];
    let nested_args = vec![BinaryValue::Array(
        (0..32)
            .map(|i| BinaryValue::Array(vec![BinaryValue::Integer(i), BinaryValue::Double(0.5)]))
            .collect(),
    )];

    let iterations = 100_000;
    report("Dispatch (no args)", run_dispatch(&no_args, iterations), iterations);
    report("Dispatch (3 args)", run_dispatch(&few_args, iterations), iterations);
    report("Dispatch (32x2 nested)", run_dispatch(&nested_args, 10_000), 10_000);
    report("Registry churn", run_registry_churn(iterations), iterations);
    report("Session churn", run_session_churn(10_000), 10_000);
}
