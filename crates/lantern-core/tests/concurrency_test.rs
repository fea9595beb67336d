mod common;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use common::{EvalGate, MockRuntime, test_config};
use lantern_abi::Token;
use lantern_core::Session;

/// `clear_cache` must block behind an in-flight `generate`: the session lock
/// serializes every operation, so the cache can never be cleared out from
/// under the loop.
#[test]
fn clear_cache_blocks_until_generate_finishes() {
    let gate = EvalGate::new();
    let runtime = MockRuntime::scripted(&[]).with_gate(gate.clone());
    let session = Arc::new(Session::with_runtime(runtime, &test_config()).unwrap());

    let generator = {
        let session = session.clone();
        thread::spawn(move || session.generate(&[Token(1)], 0, 0.8, None))
    };

    // The prefill evaluation is now stalled inside the critical section.
    gate.wait_entered();

    let cleared = Arc::new(AtomicBool::new(false));
    let clearer = {
        let session = session.clone();
        let cleared = cleared.clone();
        thread::spawn(move || {
            session.clear_cache();
            cleared.store(true, Ordering::SeqCst);
        })
    };

    // Give the clearer ample time to (wrongly) slip past the lock.
    thread::sleep(Duration::from_millis(100));
    assert!(
        !cleared.load(Ordering::SeqCst),
        "clear_cache ran while generate held the session lock"
    );

    gate.open();
    let generated = generator.join().unwrap().unwrap();
    assert!(generated.is_empty());

    clearer.join().unwrap();
    assert!(cleared.load(Ordering::SeqCst));
    assert_eq!(session.cache_size(), 0);
}

/// Reads serialize behind the lock too: stats observed mid-generation can
/// only come from before or after the call, never from a torn update.
#[test]
fn stats_reads_block_behind_generation() {
    let gate = EvalGate::new();
    let runtime = MockRuntime::scripted(&[]).with_gate(gate.clone());
    let session = Arc::new(Session::with_runtime(runtime, &test_config()).unwrap());

    let generator = {
        let session = session.clone();
        thread::spawn(move || session.generate(&[Token(1)], 0, 0.8, None))
    };
    gate.wait_entered();

    let reader = {
        let session = session.clone();
        thread::spawn(move || session.stats())
    };

    gate.open();
    generator.join().unwrap().unwrap();

    // The reader either waited for the call to finish (count 1) or ran
    // before it took the lock (count 0); both are consistent snapshots.
    let snap = reader.join().unwrap();
    assert!(snap.inference_count <= 1);
    assert_eq!(session.stats().inference_count, 1);
}

/// Distinct sessions never contend: a stalled generation on one session
/// cannot delay operations on another.
#[test]
fn sessions_do_not_share_a_lock() {
    let gate = EvalGate::new();
    let stalled_runtime = MockRuntime::scripted(&[]).with_gate(gate.clone());
    let stalled = Arc::new(Session::with_runtime(stalled_runtime, &test_config()).unwrap());
    let free = Session::with_runtime(MockRuntime::scripted(&[]), &test_config()).unwrap();

    let generator = {
        let stalled = stalled.clone();
        thread::spawn(move || stalled.generate(&[Token(1)], 0, 0.8, None))
    };
    gate.wait_entered();

    // Operations on the other session complete while the first is pinned.
    free.mark_boundary();
    free.clear_cache();
    assert_eq!(free.cache_size(), 0);

    gate.open();
    generator.join().unwrap().unwrap();
}
