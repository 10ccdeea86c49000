//! Demo binary for the `contend` crate.
//!
//! Runs the atomic-versus-CAS counter benchmark with default settings,
//! then the sequential-consistency probe, then the spin-lock demonstration
//! under a watchdog timeout (the demo may livelock by design — that is what
//! it demonstrates).
//!
//! Verbosity is controlled through `RUST_LOG`, e.g. `RUST_LOG=contend=debug`
//! to see per-worker ack lines.

use std::process;
use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use contend::{run_benchmark, run_ordering_probe, run_spin_lock_demo, BenchConfig};

const SPIN_LOCK_WORKERS: usize = 8;
const SPIN_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("comparative test of concurrent counter mutators: explicit CAS vs atomic adders");

    let cmp = run_benchmark(BenchConfig {
        iterations: 1_000_000,
        adders: 2,
        subtractors: 2,
        queue_capacity: None,
    });
    println!("\n---------------------");
    print!("{cmp}");

    println!("\nordering probe (2 pairs, 1000 rounds each)");
    match run_ordering_probe(2, 1_000) {
        Ok(()) => println!("ordering probe - done"),
        Err(e) => {
            eprintln!("ordering probe failed: {e}");
            process::exit(1);
        }
    }

    println!("\nspin lock demo ({SPIN_LOCK_WORKERS} workers, {SPIN_LOCK_TIMEOUT:?} watchdog)");
    // The demo can livelock, and livelocked threads cannot be reclaimed, so
    // the watchdog exits the process instead of joining them.
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    thread::spawn(move || {
        let _ = done_tx.send(run_spin_lock_demo(SPIN_LOCK_WORKERS));
    });
    match done_rx.recv_timeout(SPIN_LOCK_TIMEOUT) {
        Ok(Ok(())) => println!("spin lock demo - done"),
        Ok(Err(e)) => {
            eprintln!("spin lock demo failed: {e}");
            process::exit(1);
        }
        Err(_) => {
            println!("spin lock demo - no progress within the watchdog window (livelocked)");
            process::exit(2);
        }
    }
}
