//! # contend 🧮
//!
//! Comparative tests of concurrent counter mutators: hardware **atomic
//! fetch-and-add** versus an explicit **load/CAS retry loop**, plus two
//! correctness demonstrations built from the same primitives.
//!
//! The crate includes:
//!
//! - [`CacheLine`] — a cache-line-sized block of atomic counter slots, the
//!   unit of contention.
//! - [`Strategy`] — the two interchangeable mutation strategies,
//!   [`Strategy::Atomic`] and [`Strategy::Cas`].
//! - [`run_tasks`] — the worker harness: one thread per assignment, timing
//!   reports through a bounded completion channel.
//! - [`run_benchmark`] — runs both strategies over an identical workload and
//!   reduces the reports into a side-by-side [`Comparison`].
//! - [`SlotLock`] / [`run_spin_lock_demo`] — a CAS spin lock over one
//!   counter slot that deliberately preserves its livelock hazard.
//! - [`run_ordering_probe`] — a pairwise store/load sequential-consistency
//!   check that aborts fatally on violation.
//!
//! ## ✨ Features
//!
//! - ⚙️ Identical workloads per strategy: same worker mix, same iteration
//!   count, freshly zeroed counter each pass
//! - ⏱ Per-worker loop timing plus an independently observed wall-clock
//!   span; the difference is the harness overhead, and it is never negative
//! - 🔁 Wrapping unsigned arithmetic throughout: decrementing a zero slot
//!   yields `u64::MAX` by design
//! - 🔒 A naive CAS spin lock kept naive on purpose, to demonstrate livelock
//! - 🧪 Invariant violations surface as `Result`s, not process aborts, so
//!   tests can assert on them
//!
//! ## 🚀 Quick Example
//!
//! ```rust
//! use contend::{run_benchmark, BenchConfig};
//!
//! let cmp = run_benchmark(BenchConfig {
//!     iterations: 100_000,
//!     adders: 2,
//!     subtractors: 2,
//!     queue_capacity: None,
//! });
//! // balanced workload: both strategies leave the counter where it started
//! assert_eq!(cmp.atomic.final_value, 0);
//! assert_eq!(cmp.cas.final_value, 0);
//! println!("{cmp}");
//! ```
//!
//! ## 🧠 Design
//!
//! Strategies form a small closed set behind one `apply_n` capability,
//! selected by configuration rather than function pointers. Configuration is
//! an explicit [`BenchConfig`] value passed into the entry points; there is
//! no process-global option state. Per-worker ack lines and run summaries go
//! through `tracing`, so `RUST_LOG` controls verbosity.
//!
//! ## ⚠️ Caveats
//!
//! - [`run_spin_lock_demo`] may livelock under unlucky worker/CPU ratios —
//!   that hazard is the demonstration. Apply an external timeout if you need
//!   a termination guarantee.
//! - The ordering probe busy-waits without yielding, intentionally, to
//!   stress sequential consistency under maximal contention.
//!
//! ## 📦 Modules
//!
//! - [`counter`] — the shared cache-line counter block.
//! - [`strategy`] — atomic and CAS mutation strategies.
//! - [`harness`] — worker spawning and report collection.
//! - [`runner`] — the two-pass benchmark and its comparison math.
//! - [`spinlock`] — the CAS mutual-exclusion demonstration.
//! - [`probe`] — the sequential-consistency probe.

pub mod counter;
pub mod harness;
pub mod probe;
pub mod runner;
pub mod spinlock;
pub mod strategy;

pub use counter::{CacheLine, SLOTS};
pub use harness::{run_tasks, Harvest, Task};
pub use probe::{probe_pair, run_ordering_probe, ProbeError, ProbeSlot, SeqCstSlot};
pub use runner::{run_benchmark, AggregateDelta, BenchConfig, Comparison, StrategyRun};
pub use spinlock::{run_spin_lock_demo, LockError, SlotLock};
pub use strategy::{Mutation, Report, Strategy};
