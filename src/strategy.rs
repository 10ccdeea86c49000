//! # Mutation strategies
//!
//! Two interchangeable ways of applying N logical increments (or decrements)
//! to one slot of a [`CacheLine`]:
//!
//! - [`Strategy::Atomic`] — one hardware fetch-and-add per logical op.
//!   Unconditional progress: every op completes in a bounded number of steps
//!   regardless of what other threads do.
//! - [`Strategy::Cas`] — a load / compute / compare-exchange retry loop with
//!   a cooperative yield on contention. Lock-free but not wait-free: a single
//!   worker can be delayed indefinitely by others winning the race, though at
//!   least one contending writer succeeds per contended round.
//!
//! Both strategies use wrapping unsigned arithmetic; decrementing a zero slot
//! yields `u64::MAX` by design, not an error.
//!
//! The strategy set is closed on purpose: callers select a variant through
//! configuration rather than passing function pointers around.

use core::sync::atomic::Ordering::SeqCst;
use std::thread;
use std::time::Instant;

use crate::counter::CacheLine;

/// How a logical mutation is applied to the shared slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Hardware atomic fetch-and-add.
    Atomic,
    /// Load-modify-CAS retry loop, yielding on contention.
    Cas,
}

/// Direction of the logical mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    Increment,
    Decrement,
}

/// Timing report emitted exactly once by each worker after its loop.
#[derive(Clone, Debug)]
pub struct Report {
    /// Which strategy/mutation pair produced this report.
    pub name: &'static str,
    /// Wall time of the N-iteration loop itself, excluding spawn latency.
    pub elapsed_nanos: u64,
}

impl Strategy {
    /// Worker name for a given mutation direction, used in reports and logs.
    pub fn worker_name(self, mutation: Mutation) -> &'static str {
        match (self, mutation) {
            (Strategy::Atomic, Mutation::Increment) => "atomic-add",
            (Strategy::Atomic, Mutation::Decrement) => "atomic-sub",
            (Strategy::Cas, Mutation::Increment) => "cas-add",
            (Strategy::Cas, Mutation::Decrement) => "cas-sub",
        }
    }

    /// Applies exactly `iters` logical mutations to `line.slot(slot)` and
    /// returns the worker's timing report.
    ///
    /// The timestamps bracket only the mutation loop; thread-spawn latency is
    /// accounted for separately by the harness's observed span.
    pub fn apply_n(self, line: &CacheLine, slot: usize, mutation: Mutation, iters: u64) -> Report {
        let ptr = line.slot(slot);
        let name = self.worker_name(mutation);

        let start = Instant::now();
        match (self, mutation) {
            (Strategy::Atomic, Mutation::Increment) => {
                for _ in 0..iters {
                    ptr.fetch_add(1, SeqCst);
                }
            }
            (Strategy::Atomic, Mutation::Decrement) => {
                // fetch-and-add of the two's complement of 1
                for _ in 0..iters {
                    ptr.fetch_add(1u64.wrapping_neg(), SeqCst);
                }
            }
            (Strategy::Cas, Mutation::Increment) => {
                for _ in 0..iters {
                    loop {
                        let cur = ptr.load(SeqCst);
                        let next = cur.wrapping_add(1);
                        if ptr.compare_exchange(cur, next, SeqCst, SeqCst).is_ok() {
                            break;
                        }
                        thread::yield_now();
                    }
                }
            }
            (Strategy::Cas, Mutation::Decrement) => {
                for _ in 0..iters {
                    loop {
                        let cur = ptr.load(SeqCst);
                        let next = cur.wrapping_sub(1);
                        if ptr.compare_exchange(cur, next, SeqCst, SeqCst).is_ok() {
                            break;
                        }
                        thread::yield_now();
                    }
                }
            }
        }
        let elapsed_nanos = start.elapsed().as_nanos() as u64;

        Report { name, elapsed_nanos }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_applies_exact_count() {
        let line = CacheLine::new();
        let rpt = Strategy::Atomic.apply_n(&line, 0, Mutation::Increment, 10_000);
        assert_eq!(line.load(0), 10_000);
        assert_eq!(rpt.name, "atomic-add");
    }

    #[test]
    fn test_cas_applies_exact_count() {
        let line = CacheLine::new();
        let rpt = Strategy::Cas.apply_n(&line, 0, Mutation::Increment, 10_000);
        assert_eq!(line.load(0), 10_000);
        assert_eq!(rpt.name, "cas-add");
    }

    #[test]
    fn test_decrement_wraps_below_zero() {
        // Decrementing a zeroed slot is permitted and wraps.
        let line = CacheLine::new();
        Strategy::Atomic.apply_n(&line, 0, Mutation::Decrement, 1);
        assert_eq!(line.load(0), u64::MAX);

        let line = CacheLine::new();
        Strategy::Cas.apply_n(&line, 0, Mutation::Decrement, 3);
        assert_eq!(line.load(0), u64::MAX - 2);
    }

    #[test]
    fn test_strategies_are_functionally_equivalent() {
        let a = CacheLine::new();
        let b = CacheLine::new();
        Strategy::Atomic.apply_n(&a, 2, Mutation::Increment, 5_000);
        Strategy::Atomic.apply_n(&a, 2, Mutation::Decrement, 1_000);
        Strategy::Cas.apply_n(&b, 2, Mutation::Increment, 5_000);
        Strategy::Cas.apply_n(&b, 2, Mutation::Decrement, 1_000);
        assert_eq!(a.load(2), b.load(2));
        assert_eq!(a.load(2), 4_000);
    }

    #[test]
    fn test_zero_iterations_is_a_noop() {
        let line = CacheLine::new();
        let rpt = Strategy::Cas.apply_n(&line, 0, Mutation::Decrement, 0);
        assert_eq!(line.load(0), 0);
        assert_eq!(rpt.name, "cas-sub");
    }
}
