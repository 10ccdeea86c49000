//! # Ordering probe
//!
//! A pairwise store/load protocol that asserts sequential consistency of
//! atomic stores and loads under maximal contention.
//!
//! Each worker of a pair runs N rounds. In round `i` a worker stores `i`
//! into its own published slot, loads its partner's published slot as
//! `mine`, publishes `mine` into an acknowledgment ring slot keyed by
//! `i % 3` (three slots so a value is never overwritten before the partner
//! consumes it), then busy-waits — a tight spin, never a yield — until the
//! partner's matching ring slot leaves the `-1` sentinel, and reads it as
//! `theirs`.
//!
//! Invariants checked every round:
//! - `mine` is `i` or `i - 1`,
//! - `theirs` is `i` or `i - 1`,
//! - at least one of `mine == i` / `theirs == i` holds (both cannot lag).
//!
//! A violation is fatal to the probe: it signals that the underlying
//! store/load primitives are not sequentially consistent, and it is reported
//! with the round index and both observed values rather than retried.
//!
//! The published slots go through the small [`ProbeSlot`] seam so tests can
//! substitute a deliberately stale cell and confirm the probe actually
//! detects violations instead of vacuously passing.

use core::sync::atomic::{AtomicI32, Ordering::SeqCst};
use std::hint::spin_loop;
use std::thread;

use thiserror::Error;
use tracing::{info, warn};

const ACK_SENTINEL: i32 = -1;
// Written to every own ring slot on the way out of a failed round, so a
// partner mid-wait observes an impossible value and fails too instead of
// spinning forever.
const ACK_POISON: i32 = -2;

/// Fatal probe outcome: the observed values broke the round invariants.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProbeError {
    #[error("store/load not sequentially consistent at round {round}: mine={mine} theirs={theirs}")]
    SequentialConsistencyViolation { round: i32, mine: i32, theirs: i32 },
}

/// The store/load cell a probe worker publishes through.
pub trait ProbeSlot: Sync {
    fn publish(&self, value: i32);
    fn observe(&self) -> i32;
}

/// The production cell: a sequentially consistent atomic.
#[derive(Debug, Default)]
pub struct SeqCstSlot(AtomicI32);

impl SeqCstSlot {
    #[inline(always)]
    pub const fn new(value: i32) -> Self {
        SeqCstSlot(AtomicI32::new(value))
    }
}

impl ProbeSlot for SeqCstSlot {
    #[inline(always)]
    fn publish(&self, value: i32) {
        self.0.store(value, SeqCst);
    }

    #[inline(always)]
    fn observe(&self) -> i32 {
        self.0.load(SeqCst)
    }
}

fn probe_worker<S: ProbeSlot>(
    me: usize,
    x: &[S; 2],
    ack: &[[AtomicI32; 3]; 2],
    rounds: i32,
) -> Result<(), ProbeError> {
    let he = 1 - me;
    for i in 1..=rounds {
        x[me].publish(i);
        let mine = x[he].observe();
        ack[me][(i % 3) as usize].store(mine, SeqCst);
        while ack[he][(i % 3) as usize].load(SeqCst) == ACK_SENTINEL {
            // tight on purpose: yielding here would mask ordering bugs
            spin_loop();
        }
        let theirs = ack[he][(i % 3) as usize].load(SeqCst);

        let out_of_range = (mine != i && mine != i - 1) || (theirs != i && theirs != i - 1);
        let both_lag = mine != i && theirs != i;
        if out_of_range || both_lag {
            for slot in &ack[me] {
                slot.store(ACK_POISON, SeqCst);
            }
            return Err(ProbeError::SequentialConsistencyViolation {
                round: i,
                mine,
                theirs,
            });
        }

        ack[me][((i - 1) % 3) as usize].store(ACK_SENTINEL, SeqCst);
    }
    Ok(())
}

/// Runs one worker pair over the given published slots for `rounds` rounds.
///
/// The acknowledgment ring is always made of sequentially consistent
/// atomics; only the published slots go through the `ProbeSlot` seam.
pub fn probe_pair<S: ProbeSlot>(x: &[S; 2], rounds: i32) -> Result<(), ProbeError> {
    let ack: [[AtomicI32; 3]; 2] = [
        [
            AtomicI32::new(ACK_SENTINEL),
            AtomicI32::new(ACK_SENTINEL),
            AtomicI32::new(ACK_SENTINEL),
        ],
        [
            AtomicI32::new(ACK_SENTINEL),
            AtomicI32::new(ACK_SENTINEL),
            AtomicI32::new(ACK_SENTINEL),
        ],
    ];

    thread::scope(|s| {
        let ack = &ack;
        let handles = [0usize, 1].map(|me| s.spawn(move || probe_worker(me, x, ack, rounds)));
        let mut outcome = Ok(());
        for handle in handles {
            match handle.join() {
                Ok(Err(e)) if outcome.is_ok() => outcome = Err(e),
                Ok(_) => {}
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        outcome
    })
}

/// Runs `pair_count` independent worker pairs concurrently, each for
/// `rounds_per_pair` rounds, over sequentially consistent slots.
///
/// Terminates normally, or returns the first
/// [`ProbeError::SequentialConsistencyViolation`] observed. Skipped on a
/// single-CPU machine, where the probe exercises nothing.
pub fn run_ordering_probe(pair_count: usize, rounds_per_pair: i32) -> Result<(), ProbeError> {
    if num_cpus::get() == 1 {
        warn!("skipping ordering probe on a single-cpu machine");
        return Ok(());
    }
    info!(pair_count, rounds_per_pair, "ordering probe");

    let slots: Vec<[SeqCstSlot; 2]> = (0..pair_count)
        .map(|_| [SeqCstSlot::new(0), SeqCstSlot::new(0)])
        .collect();

    thread::scope(|s| {
        let handles: Vec<_> = slots
            .iter()
            .map(|x| s.spawn(move || probe_pair(x, rounds_per_pair)))
            .collect();
        let mut outcome = Ok(());
        for handle in handles {
            match handle.join() {
                Ok(Err(e)) if outcome.is_ok() => outcome = Err(e),
                Ok(_) => {}
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        outcome
    })
}
