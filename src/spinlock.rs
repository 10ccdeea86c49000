//! # SlotLock
//!
//! A CAS-built mutual-exclusion demonstration over one [`CacheLine`] slot.
//! The top byte of the slot is the lock-state flag (0 = unlocked, 1 = locked);
//! the remaining bytes are payload and travel through acquire/release intact.
//!
//! This is a demonstration subject, not infrastructure: the acquire loop is a
//! naive load-test-CAS spin with **no yield and no back-off**, exactly the
//! shape that can livelock when the worker count lands on an unlucky multiple
//! of the CPU count. Do not "fix" the spin — the hazard is the point. Callers
//! that need guaranteed termination must apply an external timeout, or use
//! [`SlotLock::try_acquire_for`] with a bounded attempt budget.
//!
//! ## Protocol
//! - **Acquire**: load the word; if the state byte is 0, CAS the word to the
//!   same word with the state byte set to 1. Any failure (another worker won,
//!   or the payload moved underneath) retries the full load-test-CAS sequence.
//! - **Release**: CAS the locked word back to the exact pre-lock word the
//!   acquire returned. Only the worker that won the 0→1 transition may
//!   perform 1→0; a failed release is a logic bug, surfaced as
//!   [`LockError::ReleaseFailed`] and never retried.
//! - Key 0 is invalid and is rejected before any CAS is attempted.

use core::sync::atomic::{AtomicU64, Ordering::SeqCst};
use std::thread;

use thiserror::Error;
use tracing::{debug, info};

use crate::counter::CacheLine;

const STATE_SHIFT: u32 = 56;
const STATE_MASK: u64 = 0xFF << STATE_SHIFT;
const LOCKED_FLAG: u64 = 1 << STATE_SHIFT;

/// Fatal lock errors. Ordinary CAS contention is not an error and is handled
/// by retrying; only invariant violations surface here.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// Acquire was attempted with key 0, which is reserved as invalid.
    #[error("key 0 is invalid for lock acquisition")]
    InvalidKey,
    /// The release CAS failed even though the caller holds the lock.
    #[error("release CAS failed for key {key}: lock word changed while held")]
    ReleaseFailed { key: u64 },
}

/// A spin lock living in the top byte of one counter slot.
pub struct SlotLock<'a> {
    word: &'a AtomicU64,
}

impl<'a> SlotLock<'a> {
    /// Binds a lock to `line.slot(slot)`.
    #[inline(always)]
    pub fn new(line: &'a CacheLine, slot: usize) -> Self {
        SlotLock {
            word: line.slot(slot),
        }
    }

    /// Checks whether the lock-state byte is currently set.
    #[inline(always)]
    pub fn is_locked(&self) -> bool {
        self.word.load(SeqCst) & STATE_MASK != 0
    }

    /// Acquires the lock, spinning until the CAS 0→1 succeeds.
    ///
    /// Returns the pre-lock word; pass it back to [`release`](Self::release).
    /// The spin is tight on purpose and may livelock under contention.
    pub fn acquire(&self, key: u64) -> Result<u64, LockError> {
        if key == 0 {
            return Err(LockError::InvalidKey);
        }
        loop {
            let cur = self.word.load(SeqCst);
            if cur & STATE_MASK == 0 {
                let locked = cur | LOCKED_FLAG;
                if self
                    .word
                    .compare_exchange(cur, locked, SeqCst, SeqCst)
                    .is_ok()
                {
                    debug!(key, word = format_args!("{locked:#066b}"), "locked");
                    return Ok(cur);
                }
            }
        }
    }

    /// Like [`acquire`](Self::acquire), but gives up after `attempts`
    /// load-test-CAS rounds. `Ok(None)` means the budget ran out.
    pub fn try_acquire_for(&self, key: u64, attempts: usize) -> Result<Option<u64>, LockError> {
        if key == 0 {
            return Err(LockError::InvalidKey);
        }
        for _ in 0..attempts {
            let cur = self.word.load(SeqCst);
            if cur & STATE_MASK == 0 {
                let locked = cur | LOCKED_FLAG;
                if self
                    .word
                    .compare_exchange(cur, locked, SeqCst, SeqCst)
                    .is_ok()
                {
                    debug!(key, "locked");
                    return Ok(Some(cur));
                }
            }
        }
        Ok(None)
    }

    /// Releases the lock by restoring `unlocked_word`, the witness returned
    /// by the matching acquire.
    ///
    /// A failure means the word changed while the state byte was set — a
    /// protocol violation by some other party, fatal to this run.
    pub fn release(&self, key: u64, unlocked_word: u64) -> Result<(), LockError> {
        let locked = unlocked_word | LOCKED_FLAG;
        if self
            .word
            .compare_exchange(locked, unlocked_word, SeqCst, SeqCst)
            .is_err()
        {
            return Err(LockError::ReleaseFailed { key });
        }
        debug!(key, "unlocked");
        Ok(())
    }
}

/// Spawns `worker_count` workers that each acquire and release the lock once.
///
/// Completes when every worker has held the lock, or livelocks if the
/// worker/CPU ratio is unlucky — callers wanting a termination guarantee must
/// wrap this in an external timeout.
pub fn run_spin_lock_demo(worker_count: usize) -> Result<(), LockError> {
    info!(
        worker_count,
        cpus = num_cpus::get(),
        "spin lock demo (worker counts at exact multiples of the cpu count are livelock-prone)"
    );
    let line = CacheLine::new();
    let lock = SlotLock::new(&line, 0);

    thread::scope(|s| {
        let handles: Vec<_> = (1..=worker_count as u64)
            .map(|key| {
                let lock = &lock;
                s.spawn(move || -> Result<(), LockError> {
                    let witness = lock.acquire(key)?;
                    lock.release(key, witness)
                })
            })
            .collect();

        for handle in handles {
            match handle.join() {
                Ok(result) => result?,
                Err(payload) => std::panic::resume_unwind(payload),
            }
        }
        Ok(())
    })
}
