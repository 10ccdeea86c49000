//! # Worker harness
//!
//! Spawns one worker thread per task, each bound to a [`Strategy`] and an
//! iteration count, and collects the per-worker [`Report`]s through a bounded
//! completion channel.
//!
//! Reports come back in completion order, not spawn order; the harness makes
//! no claim about which worker finishes first. The channel capacity defaults
//! to the worker count upstream, in which case no producer ever blocks on a
//! full buffer; smaller capacities re-introduce producer blocking and are
//! supported.

use std::thread;
use std::time::Instant;

use crossbeam_channel::bounded;
use tracing::debug;

use crate::counter::CacheLine;
use crate::strategy::{Mutation, Report, Strategy};

/// One worker assignment: a pure function of counter, slot, iteration count
/// and the completion channel. Workers own no state beyond local retries.
#[derive(Clone, Copy, Debug)]
pub struct Task {
    pub strategy: Strategy,
    pub mutation: Mutation,
    pub slot: usize,
    pub iterations: u64,
}

/// Everything one harness pass produced: the reports in completion order and
/// the wall-clock span from just before the first spawn to just after the
/// last report was received.
#[derive(Debug)]
pub struct Harvest {
    pub reports: Vec<Report>,
    pub observed_nanos: u64,
}

/// Runs every task concurrently against `line` and collects all reports.
///
/// An empty task set is a no-op: nothing is spawned and an empty harvest is
/// returned immediately.
pub fn run_tasks(line: &CacheLine, tasks: &[Task], queue_capacity: usize) -> Harvest {
    if tasks.is_empty() {
        return Harvest {
            reports: Vec::new(),
            observed_nanos: 0,
        };
    }

    let (tx, rx) = bounded::<Report>(queue_capacity);

    thread::scope(|s| {
        let start = Instant::now();
        for task in tasks {
            let tx = tx.clone();
            s.spawn(move || {
                let rpt = task
                    .strategy
                    .apply_n(line, task.slot, task.mutation, task.iterations);
                let _ = tx.send(rpt);
            });
        }
        drop(tx);

        let mut reports = Vec::with_capacity(tasks.len());
        while reports.len() < tasks.len() {
            match rx.recv() {
                Ok(rpt) => {
                    debug!(name = rpt.name, elapsed_nanos = rpt.elapsed_nanos, "ack");
                    reports.push(rpt);
                }
                Err(_) => break,
            }
        }
        let observed_nanos = start.elapsed().as_nanos() as u64;

        Harvest {
            reports,
            observed_nanos,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_tasks(iters: u64, strategy: Strategy) -> Vec<Task> {
        vec![
            Task {
                strategy,
                mutation: Mutation::Increment,
                slot: 0,
                iterations: iters,
            },
            Task {
                strategy,
                mutation: Mutation::Increment,
                slot: 0,
                iterations: iters,
            },
            Task {
                strategy,
                mutation: Mutation::Decrement,
                slot: 0,
                iterations: iters,
            },
        ]
    }

    #[test]
    fn test_empty_task_set_returns_immediately() {
        let line = CacheLine::new();
        let harvest = run_tasks(&line, &[], 0);
        assert!(harvest.reports.is_empty());
        assert_eq!(harvest.observed_nanos, 0);
        assert_eq!(line.load(0), 0);
    }

    #[test]
    fn test_reports_one_per_task() {
        let line = CacheLine::new();
        let tasks = mixed_tasks(10_000, Strategy::Atomic);
        let harvest = run_tasks(&line, &tasks, tasks.len());
        assert_eq!(harvest.reports.len(), tasks.len());
        // 2 adders, 1 subtractor
        assert_eq!(line.load(0), 10_000);
    }

    #[test]
    fn test_undersized_queue_still_completes() {
        // Capacity below worker count blocks producers on send; the collection
        // loop must drain them all regardless.
        let line = CacheLine::new();
        let tasks = mixed_tasks(1_000, Strategy::Cas);
        let harvest = run_tasks(&line, &tasks, 1);
        assert_eq!(harvest.reports.len(), tasks.len());
        assert_eq!(line.load(0), 1_000);
    }

    #[test]
    fn test_rendezvous_queue_still_completes() {
        let line = CacheLine::new();
        let tasks = mixed_tasks(500, Strategy::Atomic);
        let harvest = run_tasks(&line, &tasks, 0);
        assert_eq!(harvest.reports.len(), tasks.len());
    }

    #[test]
    fn test_observed_span_covers_every_worker() {
        let line = CacheLine::new();
        let tasks = mixed_tasks(50_000, Strategy::Atomic);
        let harvest = run_tasks(&line, &tasks, tasks.len());
        for rpt in &harvest.reports {
            assert!(
                harvest.observed_nanos >= rpt.elapsed_nanos,
                "worker loop ran outside the observed window"
            );
        }
    }
}
