//! # Benchmark runner
//!
//! Drives the [harness](crate::harness) once per [`Strategy`] over an
//! identical workload — same worker mix, same per-worker iteration count,
//! freshly zeroed counter each pass — then reduces the reports into an
//! [`AggregateDelta`] per strategy and the signed differences between them.
//!
//! `reported_nanos` is the arithmetic mean of the workers' own loop timings;
//! `observed_nanos` is the wall-clock span the harness measured around the
//! whole pass. Observed is never smaller than reported: the difference is
//! the harness's end-to-end spawn/collect overhead.

use std::fmt;

use tracing::info;

use crate::counter::CacheLine;
use crate::harness::{run_tasks, Harvest, Task};
use crate::strategy::{Mutation, Report, Strategy};

/// Explicit configuration for one benchmark run. Passed by value into
/// [`run_benchmark`]; there is no process-global option state.
#[derive(Clone, Copy, Debug)]
pub struct BenchConfig {
    /// Logical mutations performed by each worker.
    pub iterations: u64,
    /// Number of incrementing workers per strategy pass.
    pub adders: usize,
    /// Number of decrementing workers per strategy pass.
    pub subtractors: usize,
    /// Completion-channel capacity; `None` means one slot per worker, so no
    /// producer ever blocks on a full buffer.
    pub queue_capacity: Option<usize>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        BenchConfig {
            iterations: 1_000_000,
            adders: 1,
            subtractors: 1,
            queue_capacity: None,
        }
    }
}

/// Mean-of-workers timing paired with the independently observed span.
///
/// Invariant: `observed_nanos >= reported_nanos`.
#[derive(Clone, Copy, Debug)]
pub struct AggregateDelta {
    pub reported_nanos: u64,
    pub observed_nanos: u64,
}

/// One strategy's full pass: its aggregate timing, the raw per-worker
/// reports in completion order, and the counter's final value.
#[derive(Debug)]
pub struct StrategyRun {
    pub strategy: Strategy,
    pub delta: AggregateDelta,
    pub reports: Vec<Report>,
    pub final_value: u64,
}

/// The two passes side by side, plus the iteration count the per-op costs
/// are normalized by.
#[derive(Debug)]
pub struct Comparison {
    pub cas: StrategyRun,
    pub atomic: StrategyRun,
    pub iterations: u64,
}

impl Comparison {
    /// Signed reported-mean difference, CAS minus Atomic. Zero when the two
    /// strategies tie; no winner is asserted in that case.
    pub fn reported_diff_nanos(&self) -> i64 {
        self.cas.delta.reported_nanos as i64 - self.atomic.delta.reported_nanos as i64
    }

    /// Signed observed-span difference, CAS minus Atomic.
    pub fn observed_diff_nanos(&self) -> i64 {
        self.cas.delta.observed_nanos as i64 - self.atomic.delta.observed_nanos as i64
    }

    /// Absolute reported difference per logical mutation.
    pub fn reported_cost_per_op(&self) -> u64 {
        self.reported_diff_nanos().unsigned_abs() / self.iterations.max(1)
    }

    /// Absolute observed difference per logical mutation.
    pub fn observed_cost_per_op(&self) -> u64 {
        self.observed_diff_nanos().unsigned_abs() / self.iterations.max(1)
    }
}

fn render_line(f: &mut fmt::Formatter<'_>, label: &str, diff: i64, per_op: u64) -> fmt::Result {
    if diff == 0 {
        return writeln!(f, "{label}: no difference (0 nsec/mutation-op)");
    }
    // diff is CAS minus Atomic; positive means atomic was faster.
    let (winner, abs) = if diff > 0 {
        ("atomic", diff.unsigned_abs())
    } else {
        ("cas", diff.unsigned_abs())
    };
    writeln!(
        f,
        "{label}: {winner} access faster by {abs} nsecs ({per_op} nsec/mutation-op)"
    )
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in [&self.cas, &self.atomic] {
            writeln!(
                f,
                "--- access-with-{:?}: reported {} ns, observed {} ns (final value {})",
                run.strategy, run.delta.reported_nanos, run.delta.observed_nanos, run.final_value
            )?;
        }
        render_line(
            f,
            "reported",
            self.reported_diff_nanos(),
            self.reported_cost_per_op(),
        )?;
        render_line(
            f,
            "observed",
            self.observed_diff_nanos(),
            self.observed_cost_per_op(),
        )
    }
}

fn tasks_for(strategy: Strategy, config: &BenchConfig) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(config.adders + config.subtractors);
    for _ in 0..config.subtractors {
        tasks.push(Task {
            strategy,
            mutation: Mutation::Decrement,
            slot: 0,
            iterations: config.iterations,
        });
    }
    for _ in 0..config.adders {
        tasks.push(Task {
            strategy,
            mutation: Mutation::Increment,
            slot: 0,
            iterations: config.iterations,
        });
    }
    tasks
}

fn run_pass(strategy: Strategy, config: &BenchConfig) -> StrategyRun {
    let line = CacheLine::new();
    let tasks = tasks_for(strategy, config);
    let capacity = config.queue_capacity.unwrap_or(tasks.len());

    let Harvest {
        reports,
        observed_nanos,
    } = run_tasks(&line, &tasks, capacity);

    let reported_nanos = if reports.is_empty() {
        0
    } else {
        reports.iter().map(|r| r.elapsed_nanos).sum::<u64>() / reports.len() as u64
    };

    let run = StrategyRun {
        strategy,
        delta: AggregateDelta {
            reported_nanos,
            observed_nanos,
        },
        reports,
        final_value: line.load(0),
    };
    info!(
        strategy = ?strategy,
        reported_nanos,
        observed_nanos,
        final_value = run.final_value,
        "pass complete"
    );
    run
}

/// Runs both strategies over the configured workload and returns the
/// side-by-side comparison.
///
/// With zero workers on both sides each pass is a no-op: the result carries
/// no reports and the call does not block.
pub fn run_benchmark(config: BenchConfig) -> Comparison {
    let cas = run_pass(Strategy::Cas, &config);
    let atomic = run_pass(Strategy::Atomic, &config);
    Comparison {
        cas,
        atomic,
        iterations: config.iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_workload_conserves_counter() {
        let cmp = run_benchmark(BenchConfig {
            iterations: 100_000,
            adders: 2,
            subtractors: 2,
            queue_capacity: Some(4),
        });
        assert_eq!(cmp.atomic.final_value, 0);
        assert_eq!(cmp.cas.final_value, 0);
        assert!(cmp.atomic.delta.reported_nanos > 0);
        assert!(cmp.cas.delta.reported_nanos > 0);
    }

    #[test]
    fn test_unbalanced_workload_final_value() {
        // final == (adders - subtractors) * iterations, same for both passes
        let cmp = run_benchmark(BenchConfig {
            iterations: 10_000,
            adders: 3,
            subtractors: 1,
            queue_capacity: None,
        });
        assert_eq!(cmp.atomic.final_value, 20_000);
        assert_eq!(cmp.cas.final_value, 20_000);
    }

    #[test]
    fn test_subtractor_only_workload_wraps() {
        let cmp = run_benchmark(BenchConfig {
            iterations: 5_000,
            adders: 0,
            subtractors: 1,
            queue_capacity: None,
        });
        assert_eq!(cmp.atomic.final_value, 0u64.wrapping_sub(5_000));
        assert_eq!(cmp.cas.final_value, cmp.atomic.final_value);
    }

    #[test]
    fn test_overhead_is_non_negative() {
        let cmp = run_benchmark(BenchConfig {
            iterations: 50_000,
            adders: 2,
            subtractors: 2,
            queue_capacity: None,
        });
        for run in [&cmp.atomic, &cmp.cas] {
            assert!(run.delta.observed_nanos >= run.delta.reported_nanos);
        }
    }

    #[test]
    fn test_empty_worker_set_does_not_block() {
        let cmp = run_benchmark(BenchConfig {
            iterations: 1_000_000,
            adders: 0,
            subtractors: 0,
            queue_capacity: None,
        });
        assert!(cmp.atomic.reports.is_empty());
        assert!(cmp.cas.reports.is_empty());
        assert_eq!(cmp.reported_diff_nanos(), 0);
    }

    fn fabricated(cas_reported: u64, atomic_reported: u64, iterations: u64) -> Comparison {
        let run = |strategy, reported_nanos| StrategyRun {
            strategy,
            delta: AggregateDelta {
                reported_nanos,
                observed_nanos: reported_nanos + 10,
            },
            reports: Vec::new(),
            final_value: 0,
        };
        Comparison {
            cas: run(Strategy::Cas, cas_reported),
            atomic: run(Strategy::Atomic, atomic_reported),
            iterations,
        }
    }

    #[test]
    fn test_diff_sign_is_cas_minus_atomic() {
        let cmp = fabricated(3_000, 1_000, 1_000);
        assert_eq!(cmp.reported_diff_nanos(), 2_000);
        assert_eq!(cmp.reported_cost_per_op(), 2);

        let cmp = fabricated(1_000, 3_000, 1_000);
        assert_eq!(cmp.reported_diff_nanos(), -2_000);
        assert_eq!(cmp.reported_cost_per_op(), 2);
    }

    #[test]
    fn test_tie_presents_as_zero_difference() {
        let cmp = fabricated(2_000, 2_000, 1_000);
        assert_eq!(cmp.reported_diff_nanos(), 0);
        assert_eq!(cmp.reported_cost_per_op(), 0);
        let rendered = cmp.to_string();
        assert!(rendered.contains("reported: no difference"));
    }
}
