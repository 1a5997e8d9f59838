//! Concurrent Workload Runner
//!
//! Drives a [`PointService`] from a fixed pool of OS threads to exercise the
//! per-user locking path under contention.
//!
//! # Thread Architecture
//!
//! ```text
//!           ┌── worker 1 ──┐
//! gate ─────┼── worker 2 ──┼──▶ PointService ──▶ outcomes ──▶ WorkloadReport
//! (opens    ├── ...        │     (lock per user)
//!  once)    └── worker W ──┘
//!                 ▲
//!            next_op (shared counter, users interleaved)
//! ```
//!
//! Workers park on a gate held by the spawning thread so the whole pool hits
//! the service together. If a worker cannot be started the gate opens with
//! the abort flag set and the started workers exit without running anything.

use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use crate::balance::Balance;
use crate::config::WorkloadConfig;
use crate::core_types::UserId;
use crate::error::LedgerResult;
use crate::ledger::{TransactionType, replay_balance};
use crate::perf::PerfMetrics;
use crate::service::PointService;

/// Result of one workload run
#[derive(Debug, Serialize)]
pub struct WorkloadReport {
    /// Worker threads that ran the operations
    pub workers: usize,
    pub accepted: u64,
    pub rejected: u64,
    /// Rejections grouped by error code
    pub rejections: BTreeMap<&'static str, u64>,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Final balance of every user in the run, by user id
    pub final_balances: Vec<Balance>,
    pub perf: PerfMetrics,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl WorkloadReport {
    /// Successful calls per second of wall time
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.accepted as f64 / secs
    }

    /// Users whose stored balance differs from the replay of their history.
    /// Empty on a healthy run.
    pub fn mismatches(&self, service: &PointService) -> Vec<UserId> {
        self.final_balances
            .iter()
            .filter(|b| replay_balance(&service.history(b.user_id())) != Some(b.amount()))
            .map(|b| b.user_id())
            .collect()
    }
}

struct OpOutcome {
    kind: TransactionType,
    result: LedgerResult<Balance>,
    latency_ns: u64,
}

/// Kind and amount of the `op`-th (1-based) operation of a user
fn plan_op(config: &WorkloadConfig, op: u64) -> (TransactionType, i64) {
    if config.use_every > 0 && op % config.use_every == 0 {
        (TransactionType::Use, config.charge_amount / 2)
    } else {
        (TransactionType::Charge, config.charge_amount)
    }
}

/// Pull operations off the shared counter until all `total` are taken.
fn worker_loop(
    service: &PointService,
    config: &WorkloadConfig,
    total: u64,
    next_op: &AtomicU64,
    gate: &RwLock<()>,
    aborted: &AtomicBool,
) -> Vec<OpOutcome> {
    // Blocks until the spawning thread releases the write side
    drop(gate.read().unwrap_or_else(PoisonError::into_inner));

    let mut outcomes = Vec::new();
    if aborted.load(Ordering::Acquire) {
        return outcomes;
    }

    loop {
        let idx = next_op.fetch_add(1, Ordering::Relaxed);
        if idx >= total {
            break;
        }
        // Users interleaved so every user is contended from the first op
        let user_id = idx % config.users + 1;
        let (kind, amount) = plan_op(config, idx / config.users + 1);

        let start = Instant::now();
        let result = match kind {
            TransactionType::Charge => service.charge(user_id, amount),
            TransactionType::Use => service.use_points(user_id, amount),
        };
        outcomes.push(OpOutcome {
            kind,
            result,
            latency_ns: start.elapsed().as_nanos() as u64,
        });
    }
    outcomes
}

/// Run `users * ops_per_user` operations on `min(threads, total)` workers.
///
/// Users are numbered `1..=users`.
///
/// # Errors
/// - the operation count overflows `u64`
/// - `threads` is zero
/// - a worker thread cannot be started or panics
pub fn run_workload(
    service: &PointService,
    config: &WorkloadConfig,
) -> anyhow::Result<WorkloadReport> {
    let total = config
        .users
        .checked_mul(config.ops_per_user)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Workload too large: {} users x {} ops overflows",
                config.users,
                config.ops_per_user
            )
        })?;
    anyhow::ensure!(config.threads > 0, "Workload needs at least one thread");
    let workers = total.min(config.threads as u64) as usize;

    tracing::info!(
        users = config.users,
        ops_per_user = config.ops_per_user,
        total,
        workers,
        "Workload starting"
    );

    let next_op = AtomicU64::new(0);
    let gate = RwLock::new(());
    let aborted = AtomicBool::new(false);

    let (per_worker, elapsed) = thread::scope(|s| -> anyhow::Result<_> {
        let closed = gate.write().unwrap_or_else(PoisonError::into_inner);

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let spawned = thread::Builder::new()
                .name(format!("workload-{}", worker_id))
                .spawn_scoped(s, || {
                    worker_loop(service, config, total, &next_op, &gate, &aborted)
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    aborted.store(true, Ordering::Release);
                    drop(closed);
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(anyhow::Error::new(e)
                        .context(format!("Failed to start workload worker {}", worker_id)));
                }
            }
        }

        drop(closed);
        let start = Instant::now();
        let joined: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
        let elapsed = start.elapsed();
        let per_worker = joined
            .into_iter()
            .collect::<Result<Vec<Vec<OpOutcome>>, _>>()
            .map_err(|_| anyhow::anyhow!("Workload worker thread panicked"))?;
        Ok((per_worker, elapsed))
    })?;

    let mut perf = PerfMetrics::new(config.sample_rate);
    let mut accepted = 0;
    let mut rejections: BTreeMap<&'static str, u64> = BTreeMap::new();
    for outcome in per_worker.iter().flatten() {
        perf.add_call_latency(outcome.latency_ns);
        match outcome.kind {
            TransactionType::Charge => perf.add_charge_time(outcome.latency_ns),
            TransactionType::Use => perf.add_use_time(outcome.latency_ns),
        }
        match &outcome.result {
            Ok(_) => accepted += 1,
            Err(e) => *rejections.entry(e.code()).or_default() += 1,
        }
    }
    let rejected = rejections.values().sum();

    let final_balances = (1..=config.users).map(|id| service.balance(id)).collect();

    tracing::info!(
        accepted,
        rejected,
        elapsed_ms = elapsed.as_millis() as u64,
        "Workload finished"
    );

    Ok(WorkloadReport {
        workers,
        accepted,
        rejected,
        rejections,
        elapsed,
        final_balances,
        perf,
    })
}
