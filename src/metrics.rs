// SPDX-License-Identifier: Apache-2.0

//! Lightweight in-memory fan-out metrics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

use serde::Serialize;

/// Which operation a fan-out served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanoutKind {
    Read,
    Write,
}

#[derive(Default)]
struct FanoutMetrics {
    reads: AtomicU64,
    writes: AtomicU64,
    rejected_writes: AtomicU64,
    target_calls: AtomicU64,
    target_failures: AtomicU64,
    target_timeouts: AtomicU64,
    duration_total_ms: AtomicU64,
    duration_max_ms: AtomicU64,
}

static FANOUT_METRICS: OnceLock<FanoutMetrics> = OnceLock::new();

fn metrics() -> &'static FanoutMetrics {
    FANOUT_METRICS.get_or_init(FanoutMetrics::default)
}

/// Records one completed fan-out over `targets` targets.
pub fn record_fanout(kind: FanoutKind, duration_ms: f64, targets: usize, failures: usize, timeouts: usize) {
    let duration_ms = duration_ms.max(0.0) as u64;
    let metrics = metrics();

    match kind {
        FanoutKind::Read => metrics.reads.fetch_add(1, Ordering::Relaxed),
        FanoutKind::Write => metrics.writes.fetch_add(1, Ordering::Relaxed),
    };
    metrics.target_calls.fetch_add(targets as u64, Ordering::Relaxed);
    metrics.target_failures.fetch_add(failures as u64, Ordering::Relaxed);
    metrics.target_timeouts.fetch_add(timeouts as u64, Ordering::Relaxed);
    metrics
        .duration_total_ms
        .fetch_add(duration_ms, Ordering::Relaxed);

    let mut current = metrics.duration_max_ms.load(Ordering::Relaxed);
    while duration_ms > current {
        match metrics.duration_max_ms.compare_exchange(
            current,
            duration_ms,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(next) => current = next,
        }
    }
}

/// Records a write rejected by validation before dispatch.
pub fn record_rejected_write() {
    metrics().rejected_writes.fetch_add(1, Ordering::Relaxed);
}

#[derive(Debug, Serialize)]
pub struct FanoutMetricsSnapshot {
    pub reads: u64,
    pub writes: u64,
    pub rejected_writes: u64,
    pub target_calls: u64,
    pub target_failures: u64,
    pub target_timeouts: u64,
    pub avg_ms: Option<f64>,
    pub max_ms: Option<u64>,
}

pub fn snapshot() -> FanoutMetricsSnapshot {
    let metrics = metrics();
    let reads = metrics.reads.load(Ordering::Relaxed);
    let writes = metrics.writes.load(Ordering::Relaxed);
    let duration_total = metrics.duration_total_ms.load(Ordering::Relaxed);
    let max_ms = metrics.duration_max_ms.load(Ordering::Relaxed);
    let fanouts = reads + writes;

    let avg_ms = if fanouts > 0 {
        Some(duration_total as f64 / fanouts as f64)
    } else {
        None
    };

    FanoutMetricsSnapshot {
        reads,
        writes,
        rejected_writes: metrics.rejected_writes.load(Ordering::Relaxed),
        target_calls: metrics.target_calls.load(Ordering::Relaxed),
        target_failures: metrics.target_failures.load(Ordering::Relaxed),
        target_timeouts: metrics.target_timeouts.load(Ordering::Relaxed),
        avg_ms,
        max_ms: if max_ms > 0 { Some(max_ms) } else { None },
    }
}
