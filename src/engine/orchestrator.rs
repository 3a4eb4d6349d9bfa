// SPDX-License-Identifier: Apache-2.0

//! Scatter-Gather Orchestrator
//!
//! Fans one logical read or write out to every registered target in
//! parallel, waits under a single deadline and hands the per-target
//! outcomes to the merger. A target failure never fails the whole call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use crate::config::{HubConfig, DEFAULT_QUERY_TIMEOUT_MS};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::merge;
use crate::engine::predicate;
use crate::engine::targets::{Target, TargetRegistry};
use crate::engine::types::{
    AggregatedResult, ErrorClass, FanoutId, LogicalFilter, LogicalRecord, PerTargetOutcome,
};
use crate::metrics::{self, FanoutKind};

/// Deadlines applied to each fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanoutSettings {
    pub query_timeout: Duration,
    /// Writes wait for every target when unset
    pub write_timeout: Option<Duration>,
}

impl FanoutSettings {
    pub fn from_config(config: &HubConfig) -> Self {
        Self {
            query_timeout: config.query_timeout(),
            write_timeout: config.write_timeout(),
        }
    }
}

impl Default for FanoutSettings {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_millis(DEFAULT_QUERY_TIMEOUT_MS),
            write_timeout: None,
        }
    }
}

pub struct Orchestrator {
    registry: Arc<TargetRegistry>,
    settings: FanoutSettings,
}

impl Orchestrator {
    pub fn new(registry: Arc<TargetRegistry>, settings: FanoutSettings) -> Self {
        Self { registry, settings }
    }

    pub fn registry(&self) -> &Arc<TargetRegistry> {
        &self.registry
    }

    /// Runs `filter` against every target and merges what came back.
    ///
    /// Always returns one outcome per target, in registration order.
    #[instrument(
        skip(self, filter),
        fields(fanout_id = %FanoutId::new(), targets = self.registry.len())
    )]
    pub async fn query(&self, filter: &LogicalFilter) -> AggregatedResult {
        let outcomes = self
            .fan_out(FanoutKind::Read, Some(self.settings.query_timeout), |target, cancel| {
                let predicate = predicate::build(target.mapping(), filter);
                async move {
                    target
                        .store()
                        .query(target.mapping(), &predicate, &cancel)
                        .await
                }
            })
            .await;

        let result = merge::merge_reads(outcomes);
        info!(
            records = result.records.len(),
            failed = result.failed_targets().len(),
            "Query fan-out complete"
        );
        result
    }

    /// Writes `record` to every target.
    ///
    /// An invalid record is rejected before anything is dispatched. Once
    /// dispatched, per-target failures are reported in the returned
    /// outcomes; callers decide with `merge::all_succeeded` or
    /// `merge::any_succeeded`.
    #[instrument(
        skip(self, record),
        fields(fanout_id = %FanoutId::new(), targets = self.registry.len(), id = %record.id)
    )]
    pub async fn replicate(&self, record: &LogicalRecord) -> EngineResult<Vec<PerTargetOutcome>> {
        if let Err(err) = record.validate() {
            metrics::record_rejected_write();
            warn!(error = %err, "Rejected write before dispatch");
            return Err(err);
        }

        let outcomes = self
            .fan_out(FanoutKind::Write, self.settings.write_timeout, |target, cancel| {
                let record = record.clone();
                async move {
                    target
                        .store()
                        .write(target.mapping(), &record, &cancel)
                        .await
                        .map(|()| Vec::new())
                }
            })
            .await;

        let outcomes = merge::merge_writes(outcomes);
        info!(
            succeeded = outcomes.iter().filter(|o| o.is_success()).count(),
            "Replicate fan-out complete"
        );
        Ok(outcomes)
    }

    /// Spawns one task per target and collects their outcomes into
    /// registration-indexed slots.
    ///
    /// Tasks still running at the deadline are signalled through the shared
    /// token and detached; whatever they produce later is dropped.
    async fn fan_out<F, Fut>(
        &self,
        kind: FanoutKind,
        limit: Option<Duration>,
        op: F,
    ) -> Vec<PerTargetOutcome>
    where
        F: Fn(Arc<Target>, CancellationToken) -> Fut,
        Fut: Future<Output = EngineResult<Vec<LogicalRecord>>> + Send + 'static,
    {
        let started = Instant::now();
        let deadline = limit.map(|limit| started + limit);
        let cancel = CancellationToken::new();

        let names: Vec<String> = self.registry.iter().map(|t| t.name().to_string()).collect();
        let mut handles = Vec::with_capacity(names.len());

        for target in self.registry.iter() {
            let name = target.name().to_string();
            let task = op(Arc::clone(target), cancel.clone());

            handles.push(tokio::spawn(async move {
                let task_started = Instant::now();
                let result = task.await;
                let elapsed_ms = task_started.elapsed().as_secs_f64() * 1000.0;
                match result {
                    Ok(records) => PerTargetOutcome::success(name, records, elapsed_ms),
                    Err(err) => PerTargetOutcome::from_error(name, &err, elapsed_ms),
                }
            }));
        }

        let mut slots: Vec<Option<PerTargetOutcome>> = vec![None; names.len()];

        for (i, mut handle) in handles.into_iter().enumerate() {
            let joined = match deadline {
                Some(deadline) => timeout_at(deadline, &mut handle).await.ok(),
                None => Some(handle.await),
            };

            let outcome = match joined {
                Some(Ok(outcome)) => outcome,
                Some(Err(join_err)) => PerTargetOutcome::failure(
                    names[i].as_str(),
                    ErrorClass::Internal,
                    format!("Target task failed: {join_err}"),
                    started.elapsed().as_secs_f64() * 1000.0,
                ),
                None => {
                    cancel.cancel();
                    let timeout_ms = limit.map(|l| l.as_millis() as u64).unwrap_or_default();
                    PerTargetOutcome::from_error(
                        names[i].as_str(),
                        &EngineError::Timeout { timeout_ms },
                        started.elapsed().as_secs_f64() * 1000.0,
                    )
                }
            };

            if let Some(failure) = &outcome.error {
                warn!(
                    target_name = %outcome.target,
                    class = ?failure.class,
                    error = %failure.message,
                    "Target failed"
                );
            }
            slots[i] = Some(outcome);
        }

        let outcomes = merge::fill_slots(names.as_slice(), slots);

        let failures = outcomes.iter().filter(|o| !o.is_success()).count();
        let timeouts = outcomes
            .iter()
            .filter(|o| o.error_class() == Some(ErrorClass::Timeout))
            .count();
        metrics::record_fanout(
            kind,
            started.elapsed().as_secs_f64() * 1000.0,
            outcomes.len(),
            failures,
            timeouts,
        );

        outcomes
    }
}
