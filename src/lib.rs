// SPDX-License-Identifier: Apache-2.0

// AggregateHub - one logical user record replicated across many stores
// Core library

pub mod config;
pub mod engine;
pub mod metrics;
pub mod observability;

use std::sync::Arc;

use serde::Serialize;

use config::HubConfig;
use engine::registry::DriverInfo;
use engine::targets::TargetInfo;
use engine::{
    AggregatedResult, DriverRegistry, EngineResult, FanoutSettings, LogicalFilter, LogicalRecord,
    Orchestrator, PerTargetOutcome, TargetRegistry,
};
use metrics::FanoutMetricsSnapshot;

/// Available drivers and what each configured target resolved to
#[derive(Debug, Clone, Serialize)]
pub struct HubDescription {
    pub drivers: Vec<DriverInfo>,
    pub targets: Vec<TargetInfo>,
}

/// Caller-facing entry point: a bound target registry plus the orchestrator
/// that fans out over it.
pub struct AggregateHub {
    drivers: Arc<DriverRegistry>,
    orchestrator: Orchestrator,
}

impl AggregateHub {
    /// Binds every configured target using the built-in drivers.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn from_config(config: &HubConfig) -> EngineResult<Self> {
        Self::with_drivers(config, Arc::new(DriverRegistry::with_defaults()))
    }

    pub fn with_drivers(config: &HubConfig, drivers: Arc<DriverRegistry>) -> EngineResult<Self> {
        let targets = TargetRegistry::from_config(config, &drivers)?;
        Ok(Self {
            drivers,
            orchestrator: Orchestrator::new(Arc::new(targets), FanoutSettings::from_config(config)),
        })
    }

    pub async fn query(&self, filter: &LogicalFilter) -> AggregatedResult {
        self.orchestrator.query(filter).await
    }

    pub async fn replicate(&self, record: &LogicalRecord) -> EngineResult<Vec<PerTargetOutcome>> {
        self.orchestrator.replicate(record).await
    }

    pub fn targets(&self) -> &Arc<TargetRegistry> {
        self.orchestrator.registry()
    }

    /// Drivers known to this hub and every target's table and column mapping
    pub fn describe(&self) -> HubDescription {
        HubDescription {
            drivers: self.drivers.list_infos(),
            targets: self.targets().iter().map(|t| t.info()).collect(),
        }
    }

    /// Process-wide fan-out counters
    pub fn metrics(&self) -> FanoutMetricsSnapshot {
        metrics::snapshot()
    }

    /// Closes every target's pool
    pub async fn close(&self) {
        self.targets().close().await;
    }
}
