// SPDX-License-Identifier: Apache-2.0

//! Driver and store trait definitions
//!
//! `DataEngine` is implemented once per store kind (postgres, mysql, ...)
//! and binds a `TargetStore` for each configured target. `TargetStore` is
//! the query/write capability the orchestrator fans out to.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::TargetConfig;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::mapping::NameMapping;
use crate::engine::predicate::Predicate;
use crate::engine::types::LogicalRecord;

/// A store kind that can open targets from configuration
pub trait DataEngine: Send + Sync {
    /// Returns the store-kind tag used in configuration (e.g., "postgres")
    fn driver_id(&self) -> &'static str;

    /// Returns a human-readable name for this driver
    fn driver_name(&self) -> &'static str;

    /// Other tags accepted for this driver (e.g., "postgresql")
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Binds the capability for one target.
    ///
    /// Must not require the store to be reachable; connection pools are
    /// created lazily. Malformed connection settings fail here.
    fn open(&self, config: &TargetConfig) -> EngineResult<Arc<dyn TargetStore>>;
}

/// Query/write capability of one physical store
///
/// Implementations should observe `cancel` and return
/// `EngineError::Cancelled` promptly once it fires. An implementation that
/// ignores it keeps running in the background after the fan-out deadline;
/// its result is discarded.
#[async_trait]
pub trait TargetStore: Send + Sync {
    /// Fetches every record matching `predicate` from the mapped table
    async fn query(
        &self,
        mapping: &NameMapping,
        predicate: &Predicate,
        cancel: &CancellationToken,
    ) -> EngineResult<Vec<LogicalRecord>>;

    /// Persists one record into the mapped table
    async fn write(
        &self,
        mapping: &NameMapping,
        record: &LogicalRecord,
        cancel: &CancellationToken,
    ) -> EngineResult<()>;

    /// Releases pooled connections
    async fn close(&self) {}
}

/// Races `fut` against `cancel`.
pub async fn run_cancellable<T, F>(cancel: &CancellationToken, fut: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EngineError::Cancelled),
        result = fut => result,
    }
}
