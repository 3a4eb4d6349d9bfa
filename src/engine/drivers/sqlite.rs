// SPDX-License-Identifier: Apache-2.0

//! SQLite Driver
//!
//! Binds SQLite targets using SQLx. The target's `database` is the file
//! path; a full `url` (e.g. `sqlite://data/users.db`) is also accepted.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::TargetConfig;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::sql::SqlDialect;
use crate::engine::traits::{DataEngine, TargetStore};

use super::invalid_settings;

/// SQLite driver implementation
pub struct SqliteDriver;

impl SqliteDriver {
    pub fn new() -> Self {
        Self
    }

    fn connect_options(config: &TargetConfig) -> EngineResult<SqliteConnectOptions> {
        if let Some(url) = &config.url {
            return SqliteConnectOptions::from_str(url.expose()).map_err(|e| invalid_settings(config, e));
        }

        let path = config
            .database
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                EngineError::configuration(format!(
                    "Target '{}': sqlite requires 'database' (file path) or 'url'",
                    config.name
                ))
            })?;

        Ok(SqliteConnectOptions::new().filename(path).create_if_missing(true))
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DataEngine for SqliteDriver {
    fn driver_id(&self) -> &'static str {
        "sqlite"
    }

    fn driver_name(&self) -> &'static str {
        "SQLite"
    }

    fn open(&self, config: &TargetConfig) -> EngineResult<Arc<dyn TargetStore>> {
        let options = Self::connect_options(config)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_max_connections())
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy_with(options);

        Ok(Arc::new(SqliteStore { pool }))
    }
}

/// One SQLite target
pub struct SqliteStore {
    pool: SqlitePool,
}

sql_target_store!(SqliteStore, SqlDialect::Sqlite);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::mapping::NameMapping;
    use crate::engine::predicate::{build, Predicate};
    use crate::engine::types::{LogicalField, LogicalFilter, LogicalRecord};
    use tokio_util::sync::CancellationToken;

    async fn open_with_table(dir: &tempfile::TempDir, mapping: &NameMapping) -> Arc<dyn TargetStore> {
        let path = dir.path().join("target.db");
        let mut config = TargetConfig::new("sqlite-test", "sqlite");
        config.database = Some(path.to_string_lossy().into_owned());

        let setup = SqlitePool::connect_with(SqliteDriver::connect_options(&config).unwrap())
            .await
            .unwrap();
        let [id, username, name, surname] = mapping.columns();
        sqlx::query(&format!(
            "CREATE TABLE \"{}\" (\"{}\" TEXT PRIMARY KEY, \"{}\" TEXT NOT NULL, \"{}\" TEXT NOT NULL, \"{}\" TEXT NOT NULL)",
            mapping.resolve_table(),
            id,
            username,
            name,
            surname
        ))
        .execute(&setup)
        .await
        .unwrap();
        setup.close().await;

        SqliteDriver::new().open(&config).unwrap()
    }

    #[test]
    fn test_requires_path_or_url() {
        let config = TargetConfig::new("empty", "sqlite");
        assert!(matches!(
            SqliteDriver::connect_options(&config),
            Err(EngineError::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_write_then_query_through_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let mapping =
            NameMapping::from_entries(Some("a_users"), [("id", "a_id"), ("name", "a_name")]).unwrap();
        let store = open_with_table(&dir, &mapping).await;
        let cancel = CancellationToken::new();

        let john = LogicalRecord::new("1", "jdoe", "John", "Doe");
        let jane = LogicalRecord::new("2", "jane", "Jane", "Doe");
        store.write(&mapping, &john, &cancel).await.unwrap();
        store.write(&mapping, &jane, &cancel).await.unwrap();

        let by_name = build(&mapping, &LogicalFilter::new().with(LogicalField::Name, "John"));
        assert_eq!(store.query(&mapping, &by_name, &cancel).await.unwrap(), vec![john]);

        let by_surname = build(&mapping, &LogicalFilter::new().with(LogicalField::Surname, "Doe"));
        assert_eq!(store.query(&mapping, &by_surname, &cancel).await.unwrap().len(), 2);

        let nobody = build(&mapping, &LogicalFilter::new().with(LogicalField::Name, "Nobody"));
        assert!(store.query(&mapping, &nobody, &cancel).await.unwrap().is_empty());

        store.close().await;
    }

    #[tokio::test]
    async fn test_duplicate_id_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = NameMapping::default();
        let store = open_with_table(&dir, &mapping).await;
        let cancel = CancellationToken::new();

        let record = LogicalRecord::new("1", "jdoe", "John", "Doe");
        store.write(&mapping, &record, &cancel).await.unwrap();
        let err = store.write(&mapping, &record, &cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::QueryError { .. }));
    }

    #[tokio::test]
    async fn test_missing_table_is_query_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = TargetConfig::new("sqlite-test", "sqlite");
        config.database = Some(dir.path().join("empty.db").to_string_lossy().into_owned());
        let store = SqliteDriver::new().open(&config).unwrap();

        let err = store
            .query(&NameMapping::default(), &Predicate::match_all(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::QueryError { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let mapping = NameMapping::default();
        let store = open_with_table(&dir, &mapping).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = store
            .query(&mapping, &Predicate::match_all(), &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::Cancelled);
    }
}
