// SPDX-License-Identifier: Apache-2.0

//! PostgreSQL Driver
//!
//! Binds PostgreSQL targets using SQLx.

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::TargetConfig;
use crate::engine::error::EngineResult;
use crate::engine::sql::SqlDialect;
use crate::engine::traits::{DataEngine, TargetStore};

use super::{connection_url, invalid_settings};

/// PostgreSQL driver implementation
pub struct PostgresDriver;

impl PostgresDriver {
    pub fn new() -> Self {
        Self
    }

    /// Builds a connection string from config
    fn build_connection_string(config: &TargetConfig) -> EngineResult<String> {
        let ssl_mode = if config.ssl { "require" } else { "disable" };
        connection_url(config, "postgres", 5432, "postgres", &format!("sslmode={}", ssl_mode))
    }
}

impl Default for PostgresDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DataEngine for PostgresDriver {
    fn driver_id(&self) -> &'static str {
        "postgres"
    }

    fn driver_name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["postgresql"]
    }

    fn open(&self, config: &TargetConfig) -> EngineResult<Arc<dyn TargetStore>> {
        let conn_str = Self::build_connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.pool_max_connections())
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(&conn_str)
            .map_err(|e| invalid_settings(config, e))?;

        Ok(Arc::new(PostgresStore { pool }))
    }
}

/// One PostgreSQL target
pub struct PostgresStore {
    pool: PgPool,
}

sql_target_store!(PostgresStore, SqlDialect::Postgres);
