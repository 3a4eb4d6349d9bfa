// SPDX-License-Identifier: Apache-2.0

//! MySQL Driver
//!
//! Binds MySQL/MariaDB targets using SQLx.

use std::sync::Arc;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use crate::config::TargetConfig;
use crate::engine::error::EngineResult;
use crate::engine::sql::SqlDialect;
use crate::engine::traits::{DataEngine, TargetStore};

use super::{connection_url, invalid_settings};

/// MySQL driver implementation
pub struct MySqlDriver;

impl MySqlDriver {
    pub fn new() -> Self {
        Self
    }

    /// Builds a connection string from config
    fn build_connection_string(config: &TargetConfig) -> EngineResult<String> {
        let ssl_mode = if config.ssl { "REQUIRED" } else { "DISABLED" };
        connection_url(config, "mysql", 3306, "mysql", &format!("ssl-mode={}", ssl_mode))
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl DataEngine for MySqlDriver {
    fn driver_id(&self) -> &'static str {
        "mysql"
    }

    fn driver_name(&self) -> &'static str {
        "MySQL / MariaDB"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["mariadb"]
    }

    fn open(&self, config: &TargetConfig) -> EngineResult<Arc<dyn TargetStore>> {
        let conn_str = Self::build_connection_string(config)?;

        let pool = MySqlPoolOptions::new()
            .max_connections(config.pool_max_connections())
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy(&conn_str)
            .map_err(|e| invalid_settings(config, e))?;

        Ok(Arc::new(MySqlStore { pool }))
    }
}

/// One MySQL target
pub struct MySqlStore {
    pool: MySqlPool,
}

sql_target_store!(MySqlStore, SqlDialect::MySql);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_string_building() {
        let mut config = TargetConfig::new("my", "mysql");
        config.host = Some("localhost".to_string());
        config.port = Some(3307);
        config.username = Some("user".to_string());

        let conn_str = MySqlDriver::build_connection_string(&config).unwrap();
        assert_eq!(conn_str, "mysql://user@localhost:3307/mysql?ssl-mode=DISABLED");
    }

    #[tokio::test]
    async fn test_open_is_lazy() {
        let config = TargetConfig::new("my", "mysql").with_url("mysql://u:p@127.0.0.1:1/db");
        assert!(MySqlDriver::new().open(&config).is_ok());
    }
}
