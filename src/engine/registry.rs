// SPDX-License-Identifier: Apache-2.0

//! Driver Registry
//!
//! Maps store-kind tags from configuration to the driver that binds them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::engine::drivers::mysql::MySqlDriver;
use crate::engine::drivers::postgres::PostgresDriver;
use crate::engine::drivers::sqlite::SqliteDriver;
use crate::engine::traits::DataEngine;

/// Driver metadata
#[derive(Debug, Clone, Serialize)]
pub struct DriverInfo {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
}

/// Registry that holds all available database drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DataEngine>>,
    aliases: HashMap<String, String>,
}

impl DriverRegistry {
    /// Creates a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Registry with the postgres, mysql and sqlite drivers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PostgresDriver::new()));
        registry.register(Arc::new(MySqlDriver::new()));
        registry.register(Arc::new(SqliteDriver::new()));
        registry
    }

    /// Registers a new driver
    ///
    /// The driver's `driver_id()` and `aliases()` are used as keys.
    pub fn register(&mut self, driver: Arc<dyn DataEngine>) {
        let id = driver.driver_id().to_string();
        for alias in driver.aliases() {
            self.aliases.insert(alias.to_string(), id.clone());
        }
        self.drivers.insert(id, driver);
    }

    /// Gets a driver by tag; case-insensitive, aliases accepted
    pub fn get(&self, tag: &str) -> Option<Arc<dyn DataEngine>> {
        let tag = tag.trim().to_ascii_lowercase();
        let id = self.aliases.get(&tag).unwrap_or(&tag);
        self.drivers.get(id).cloned()
    }

    /// Lists all registered drivers with their metadata, sorted by id.
    pub fn list_infos(&self) -> Vec<DriverInfo> {
        let mut infos: Vec<DriverInfo> = self
            .drivers
            .values()
            .map(|driver| DriverInfo {
                id: driver.driver_id().to_string(),
                name: driver.driver_name().to_string(),
                aliases: driver.aliases().iter().map(|a| a.to_string()).collect(),
            })
            .collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    /// Returns the number of registered drivers
    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Returns true if no drivers are registered
    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
