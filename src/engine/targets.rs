// SPDX-License-Identifier: Apache-2.0

//! Target Registry
//!
//! Holds one descriptor per configured store, in registration order.
//! Built once at startup and read-only afterwards; construction either
//! binds every target or fails as a whole.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::config::HubConfig;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::mapping::NameMapping;
use crate::engine::registry::DriverRegistry;
use crate::engine::traits::TargetStore;

/// One configured store and its bound capability
pub struct Target {
    name: String,
    driver_id: String,
    mapping: NameMapping,
    store: Arc<dyn TargetStore>,
}

impl Target {
    pub fn new(
        name: impl Into<String>,
        driver_id: impl Into<String>,
        mapping: NameMapping,
        store: Arc<dyn TargetStore>,
    ) -> Self {
        Self {
            name: name.into(),
            driver_id: driver_id.into(),
            mapping,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    pub fn mapping(&self) -> &NameMapping {
        &self.mapping
    }

    pub fn store(&self) -> &Arc<dyn TargetStore> {
        &self.store
    }

    /// Serializable summary: driver, physical table and renamed columns
    pub fn info(&self) -> TargetInfo {
        TargetInfo {
            name: self.name.clone(),
            driver: self.driver_id.clone(),
            table: self.mapping.resolve_table().to_string(),
            mapping: self
                .mapping
                .overrides()
                .into_iter()
                .map(|(logical, physical)| (logical.to_string(), physical.to_string()))
                .collect(),
        }
    }
}

/// What a configured target resolved to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetInfo {
    pub name: String,
    pub driver: String,
    pub table: String,
    /// Logical fields stored under a different column name
    pub mapping: BTreeMap<String, String>,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("name", &self.name)
            .field("driver_id", &self.driver_id)
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable set of targets
#[derive(Debug, Default)]
pub struct TargetRegistry {
    targets: Vec<Arc<Target>>,
    index: HashMap<String, usize>,
}

impl TargetRegistry {
    /// Builds a registry from already-bound targets.
    ///
    /// Fails on an empty or duplicated name.
    pub fn from_targets(targets: Vec<Target>) -> EngineResult<Self> {
        let mut registry = Self::default();
        for target in targets {
            let name = target.name.trim();
            if name.is_empty() {
                return Err(EngineError::configuration("Target name must not be empty"));
            }
            if registry.index.contains_key(name) {
                return Err(EngineError::configuration(format!(
                    "Duplicate target name '{}'",
                    name
                )));
            }
            registry.index.insert(name.to_string(), registry.targets.len());
            registry.targets.push(Arc::new(target));
        }
        Ok(registry)
    }

    /// Binds every configured target through its driver.
    ///
    /// Unknown store kinds, malformed mappings, bad connection settings,
    /// duplicate names and an empty target list are all fatal. Must be
    /// called inside a Tokio runtime (pools spawn their maintenance tasks).
    pub fn from_config(config: &HubConfig, drivers: &DriverRegistry) -> EngineResult<Self> {
        if config.targets.is_empty() {
            return Err(EngineError::configuration("At least one target must be configured"));
        }

        let mut targets = Vec::with_capacity(config.targets.len());
        for target_config in &config.targets {
            let driver = drivers.get(&target_config.driver).ok_or_else(|| {
                EngineError::configuration(format!(
                    "Target '{}': no driver for store kind '{}'",
                    target_config.name, target_config.driver
                ))
            })?;

            let mapping = target_config.name_mapping()?;
            let store = driver.open(target_config)?;

            info!(
                target_name = %target_config.name,
                driver = driver.driver_id(),
                table = mapping.resolve_table(),
                "Configured target"
            );

            targets.push(Target::new(
                target_config.name.trim(),
                driver.driver_id(),
                mapping,
                store,
            ));
        }

        Self::from_targets(targets)
    }

    /// Target names in registration order
    pub fn list(&self) -> Vec<&str> {
        self.targets.iter().map(|t| t.name()).collect()
    }

    /// Gets a target by name
    pub fn get(&self, name: &str) -> EngineResult<Arc<Target>> {
        self.index
            .get(name)
            .map(|&i| Arc::clone(&self.targets[i]))
            .ok_or_else(|| EngineError::not_found(name))
    }

    /// Targets in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Target>> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Closes every target's connection pool
    pub async fn close(&self) {
        for target in &self.targets {
            target.store.close().await;
        }
    }
}
