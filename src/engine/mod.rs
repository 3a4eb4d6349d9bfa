// SPDX-License-Identifier: Apache-2.0

// Data Engine Module
// Scatter-gather over heterogeneous relational targets

pub mod drivers;
pub mod error;
pub mod mapping;
pub mod merge;
pub mod orchestrator;
pub mod predicate;
pub mod registry;
pub mod sql;
pub mod targets;
pub mod traits;
pub mod types;

pub use error::{EngineError, EngineResult};
pub use mapping::NameMapping;
pub use orchestrator::{FanoutSettings, Orchestrator};
pub use predicate::Predicate;
pub use registry::DriverRegistry;
pub use targets::{Target, TargetRegistry};
pub use traits::{DataEngine, TargetStore};
pub use types::*;
