// SPDX-License-Identifier: Apache-2.0

//! Predicate Builder
//!
//! Translates a store-agnostic filter into a conjunction of equality clauses
//! over one target's physical columns. The builder never talks to a store.

use serde::Serialize;

use crate::engine::mapping::NameMapping;
use crate::engine::types::{LogicalField, LogicalFilter};

/// One `physical_column = value` constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clause {
    pub field: LogicalField,
    pub column: String,
    pub value: String,
}

/// Conjunction of exact-string equality clauses. No clauses matches all rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Bind values in clause order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.clauses.iter().map(|c| c.value.as_str())
    }
}

/// Builds the predicate a target must execute for `filter`.
pub fn build(mapping: &NameMapping, filter: &LogicalFilter) -> Predicate {
    let clauses = filter
        .constraints()
        .map(|(field, value)| Clause {
            field,
            column: mapping.resolve_column(field).to_string(),
            value: value.to_string(),
        })
        .collect();

    Predicate { clauses }
}
