// SPDX-License-Identifier: Apache-2.0

//! Data types shared by the AggregateHub engine
//!
//! The logical record, the store-agnostic filter and the per-target outcome
//! types that flow between the orchestrator and the result merger.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::error::{EngineError, EngineResult};

/// Logical table name used when a target does not configure its own.
pub const DEFAULT_TABLE: &str = "users";

/// Unique identifier for one fan-out (query or replicate call)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FanoutId(pub Uuid);

impl FanoutId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FanoutId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FanoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The closed set of logical fields of the replicated record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalField {
    Id,
    Username,
    Name,
    Surname,
}

impl LogicalField {
    /// Column order used for every SELECT and INSERT.
    pub const ALL: [LogicalField; 4] = [
        LogicalField::Id,
        LogicalField::Username,
        LogicalField::Name,
        LogicalField::Surname,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::Name => "name",
            Self::Surname => "surname",
        }
    }

    /// Parses a logical field name. Names outside the closed set are a
    /// contract violation.
    pub fn parse(name: &str) -> EngineResult<Self> {
        match name.trim() {
            "id" => Ok(Self::Id),
            "username" => Ok(Self::Username),
            "name" => Ok(Self::Name),
            "surname" => Ok(Self::Surname),
            other => Err(EngineError::configuration(format!(
                "Unknown logical field '{}' (expected one of id, name, surname, username)",
                other
            ))),
        }
    }

    /// Inclusive length bounds enforced on writes.
    fn length_bounds(&self) -> (usize, usize) {
        match self {
            Self::Id => (1, 50),
            Self::Username => (3, 50),
            Self::Name | Self::Surname => (1, 50),
        }
    }
}

impl fmt::Display for LogicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The replicated entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRecord {
    pub id: String,
    pub username: String,
    pub name: String,
    pub surname: String,
}

impl LogicalRecord {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        name: impl Into<String>,
        surname: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            name: name.into(),
            surname: surname.into(),
        }
    }

    pub fn get(&self, field: LogicalField) -> &str {
        match field {
            LogicalField::Id => &self.id,
            LogicalField::Username => &self.username,
            LogicalField::Name => &self.name,
            LogicalField::Surname => &self.surname,
        }
    }

    /// Checks every field against its length bounds.
    ///
    /// All violations are reported together so the caller can fix the
    /// record in one round trip.
    pub fn validate(&self) -> EngineResult<()> {
        let violations: Vec<String> = LogicalField::ALL
            .iter()
            .filter_map(|field| {
                let value = self.get(*field);
                let (min, max) = field.length_bounds();
                let len = value.chars().count();
                if value.trim().is_empty() {
                    Some(format!("{} must not be empty", field))
                } else if len < min || len > max {
                    Some(format!(
                        "{} must be between {} and {} characters (got {})",
                        field, min, max, len
                    ))
                } else {
                    None
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(EngineError::validation(violations.join("; ")))
        }
    }

    /// Two copies of a user are the same person when username, name and
    /// surname match; the id is store-local.
    pub fn same_person(&self, other: &LogicalRecord) -> bool {
        self.username == other.username && self.name == other.name && self.surname == other.surname
    }
}

/// Optional equality constraints, ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl LogicalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: LogicalField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            LogicalField::Id => self.id = value,
            LogicalField::Username => self.username = value,
            LogicalField::Name => self.name = value,
            LogicalField::Surname => self.surname = value,
        }
        self
    }

    /// Returns the constraint for a field, treating empty strings as absent.
    pub fn get(&self, field: LogicalField) -> Option<&str> {
        let value = match field {
            LogicalField::Id => &self.id,
            LogicalField::Username => &self.username,
            LogicalField::Name => &self.name,
            LogicalField::Surname => &self.surname,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    /// Present constraints in predicate order: id, name, surname, username.
    pub fn constraints(&self) -> impl Iterator<Item = (LogicalField, &str)> {
        [
            LogicalField::Id,
            LogicalField::Name,
            LogicalField::Surname,
            LogicalField::Username,
        ]
        .into_iter()
        .filter_map(move |field| self.get(field).map(|value| (field, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.constraints().next().is_none()
    }
}

/// Terminal status of one target's part of a fan-out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Classification recorded for a failed target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Connection,
    Query,
    Timeout,
    Internal,
    Merge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFailure {
    pub class: ErrorClass,
    pub message: String,
}

/// Result of one target's operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerTargetOutcome {
    pub target: String,
    pub status: OutcomeStatus,
    /// Records returned by a read. Empty for writes, and emptied by the
    /// merger once moved into the aggregated list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<LogicalRecord>,
    pub record_count: usize,
    pub elapsed_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TargetFailure>,
}

impl PerTargetOutcome {
    pub fn success(target: impl Into<String>, records: Vec<LogicalRecord>, elapsed_ms: f64) -> Self {
        Self {
            target: target.into(),
            status: OutcomeStatus::Success,
            record_count: records.len(),
            records,
            elapsed_ms,
            error: None,
        }
    }

    pub fn failure(
        target: impl Into<String>,
        class: ErrorClass,
        message: impl Into<String>,
        elapsed_ms: f64,
    ) -> Self {
        Self {
            target: target.into(),
            status: OutcomeStatus::Failure,
            records: Vec::new(),
            record_count: 0,
            elapsed_ms,
            error: Some(TargetFailure {
                class,
                message: message.into(),
            }),
        }
    }

    pub fn from_error(target: impl Into<String>, err: &EngineError, elapsed_ms: f64) -> Self {
        Self::failure(target, err.classify(), err.to_string(), elapsed_ms)
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }

    pub fn error_class(&self) -> Option<ErrorClass> {
        self.error.as_ref().map(|e| e.class)
    }
}

/// Merged result of a read fan-out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// Success payloads concatenated in registration order.
    pub records: Vec<LogicalRecord>,
    /// One entry per registered target, registration order.
    pub outcomes: Vec<PerTargetOutcome>,
}

impl AggregatedResult {
    pub fn succeeded_targets(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.target.as_str())
            .collect()
    }

    pub fn failed_targets(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_success())
            .map(|o| o.target.as_str())
            .collect()
    }

    pub fn outcome(&self, target: &str) -> Option<&PerTargetOutcome> {
        self.outcomes.iter().find(|o| o.target == target)
    }
}
