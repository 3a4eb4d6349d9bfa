// SPDX-License-Identifier: Apache-2.0

//! Result Merger
//!
//! Combines per-target outcomes into the caller-facing result. Merging never
//! fails: a fan-out where no target succeeded yields an empty record list
//! alongside the failure outcomes.

use tracing::error;

use crate::engine::types::{AggregatedResult, ErrorClass, PerTargetOutcome};

/// Turns registration-indexed slots into outcomes.
///
/// A slot left empty by the join loop is a bookkeeping bug, not a target
/// failure; it is reported as a `Merge` failure so cardinality still holds.
pub fn fill_slots<S: AsRef<str>>(
    names: &[S],
    slots: Vec<Option<PerTargetOutcome>>,
) -> Vec<PerTargetOutcome> {
    let mut slots = slots.into_iter();
    names
        .iter()
        .map(|name| match slots.next().flatten() {
            Some(outcome) => outcome,
            None => {
                error!(target_name = name.as_ref(), "Fan-out slot has no outcome");
                PerTargetOutcome::failure(
                    name.as_ref(),
                    ErrorClass::Merge,
                    "no outcome recorded for target",
                    0.0,
                )
            }
        })
        .collect()
}

/// Concatenates Success payloads in outcome order.
///
/// Records are moved out of each outcome; `record_count` keeps the
/// per-target tally. No deduplication is performed.
pub fn merge_reads(mut outcomes: Vec<PerTargetOutcome>) -> AggregatedResult {
    let total = outcomes
        .iter()
        .filter(|o| o.is_success())
        .map(|o| o.records.len())
        .sum::<usize>();

    let mut records = Vec::with_capacity(total);
    for outcome in outcomes.iter_mut().filter(|o| o.is_success()) {
        records.append(&mut outcome.records);
    }

    AggregatedResult { records, outcomes }
}

/// Write outcomes carry no payload; they are returned in outcome order.
pub fn merge_writes(mut outcomes: Vec<PerTargetOutcome>) -> Vec<PerTargetOutcome> {
    for outcome in &mut outcomes {
        outcome.records.clear();
    }
    outcomes
}

pub fn all_succeeded(outcomes: &[PerTargetOutcome]) -> bool {
    outcomes.iter().all(PerTargetOutcome::is_success)
}

pub fn any_succeeded(outcomes: &[PerTargetOutcome]) -> bool {
    outcomes.iter().any(PerTargetOutcome::is_success)
}
