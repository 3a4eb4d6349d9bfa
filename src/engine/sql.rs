// SPDX-License-Identifier: Apache-2.0

//! SQL rendering
//!
//! Generates driver-specific SELECT and INSERT statements for a target's
//! physical table. Values are always bound as parameters.

use crate::engine::mapping::NameMapping;
use crate::engine::predicate::Predicate;

/// SQL dialect for different database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Postgres,
    MySql,
    Sqlite,
}

impl SqlDialect {
    /// Renders a configured identifier.
    ///
    /// Postgres identifiers are left unquoted so the server folds them to
    /// lower case, matching tables created with unquoted DDL. Names are
    /// restricted to `[A-Za-z_][A-Za-z0-9_$]*` by the mapping resolver.
    pub fn ident(&self, name: &str) -> String {
        match self {
            SqlDialect::Postgres => name.to_string(),
            SqlDialect::Sqlite => format!("\"{}\"", name.replace('"', "\"\"")),
            SqlDialect::MySql => format!("`{}`", name.replace('`', "``")),
        }
    }

    /// Bind placeholder for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            SqlDialect::Postgres => format!("${}", index),
            SqlDialect::MySql | SqlDialect::Sqlite => "?".to_string(),
        }
    }

    fn column_list(&self, mapping: &NameMapping) -> String {
        mapping
            .columns()
            .iter()
            .map(|column| self.ident(column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// ` WHERE a = $1 AND b = $2`, or an empty string for a match-all predicate.
    pub fn where_clause(&self, predicate: &Predicate) -> String {
        if predicate.is_match_all() {
            return String::new();
        }

        let conditions = predicate
            .clauses()
            .iter()
            .enumerate()
            .map(|(i, clause)| format!("{} = {}", self.ident(&clause.column), self.placeholder(i + 1)))
            .collect::<Vec<_>>()
            .join(" AND ");

        format!(" WHERE {}", conditions)
    }

    /// SELECT of the four logical columns, in `LogicalField::ALL` order.
    pub fn select(&self, mapping: &NameMapping, predicate: &Predicate) -> String {
        format!(
            "SELECT {} FROM {}{}",
            self.column_list(mapping),
            self.ident(mapping.resolve_table()),
            self.where_clause(predicate)
        )
    }

    /// INSERT of one record; values bound in `LogicalField::ALL` order.
    pub fn insert(&self, mapping: &NameMapping) -> String {
        let params = (1..=4)
            .map(|i| self.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.ident(mapping.resolve_table()),
            self.column_list(mapping),
            params
        )
    }
}
