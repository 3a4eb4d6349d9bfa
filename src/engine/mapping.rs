// SPDX-License-Identifier: Apache-2.0

//! Name Mapping
//!
//! Resolves logical field and table names to the physical names used by one
//! target. A mapping is built once at startup from configuration and is
//! read-only afterwards; request handling never re-parses mapping text.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::engine::error::{EngineError, EngineResult};
use crate::engine::types::{LogicalField, DEFAULT_TABLE};

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]{0,127}$").expect("identifier pattern is valid")
    })
}

fn check_identifier(kind: &str, name: &str) -> EngineResult<()> {
    if name.is_empty() {
        return Err(EngineError::configuration(format!("{} name must not be empty", kind)));
    }
    if !identifier_pattern().is_match(name) {
        return Err(EngineError::configuration(format!(
            "Invalid {} name '{}': expected letters, digits, '_' or '$', not starting with a digit",
            kind, name
        )));
    }
    Ok(())
}

/// Physical names of the logical record inside one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameMapping {
    table: String,
    id: String,
    username: String,
    name: String,
    surname: String,
}

impl Default for NameMapping {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            id: LogicalField::Id.as_str().to_string(),
            username: LogicalField::Username.as_str().to_string(),
            name: LogicalField::Name.as_str().to_string(),
            surname: LogicalField::Surname.as_str().to_string(),
        }
    }
}

impl NameMapping {
    /// Builds a mapping from declarative `logical -> physical` entries.
    ///
    /// A missing table falls back to `users`; missing fields keep their
    /// logical name. Unknown logical keys, invalid physical names and two
    /// fields mapped onto the same column are rejected.
    pub fn from_entries<'a, I>(table: Option<&str>, entries: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut mapping = Self::default();

        if let Some(table) = table.map(str::trim).filter(|t| !t.is_empty()) {
            check_identifier("table", table)?;
            mapping.table = table.to_string();
        }

        for (logical, physical) in entries {
            let field = LogicalField::parse(logical)?;
            let physical = physical.trim();
            check_identifier(&format!("column for '{}'", field), physical)?;
            *mapping.slot_mut(field) = physical.to_string();
        }

        mapping.check_distinct()?;
        Ok(mapping)
    }

    /// Parses the inline form `{id=foo_id, name=foo_name}`.
    ///
    /// Braces are optional and entries are comma separated. Blank input
    /// yields the default mapping.
    pub fn parse_inline(table: Option<&str>, text: &str) -> EngineResult<Self> {
        let trimmed = text.trim();
        let body = match (trimmed.strip_prefix('{'), trimmed.ends_with('}')) {
            (Some(rest), true) => &rest[..rest.len() - 1],
            (None, false) => trimmed,
            _ => {
                return Err(EngineError::configuration(format!(
                    "Malformed mapping '{}': unbalanced braces",
                    text
                )))
            }
        };

        let mut entries = Vec::new();
        for entry in body.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (logical, physical) = entry.split_once('=').ok_or_else(|| {
                EngineError::configuration(format!(
                    "Malformed mapping entry '{}': expected logical=physical",
                    entry
                ))
            })?;
            if physical.contains('=') {
                return Err(EngineError::configuration(format!(
                    "Malformed mapping entry '{}': more than one '='",
                    entry
                )));
            }
            entries.push((logical.trim(), physical.trim()));
        }

        Self::from_entries(table, entries)
    }

    /// Physical table name.
    pub fn resolve_table(&self) -> &str {
        &self.table
    }

    /// Physical column for a logical field.
    pub fn resolve_column(&self, field: LogicalField) -> &str {
        match field {
            LogicalField::Id => &self.id,
            LogicalField::Username => &self.username,
            LogicalField::Name => &self.name,
            LogicalField::Surname => &self.surname,
        }
    }

    /// Physical column for a logical field given by name.
    pub fn resolve_column_name(&self, logical: &str) -> EngineResult<&str> {
        Ok(self.resolve_column(LogicalField::parse(logical)?))
    }

    /// Physical columns in `LogicalField::ALL` order.
    pub fn columns(&self) -> [&str; 4] {
        LogicalField::ALL.map(|field| self.resolve_column(field))
    }

    /// The non-default entries, as they would be written in configuration.
    pub fn overrides(&self) -> BTreeMap<&'static str, &str> {
        LogicalField::ALL
            .iter()
            .filter(|field| self.resolve_column(**field) != field.as_str())
            .map(|field| (field.as_str(), self.resolve_column(*field)))
            .collect()
    }

    fn slot_mut(&mut self, field: LogicalField) -> &mut String {
        match field {
            LogicalField::Id => &mut self.id,
            LogicalField::Username => &mut self.username,
            LogicalField::Name => &mut self.name,
            LogicalField::Surname => &mut self.surname,
        }
    }

    fn check_distinct(&self) -> EngineResult<()> {
        let columns = self.columns();
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|other| other.eq_ignore_ascii_case(column)) {
                return Err(EngineError::configuration(format!(
                    "Column '{}' is mapped from more than one logical field",
                    column
                )));
            }
        }
        Ok(())
    }
}
