//! Validated table identifiers.
//!
//! Table names end up inside SQL text (identifiers cannot be bound as
//! parameters), so they are restricted to plain identifier characters and
//! quoted per backend before interpolation. The name is still assumed to come
//! from the operator running the tool, not from an untrusted user.

use std::fmt;
use std::str::FromStr;

/// Longest identifier part accepted (MySQL's identifier limit).
const MAX_PART_LEN: usize = 64;

/// Reason a table name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableNameError {
    #[error("table name is empty")]
    Empty,
    #[error("table name has more than two dot-separated parts: {0}")]
    TooManyParts(String),
    #[error("table name part is empty in {0:?}")]
    EmptyPart(String),
    #[error("table name part {0:?} is longer than 64 characters")]
    TooLong(String),
    #[error("table name part {0:?} starts with a digit")]
    LeadingDigit(String),
    #[error("table name {name:?} contains unsupported character {ch:?}")]
    InvalidChar { name: String, ch: char },
}

/// A table name, optionally qualified by a schema (`schema.table`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    schema: Option<String>,
    table: String,
}

impl TableName {
    pub fn parse(raw: &str) -> Result<Self, TableNameError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(TableNameError::Empty);
        }
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() > 2 {
            return Err(TableNameError::TooManyParts(raw.to_string()));
        }
        for part in &parts {
            check_part(raw, part)?;
        }
        let (schema, table) = match parts.as_slice() {
            [table] => (None, table.to_string()),
            [schema, table] => (Some(schema.to_string()), table.to_string()),
            _ => unreachable!("length checked above"),
        };
        Ok(Self { schema, table })
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Unqualified table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Identifier quoted with backticks (MySQL / MariaDB).
    pub fn quoted_mysql(&self) -> String {
        self.quoted('`')
    }

    /// Identifier quoted with double quotes (SQLite / ANSI).
    pub fn quoted_ansi(&self) -> String {
        self.quoted('"')
    }

    fn quoted(&self, q: char) -> String {
        match &self.schema {
            Some(schema) => format!("{q}{schema}{q}.{q}{}{q}", self.table),
            None => format!("{q}{}{q}", self.table),
        }
    }
}

fn check_part(raw: &str, part: &str) -> Result<(), TableNameError> {
    if part.is_empty() {
        return Err(TableNameError::EmptyPart(raw.to_string()));
    }
    if part.len() > MAX_PART_LEN {
        return Err(TableNameError::TooLong(part.to_string()));
    }
    if part.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(TableNameError::LeadingDigit(part.to_string()));
    }
    if let Some(ch) = part
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$'))
    {
        return Err(TableNameError::InvalidChar {
            name: raw.to_string(),
            ch,
        });
    }
    Ok(())
}

impl FromStr for TableName {
    type Err = TableNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}
