//! Validation that the table's `id` column can drive range partitioning.
//!
//! Counting by id ranges is only sound when `id` is an integer primary key:
//! unique, indexed, and totally ordered by `BETWEEN`.

use crate::source::{SourceError, TableSource};
use crate::table::TableName;

/// Integer data types accepted for the id column (narrow through wide).
const INTEGER_TYPES: &[&str] = &["tinyint", "smallint", "mediumint", "int", "integer", "bigint"];

/// Metadata of a table's `id` column as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdColumnInfo {
    pub name: String,
    /// Data type as reported (`int`, `bigint`, `INTEGER`, `varchar(50)`, ...).
    pub data_type: String,
    pub primary_key: bool,
}

impl IdColumnInfo {
    /// True if the data type belongs to the integer family.
    ///
    /// Only the leading type word is compared, so `int(11)` and
    /// `bigint unsigned` are accepted.
    pub fn is_integer_type(&self) -> bool {
        let base: String = self
            .data_type
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_lowercase();
        INTEGER_TYPES.contains(&base.as_str())
    }

    pub fn is_named_id(&self) -> bool {
        self.name.eq_ignore_ascii_case("id")
    }

    /// True if the column is named `id`, is the primary key and is an integer.
    pub fn is_integer_primary_key(&self) -> bool {
        self.is_named_id() && self.primary_key && self.is_integer_type()
    }
}

/// Fatal precondition failure for a table.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to get column information for 'id' in table {table}: {source}")]
    Metadata {
        table: String,
        #[source]
        source: SourceError,
    },
    #[error(
        "the 'id' column is not an integer primary key in the {table} table \
         (name={name}, type={data_type}, primary_key={primary_key})"
    )]
    NotIntegerPrimaryKey {
        table: String,
        name: String,
        data_type: String,
        primary_key: bool,
    },
}

/// Queries the `id` column metadata and checks it is an integer primary key.
///
/// Issues exactly one metadata query.
pub async fn validate_id_column<S: TableSource>(
    source: &S,
    table: &TableName,
) -> Result<IdColumnInfo, SchemaError> {
    let info = source
        .id_column(table)
        .await
        .map_err(|source| SchemaError::Metadata {
            table: table.to_string(),
            source,
        })?;

    if !info.is_integer_primary_key() {
        return Err(SchemaError::NotIntegerPrimaryKey {
            table: table.to_string(),
            name: info.name,
            data_type: info.data_type,
            primary_key: info.primary_key,
        });
    }

    tracing::debug!(
        table = %table,
        data_type = %info.data_type,
        "id column is an integer primary key"
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, data_type: &str, primary_key: bool) -> IdColumnInfo {
        IdColumnInfo {
            name: name.to_string(),
            data_type: data_type.to_string(),
            primary_key,
        }
    }

    #[test]
    fn accepts_integer_family() {
        for ty in ["int", "bigint", "INTEGER", "tinyint", "smallint", "mediumint"] {
            assert!(column("id", ty, true).is_integer_primary_key(), "{ty}");
        }
    }

    #[test]
    fn accepts_display_width_and_unsigned() {
        assert!(column("id", "int(11)", true).is_integer_primary_key());
        assert!(column("id", "bigint unsigned", true).is_integer_primary_key());
    }

    #[test]
    fn rejects_varchar_primary_key() {
        assert!(!column("id", "varchar", true).is_integer_primary_key());
        assert!(!column("id", "VARCHAR(50)", true).is_integer_primary_key());
    }

    #[test]
    fn rejects_non_primary_integer() {
        assert!(!column("id", "int", false).is_integer_primary_key());
    }

    #[test]
    fn rejects_other_column_name() {
        assert!(!column("user_id", "int", true).is_integer_primary_key());
        assert!(column("ID", "int", true).is_integer_primary_key());
    }

    #[test]
    fn rejects_lookalike_types() {
        assert!(!column("id", "point", true).is_integer_type());
        assert!(!column("id", "interval", true).is_integer_type());
        assert!(!column("id", "", true).is_integer_type());
    }
}
