//! Errors returned by table sources.

/// Failure of a single query against the target database.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The max-id query returned no row.
    #[error("table {0} is empty")]
    EmptyTable(String),
    /// The metadata query found no column named `id`.
    #[error("column 'id' not found in table {0}")]
    ColumnNotFound(String),
    /// An id bound does not fit the database's signed 64-bit integer.
    #[error("id {0} is out of range for the database")]
    IdOutOfRange(u64),
    /// The max-id query returned something that is not an integer.
    #[error("unexpected id value {0:?}")]
    InvalidId(String),
    /// The connection string scheme does not name a supported backend.
    #[error("unsupported database URL scheme {0:?} (expected mysql, mariadb or sqlite)")]
    UnsupportedScheme(String),
    #[error("invalid database URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Driver or connection failure (syntax, permission, dropped connection).
    #[error(transparent)]
    Query(#[from] sqlx::Error),
}

/// Converts an id bound to the signed type drivers bind.
pub(crate) fn id_param(id: u64) -> Result<i64, SourceError> {
    i64::try_from(id).map_err(|_| SourceError::IdOutOfRange(id))
}

/// Parses a max id selected as text. Negative ids clamp to 0; ids above
/// `i64::MAX` cannot be bound as range bounds and are rejected.
pub(crate) fn parse_max_id(text: &str) -> Result<u64, SourceError> {
    let text = text.trim();
    if text.starts_with('-') {
        return text
            .parse::<i64>()
            .map(non_negative)
            .map_err(|_| SourceError::InvalidId(text.to_string()));
    }
    let id = text
        .parse::<u64>()
        .map_err(|_| SourceError::InvalidId(text.to_string()))?;
    id_param(id)?;
    Ok(id)
}

/// Converts a `COUNT(..)` or max-id value to an unsigned id/count; negatives clamp to 0.
pub(crate) fn non_negative(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
