//! Mapping of database errors onto domain store errors.

use domain::services::StoreError;

/// Converts a sqlx error for the domain traits.
///
/// Unique violations become [`StoreError::Conflict`] so callers can tell a
/// duplicate apart from a backend failure.
pub fn to_store_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            StoreError::Conflict
        }
        _ => {
            tracing::error!(error = %err, "Database error");
            StoreError::Backend(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        assert_eq!(to_store_error(sqlx::Error::RowNotFound), StoreError::NotFound);
    }

    #[test]
    fn test_other_errors_map_to_backend() {
        let err = to_store_error(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Backend(_)));
    }
}
