//! Conversions from external infrastructure errors into domain errors.

use chime_domain::ChimeError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can
/// be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub ChimeError);

impl From<InfraError> for ChimeError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<ChimeError> for InfraError {
    fn from(value: ChimeError) -> Self {
        Self(value)
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        use rusqlite::ffi::ErrorCode;

        let mapped = match &value {
            SqlError::SqliteFailure(err, _) => match err.code {
                ErrorCode::DatabaseBusy => ChimeError::Store("database is busy".into()),
                ErrorCode::DatabaseLocked => ChimeError::Store("database is locked".into()),
                ErrorCode::ConstraintViolation => {
                    ChimeError::Store("constraint violation".into())
                }
                _ => ChimeError::Store(value.to_string()),
            },
            SqlError::QueryReturnedNoRows => ChimeError::NotFound("no matching row".into()),
            _ => ChimeError::Store(value.to_string()),
        };
        Self(mapped)
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        Self(ChimeError::Store(format!("connection pool error: {value}")))
    }
}

/// Map a blocking-task join failure onto the domain error.
pub fn map_join_error(err: tokio::task::JoinError) -> ChimeError {
    ChimeError::Internal(format!("blocking task failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_rows_maps_to_not_found() {
        let err: InfraError = SqlError::QueryReturnedNoRows.into();
        assert!(matches!(err.0, ChimeError::NotFound(_)));
    }

    #[test]
    fn round_trips_through_the_domain_error() {
        let original = ChimeError::Store("broken".into());
        let infra: InfraError = original.into();
        let back: ChimeError = infra.into();
        assert!(matches!(back, ChimeError::Store(_)));
    }
}
