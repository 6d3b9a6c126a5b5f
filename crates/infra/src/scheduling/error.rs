//! Scheduler error types

use chime_domain::ChimeError;
use thiserror::Error;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// No timer is currently armed
    #[error("No timer armed")]
    NotArmed,

    /// Operation timed out
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// Task join failed
    #[error("Task join failed: {0}")]
    TaskJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let domain_err = match err {
            SchedulerError::NotArmed => ChimeError::InvalidInput(err.to_string()),
            SchedulerError::Timeout { .. } | SchedulerError::TaskJoinFailed(_) => {
                ChimeError::Internal(err.to_string())
            }
        };
        Self(domain_err)
    }
}

impl From<SchedulerError> for ChimeError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
