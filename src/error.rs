use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the goal tracking engine and its repositories.
#[derive(Debug, Error)]
pub enum GoalError {
    #[error("invalid goal: {0}")]
    Validation(String),

    #[error("nutrition goal not found: {0}")]
    NotFound(Uuid),

    #[error("no active nutrition goal for user {0}")]
    NoActiveGoal(Uuid),

    #[error("concurrent update of {entity} {id}, retry with fresh state")]
    Conflict { entity: &'static str, id: Uuid },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("storage error: {0}")]
    Storage(String),
}

pub type GoalResult<T> = Result<T, GoalError>;

impl GoalError {
    pub fn goal_conflict(id: Uuid) -> Self {
        GoalError::Conflict {
            entity: "nutrition goal",
            id,
        }
    }

    /// Whether the caller may retry the operation with fresh state.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GoalError::Conflict { .. } | GoalError::Unavailable(_) | GoalError::Timeout(_)
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            GoalError::Validation(_) => StatusCode::BAD_REQUEST,
            GoalError::NotFound(_) => StatusCode::NOT_FOUND,
            GoalError::NoActiveGoal(_) | GoalError::Conflict { .. } => StatusCode::CONFLICT,
            GoalError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            GoalError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GoalError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for GoalError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                GoalError::Unavailable(err.to_string())
            }
            other => GoalError::Storage(other.to_string()),
        }
    }
}
