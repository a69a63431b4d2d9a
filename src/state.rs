use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use tracing::{debug, error, warn};

use crate::config::AppConfig;
use crate::db;
use crate::error::{GoalError, GoalResult};
use crate::goals::repo::PgGoalRepository;
use crate::ledger::repo::PgMealLedger;
use crate::tracking::GoalTrackingEngine;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<GoalTrackingEngine>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::connect(&config).await?;
        db::run_migrations(&db).await;

        let engine = Arc::new(GoalTrackingEngine::new(
            Arc::new(PgGoalRepository::new(db.clone())),
            Arc::new(PgMealLedger::new(db)),
            config.tracking,
        ));

        Ok(Self { config, engine })
    }

    /// Runs an engine call under the configured request timeout and maps failures to
    /// an HTTP rejection.
    pub async fn run<T, F>(&self, call: F) -> Result<T, (StatusCode, String)>
    where
        F: Future<Output = GoalResult<T>>,
    {
        let limit = self.config.request_timeout;
        let result = match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(GoalError::Timeout(limit)),
        };
        result.map_err(reject)
    }
}

pub fn reject(e: GoalError) -> (StatusCode, String) {
    let status = e.status_code();
    if status.is_server_error() {
        error!(error = %e, %status, "goal request failed");
    } else if e.is_retryable() {
        warn!(error = %e, %status, "goal request should be retried");
    } else {
        debug!(error = %e, %status, "goal request rejected");
    }
    (status, e.to_string())
}
