use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::AuthUser,
    day,
    ledger::dto::DailyLogQuery,
    state::AppState,
    tracking::aggregator::DailySummary,
};

pub fn ledger_routes() -> Router<AppState> {
    Router::new().route("/meal-logs", get(daily_log))
}

/// GET /meal-logs?date=YYYY-MM-DD: the day's meals and their totals.
#[instrument(skip(state))]
pub async fn daily_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<DailyLogQuery>,
) -> Result<Json<DailySummary>, (StatusCode, String)> {
    let date = match q.date.as_deref() {
        Some(raw) => day::parse_day(raw).map_err(|e| {
            warn!(error = %e, raw, "bad date query");
            (
                StatusCode::BAD_REQUEST,
                "date must be YYYY-MM-DD".to_string(),
            )
        })?,
        None => day::today(),
    };

    let summary = state.run(state.engine.daily_summary(user_id, date)).await?;
    Ok(Json(summary))
}
