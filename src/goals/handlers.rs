use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    day,
    error::GoalError,
    goals::{
        dto::{CreateGoalRequest, UpdateGoalRequest},
        repo_types::NutritionGoal,
    },
    state::{reject, AppState},
    tracking::GoalProgressReport,
};

pub fn goal_routes() -> Router<AppState> {
    Router::new()
        .route("/goals", post(create_goal))
        .route("/goals/active", get(get_active_goal))
        .route("/goals/progress", post(check_progress))
        .route("/goals/:id", put(update_goal))
}

/// GET /goals/active: the active goal, bootstrapping the default one on first use.
#[instrument(skip(state))]
pub async fn get_active_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<NutritionGoal>, (StatusCode, String)> {
    let goal = state
        .run(state.engine.get_or_bootstrap_goal(user_id))
        .await?;
    Ok(Json(goal))
}

/// POST /goals: replaces the active goal.
#[instrument(skip(state, body))]
pub async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<CreateGoalRequest>,
) -> Result<(StatusCode, HeaderMap, Json<NutritionGoal>), (StatusCode, String)> {
    let targets = body.into_targets();
    let goal = state.run(state.engine.create_goal(user_id, targets)).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/v1/goals/{}", goal.id).parse::<HeaderValue>() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    info!(%user_id, goal_id = %goal.id, "goal created");
    Ok((StatusCode::CREATED, headers, Json(goal)))
}

/// PUT /goals/:id: edits targets of one of the caller's goals.
#[instrument(skip(state, body))]
pub async fn update_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateGoalRequest>,
) -> Result<Json<NutritionGoal>, (StatusCode, String)> {
    let current = state.run(state.engine.goal(id)).await?;
    if current.user_id != user_id {
        warn!(%user_id, goal_id = %id, "goal belongs to another user");
        return Err(reject(GoalError::NotFound(id)));
    }

    let targets = body.apply_to(current.targets);
    let goal = state
        .run(state.engine.update_goal_targets(id, targets))
        .await?;
    Ok(Json(goal))
}

/// POST /goals/progress: evaluates today's meals against the active goal.
#[instrument(skip(state))]
pub async fn check_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<GoalProgressReport>, (StatusCode, String)> {
    let report = state
        .run(state.engine.check_and_update(user_id, day::today()))
        .await?;
    Ok(Json(report))
}
