use axum::{extract::State, routing::get, Json, Router};
use tracing::{debug, instrument};

use super::{
    dto::{CourseStatsResponse, GlobalStatsResponse, StudentStatsResponse},
    services::{self, RosterRow, TranscriptRow},
};
use crate::{error::{ApiError, AppPath}, state::AppState};

pub fn stats_routes() -> Router<AppState> {
    Router::new()
        .route("/students/:id/grades", get(student_grades))
        .route("/students/:id/stats", get(student_stats))
        .route("/courses/:id/grades", get(course_grades))
        .route("/courses/:id/stats", get(course_stats))
        .route("/stats/global", get(global_stats))
}

#[instrument(skip(state))]
pub async fn student_grades(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<Vec<TranscriptRow>>, ApiError> {
    let (_, rows) = services::student_transcript(state.ledger.as_ref(), &id).await?;
    debug!(student_id = %id, rows = rows.len(), "transcript built");
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn student_stats(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<StudentStatsResponse>, ApiError> {
    let (student, stats) = services::student_stats(state.ledger.as_ref(), &id).await?;
    Ok(Json(StudentStatsResponse {
        student,
        stats: stats.summary,
        pass_rate: stats.pass_rate,
    }))
}

#[instrument(skip(state))]
pub async fn course_grades(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<Vec<RosterRow>>, ApiError> {
    let (_, rows) = services::course_roster(state.ledger.as_ref(), &id).await?;
    debug!(course_id = %id, rows = rows.len(), "roster built");
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn course_stats(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<CourseStatsResponse>, ApiError> {
    let (course, stats) = services::course_stats(state.ledger.as_ref(), &id).await?;
    Ok(Json(CourseStatsResponse {
        course,
        stats: stats.summary,
        student_count: stats.student_count,
        pass_rate: stats.pass_rate,
    }))
}

#[instrument(skip_all)]
pub async fn global_stats(
    State(state): State<AppState>,
) -> Result<Json<GlobalStatsResponse>, ApiError> {
    let global = services::global_overview(state.ledger.as_ref()).await?;
    Ok(Json(global.into()))
}
