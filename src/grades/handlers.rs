use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use super::{
    dto::{CreateGradeRequest, UpdateGradeRequest},
    services::{parse_id, record_grade, to_patch},
};
use crate::{
    auth::AuthUser,
    error::{ApiError, AppJson, AppPath},
    ledger::Grade,
    response::{Ack, Created},
    state::AppState,
};

pub fn grade_routes() -> Router<AppState> {
    Router::new().route("/grades", post(create_grade)).route(
        "/grades/:id",
        get(get_grade).put(update_grade).delete(delete_grade),
    )
}

#[instrument(skip(state, payload, _user))]
pub async fn create_grade(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(payload): AppJson<CreateGradeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let grade = record_grade(state.ledger.as_ref(), payload).await?;
    Ok(Created::new(grade.id.to_string()))
}

#[instrument(skip(state))]
pub async fn get_grade(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<Grade>, ApiError> {
    let id = parse_id(&id)?;
    state
        .ledger
        .find_grade(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("grade '{id}' not found")))
}

#[instrument(skip(state, payload, _user))]
pub async fn update_grade(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<UpdateGradeRequest>,
) -> Result<Json<Ack>, ApiError> {
    let id = parse_id(&id)?;
    let patch = to_patch(payload)?;
    let grade = state.ledger.update_grade(id, &patch).await?;
    info!(grade_id = %id, grade = grade.grade, "grade updated");
    Ok(Ack::ok())
}

#[instrument(skip(state, _user))]
pub async fn delete_grade(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Ack>, ApiError> {
    let id = parse_id(&id)?;
    state.ledger.delete_grade(id).await?;
    info!(grade_id = %id, "grade deleted");
    Ok(Ack::ok())
}
