use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateStudentRequest, UpdateStudentRequest};
use crate::{
    auth::AuthUser,
    error::{ApiError, AppJson, AppPath},
    ledger::Student,
    response::{Ack, Created, Deleted},
    state::AppState,
};

pub fn student_routes() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/:id", put(update_student).delete(delete_student))
}

#[instrument(skip_all)]
pub async fn list_students(State(state): State<AppState>) -> Result<Json<Vec<Student>>, ApiError> {
    Ok(Json(state.ledger.list_students().await?))
}

#[instrument(skip(state, payload, _user))]
pub async fn create_student(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(payload): AppJson<CreateStudentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let student = payload.into_student()?;
    state.ledger.insert_student(&student).await?;
    info!(student_id = %student.student_id, "student created");
    Ok(Created::new(student.student_id))
}

#[instrument(skip(state, payload, _user))]
pub async fn update_student(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<UpdateStudentRequest>,
) -> Result<Json<Ack>, ApiError> {
    let patch = payload.into_patch()?;
    state.ledger.update_student(&id, &patch).await?;
    info!(student_id = %id, "student updated");
    Ok(Ack::ok())
}

#[instrument(skip(state, _user))]
pub async fn delete_student(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Deleted>, ApiError> {
    let outcome = state.ledger.delete_student(&id).await?;
    info!(student_id = %id, deleted_grades = outcome.deleted_grades, "student deleted");
    Ok(Json(outcome.into()))
}
