use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{CreateCourseRequest, UpdateCourseRequest};
use crate::{
    auth::AuthUser,
    error::{ApiError, AppJson, AppPath},
    ledger::Course,
    response::{Ack, Created, Deleted},
    state::AppState,
};

pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/:id", put(update_course).delete(delete_course))
}

#[instrument(skip_all)]
pub async fn list_courses(State(state): State<AppState>) -> Result<Json<Vec<Course>>, ApiError> {
    Ok(Json(state.ledger.list_courses().await?))
}

#[instrument(skip(state, payload, _user))]
pub async fn create_course(
    State(state): State<AppState>,
    _user: AuthUser,
    AppJson(payload): AppJson<CreateCourseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let course = payload.into_course()?;
    state.ledger.insert_course(&course).await?;
    info!(course_id = %course.course_id, credits = course.credits, "course created");
    Ok(Created::new(course.course_id))
}

#[instrument(skip(state, payload, _user))]
pub async fn update_course(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<String>,
    AppJson(payload): AppJson<UpdateCourseRequest>,
) -> Result<Json<Ack>, ApiError> {
    let patch = payload.into_patch()?;
    state.ledger.update_course(&id, &patch).await?;
    info!(course_id = %id, "course updated");
    Ok(Ack::ok())
}

#[instrument(skip(state, _user))]
pub async fn delete_course(
    State(state): State<AppState>,
    _user: AuthUser,
    AppPath(id): AppPath<String>,
) -> Result<Json<Deleted>, ApiError> {
    let outcome = state.ledger.delete_course(&id).await?;
    info!(course_id = %id, deleted_grades = outcome.deleted_grades, "course deleted");
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::app::test_support::{send, token_for};
    use crate::ledger::{GradeFilter, Role};
    use crate::state::AppState;

    #[tokio::test]
    async fn create_list_and_reject_bad_credits() {
        let state = AppState::fake();
        let token = token_for(&state, Role::Teacher);

        let (status, body) = send(
            &state,
            "POST",
            "/api/courses",
            Some(&token),
            Some(json!({"course_id": "C002", "name": "Web", "credits": 3})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "C002");

        send(
            &state,
            "POST",
            "/api/courses",
            Some(&token),
            Some(json!({"course_id": "C001", "name": "Databases", "credits": 4})),
        )
        .await;

        let (status, _) = send(
            &state,
            "POST",
            "/api/courses",
            Some(&token),
            Some(json!({"course_id": "C003", "name": "Algorithms", "credits": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&state, "GET", "/api/courses", None, None).await;
        let ids: Vec<_> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["course_id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, ["C001", "C002"]);
    }

    #[tokio::test]
    async fn malformed_body_is_a_json_error() {
        let state = AppState::fake();
        let token = token_for(&state, Role::Teacher);
        let (status, body) = send(
            &state,
            "POST",
            "/api/courses",
            Some(&token),
            Some(json!({"course_id": "C001", "name": "Databases", "credits": "four"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn update_and_cascading_delete() {
        let state = AppState::fake();
        let token = token_for(&state, Role::Teacher);
        send(
            &state,
            "POST",
            "/api/courses",
            Some(&token),
            Some(json!({"course_id": "C001", "name": "Databases", "credits": 4})),
        )
        .await;
        send(
            &state,
            "POST",
            "/api/students",
            Some(&token),
            Some(json!({"student_id": "S001", "first_name": "Alice", "last_name": "Martin"})),
        )
        .await;
        send(
            &state,
            "POST",
            "/api/grades",
            Some(&token),
            Some(json!({"student_id": "S001", "course_id": "C001", "grade": 13})),
        )
        .await;

        let (status, _) = send(
            &state,
            "PUT",
            "/api/courses/C001",
            Some(&token),
            Some(json!({"name": "Advanced Databases", "credits": 5})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let course = state.ledger.find_course("C001").await.unwrap().unwrap();
        assert_eq!(course.credits, 5);

        let (status, body) = send(&state, "DELETE", "/api/courses/C001", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted_grades"], 1);
        assert_eq!(state.ledger.count_grades(&GradeFilter::all()).await.unwrap(), 0);

        let (status, _) = send(&state, "DELETE", "/api/courses/C001", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
