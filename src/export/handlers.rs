use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{error, info, instrument};

use super::{
    csv, pdf,
    report::{self, ReportKind},
};
use crate::{
    auth::AuthUser,
    error::{present, ApiError, AppQuery},
    ledger::GradeFilter,
    state::AppState,
};

pub fn export_routes() -> Router<AppState> {
    Router::new()
        .route("/export/pdf", get(export_pdf))
        .route("/export/csv", get(export_csv))
}

#[derive(Debug, Deserialize)]
pub struct PdfQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub id: Option<String>,
}

#[instrument(skip(state, _user))]
pub async fn export_pdf(
    State(state): State<AppState>,
    _user: AuthUser,
    AppQuery(query): AppQuery<PdfQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let kind: ReportKind = query
        .kind
        .as_deref()
        .ok_or_else(|| ApiError::validation("query parameter 'type' is required"))?
        .parse()?;
    let id = present(query.id);

    let store = state.ledger.as_ref();
    let report = match (kind, id.as_deref()) {
        (ReportKind::Student, Some(id)) => report::student_report(store, id).await?,
        (ReportKind::Course, Some(id)) => report::course_report(store, id).await?,
        (ReportKind::Global, _) => report::global_report(store).await?,
        (_, None) => {
            return Err(ApiError::validation(format!(
                "query parameter 'id' is required for a {} report",
                kind.as_str()
            )))
        }
    };

    let bytes = pdf::render(&report).map_err(|e| {
        error!(error = %e, "pdf render failed");
        ApiError::internal(e)
    })?;

    let filename = format!(
        "export_{}_{}.pdf",
        kind.as_str(),
        id.as_deref().unwrap_or("global")
    );
    info!(kind = kind.as_str(), %filename, size = bytes.len(), "pdf exported");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        bytes,
    ))
}

#[instrument(skip_all)]
pub async fn export_csv(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let store = state.ledger.as_ref();
    let students = store.list_students().await?;
    let courses = store.list_courses().await?;
    let grades = store.list_grades(&GradeFilter::all()).await?;

    let body = csv::render(&students, &courses, &grades);
    let filename = format!("export_{}.csv", OffsetDateTime::now_utc().date());
    info!(%filename, rows = students.len() + courses.len(), "csv exported");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={filename}"),
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::app::{build_app, test_support::{send, token_for}};
    use crate::ledger::Role;
    use crate::state::AppState;

    async fn raw_get(state: &AppState, path: &str, token: &str) -> (StatusCode, String, Vec<u8>) {
        let response = build_app(state.clone())
            .oneshot(
                Request::builder()
                    .uri(path)
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let disposition = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, disposition, bytes.to_vec())
    }

    async fn populated() -> (AppState, String) {
        let state = AppState::fake();
        let token = token_for(&state, Role::Teacher);
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
            "/api/courses",
            Some(&token),
            Some(json!({"course_id": "C001", "name": "Databases", "credits": 4})),
        )
        .await;
        send(
            &state,
            "POST",
            "/api/grades",
            Some(&token),
            Some(json!({"student_id": "S001", "course_id": "C001", "grade": 14})),
        )
        .await;
        (state, token)
    }

    #[tokio::test]
    async fn student_pdf_is_an_attachment() {
        let (state, token) = populated().await;
        let (status, disposition, bytes) =
            raw_get(&state, "/api/export/pdf?type=student&id=S001", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "attachment; filename=export_student_S001.pdf");
        assert!(bytes.starts_with(b"%PDF"));

        let (status, disposition, _) = raw_get(&state, "/api/export/pdf?type=global", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(disposition, "attachment; filename=export_global_global.pdf");
    }

    #[tokio::test]
    async fn pdf_query_errors() {
        let (state, token) = populated().await;
        let (status, _, _) = raw_get(&state, "/api/export/pdf?type=course", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) = raw_get(&state, "/api/export/pdf?type=teacher", &token).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _, _) =
            raw_get(&state, "/api/export/pdf?type=course&id=C404", &token).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&state, "GET", "/api/export/pdf?type=global", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_query_is_json_400() {
        let (state, token) = populated().await;
        let (status, body) = send(
            &state,
            "GET",
            "/api/export/pdf?type=global&type=course",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn csv_export_lists_students_and_courses() {
        let (state, token) = populated().await;
        let (status, disposition, bytes) = raw_get(&state, "/api/export/csv", &token).await;
        assert_eq!(status, StatusCode::OK);
        assert!(disposition.starts_with("attachment; filename=export_"));
        let body = String::from_utf8(bytes).unwrap();
        assert!(body.contains("Student,S001,Alice Martin,14.00,"));
        assert!(body.contains("Course,C001,Databases,14.00,4"));
    }
}
