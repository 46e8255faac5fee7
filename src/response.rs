use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::ledger::CascadeOutcome;

#[derive(Debug, Serialize)]
pub struct Ack {
    pub success: bool,
}

impl Ack {
    pub fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

/// `201 {success, id}` for a newly created record.
#[derive(Debug, Serialize)]
pub struct Created {
    pub success: bool,
    pub id: String,
}

impl Created {
    pub fn new(id: impl Into<String>) -> impl IntoResponse {
        (
            StatusCode::CREATED,
            Json(Self {
                success: true,
                id: id.into(),
            }),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
    pub deleted_grades: u64,
}

impl From<CascadeOutcome> for Deleted {
    fn from(outcome: CascadeOutcome) -> Self {
        Self {
            success: true,
            deleted_grades: outcome.deleted_grades,
        }
    }
}
