//! Downloadable reports: PDF per student, course or whole ledger, and a CSV
//! summary.

use crate::state::AppState;
use axum::Router;

pub mod csv;
pub mod handlers;
pub mod pdf;
pub mod report;

pub fn router() -> Router<AppState> {
    handlers::export_routes()
}
