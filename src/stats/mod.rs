//! Read-only computed views: per-student, per-course and global statistics.

use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod engine;
pub mod handlers;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::stats_routes()
}
