use std::net::SocketAddr;

use axum::{
    extract::{Request, State},
    http::{Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::{auth, courses, export, grades, stats, students};

const API_ROUTES: &[&str] = &[
    "POST /api/auth/register",
    "POST /api/auth/login",
    "GET /api/auth/verify",
    "GET /api/auth/users",
    "GET /api/students",
    "POST /api/students",
    "PUT /api/students/:id",
    "DELETE /api/students/:id",
    "GET /api/students/:id/grades",
    "GET /api/students/:id/stats",
    "GET /api/courses",
    "POST /api/courses",
    "PUT /api/courses/:id",
    "DELETE /api/courses/:id",
    "GET /api/courses/:id/grades",
    "GET /api/courses/:id/stats",
    "POST /api/grades",
    "GET /api/grades/:id",
    "PUT /api/grades/:id",
    "DELETE /api/grades/:id",
    "GET /api/stats/global",
    "GET /api/export/pdf",
    "GET /api/export/csv",
    "GET /api/health",
];

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(students::router())
                .merge(courses::router())
                .merge(grades::router())
                .merge(stats::router())
                .merge(export::router())
                .route("/health", get(health)),
        )
        .fallback(not_found)
        .with_state(state)
        .layer(middleware::from_fn(wrong_method_is_not_found))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn health(State(state): State<AppState>) -> Result<&'static str, ApiError> {
    state.ledger.ping().await?;
    Ok("ok")
}

async fn not_found(method: Method, uri: Uri) -> Response {
    let path = uri.path();
    if !path.starts_with("/api") {
        return StatusCode::NOT_FOUND.into_response();
    }
    api_not_found(&method, path)
}

/// A known `/api` path hit with a method it does not serve is answered like
/// an unknown route.
async fn wrong_method_is_not_found(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let response = next.run(req).await;
    if response.status() == StatusCode::METHOD_NOT_ALLOWED && path.starts_with("/api") {
        return api_not_found(&method, &path);
    }
    response
}

fn api_not_found(method: &Method, path: &str) -> Response {
    warn!(%method, %path, "unknown api route");
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "api route not found",
            "method": method.as_str(),
            "path": path,
            "available_routes": API_ROUTES,
        })),
    )
        .into_response()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}

pub async fn serve(app: Router, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.ledger.close().await;
    info!("ledger closed");
    Ok(())
}
