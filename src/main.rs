mod app;
mod auth;
mod config;
mod courses;
mod error;
mod export;
mod grades;
mod ledger;
mod response;
mod seed;
mod state;
mod stats;
mod students;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "gradebook=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;
    seed::run(app_state.ledger.as_ref(), &app_state.config.seed).await?;

    let app = app::build_app(app_state.clone());
    app::serve(app, app_state).await
}
