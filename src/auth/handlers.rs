use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, JwtKeys, LoginRequest, PublicUser, RegisterRequest, VerifyResponse},
        extractors::{AdminUser, AuthUser},
        services::{
            authenticate, create_user, is_valid_username, MAX_USERNAME_CHARS, MIN_PASSWORD_LEN,
        },
    },
    error::{ApiError, AppJson},
    ledger::{Role, User},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify))
        .route("/auth/users", get(list_users))
}

fn sign(state: &AppState, user: &User) -> Result<String, ApiError> {
    JwtKeys::from_ref(state).issue(user).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::internal(e)
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(ApiError::validation("username and password are required"));
    };
    let username = username.trim().to_string();

    if !is_valid_username(&username) {
        warn!(%username, "invalid username");
        return Err(ApiError::validation(format!(
            "username must be 1-{MAX_USERNAME_CHARS} characters without spaces"
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        warn!("password too short");
        return Err(ApiError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    // Anything other than an explicit "admin" registers a teacher.
    let role = match payload.role.as_deref() {
        Some("admin") => Role::Admin,
        _ => Role::Teacher,
    };

    let user = create_user(state.ledger.as_ref(), &username, &password, role).await?;
    let token = sign(&state, &user)?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(ApiError::validation("username and password are required"));
    };

    let user = authenticate(state.ledger.as_ref(), username.trim(), &password).await?;
    let token = sign(&state, &user)?;

    info!(user_id = %user.id, username = %user.username, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip_all)]
pub async fn verify(AuthUser(claims): AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        success: true,
        user: claims,
    })
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.ledger.list_users().await?;
    info!(admin = %admin.username, count = users.len(), "users listed");
    Ok(Json(users))
}
