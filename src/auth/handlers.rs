use axum::{
    extract::{FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, SignupRequest},
        repo_types::{Role, User},
        services::{hash_password, is_valid_username, verify_password, AuthUser, JwtKeys},
    },
    error::ApiError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn sign_pair(state: &AppState, user: &User) -> Result<AuthResponse, ApiError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id, user.role).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        ApiError::Internal(e)
    })?;
    let refresh_token = keys.sign_refresh(user.id, user.role).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        ApiError::Internal(e)
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        },
    })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.username = payload.username.trim().to_string();

    if !is_valid_username(&payload.username) {
        warn!(username = %payload.username, "invalid username");
        return Err(ApiError::InvalidInput("Invalid input".into()));
    }

    let role = Role::try_from(payload.role).map_err(|_| {
        warn!("invalid role");
        ApiError::InvalidInput("Invalid input".into())
    })?;

    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::InvalidInput("Password too short".into()));
    }

    // Ensure username is not taken
    if let Ok(Some(_)) = User::find_by_username(&state.db, &payload.username).await {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::Conflict("User exists".into()));
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e)
    })?;

    let user = User::create(&state.db, &payload.username, &hash, role)
        .await
        .map_err(|e| {
            error!(error = %e, "create user failed");
            ApiError::Internal(e)
        })?;

    info!(user_id = %user.id, username = %user.username, role = ?user.role, "user registered");
    sign_pair(&state, &user).map(Json)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    payload.username = payload.username.trim().to_string();

    let user = match User::find_by_username(&state.db, &payload.username).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(username = %payload.username, "login unknown username");
            return Err(ApiError::Unauthorized("Invalid credentials".into()));
        }
        Err(e) => {
            error!(error = %e, "find_by_username failed");
            return Err(ApiError::Internal(e));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        ApiError::Internal(e)
    })?;

    if !ok {
        warn!(username = %payload.username, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    info!(user_id = %user.id, username = %user.username, "user logged in");
    sign_pair(&state, &user).map(Json)
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    sign_pair(&state, &user).map(Json)
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = User::find_by_id(&state.db, user_id)
        .await
        .map_err(|e| {
            error!(error = %e, user_id = %user_id, "find_by_id failed");
            ApiError::Internal(e)
        })?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    Ok(Json(PublicUser {
        id: user.id,
        username: user.username,
        role: user.role,
    }))
}
