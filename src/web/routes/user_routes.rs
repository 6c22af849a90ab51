use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    http::HeaderMap,
    routing::post,
};
use serde_json::{Value, json};

use crate::services::auth_service;
use crate::web::middleware::auth;
use crate::web::models::{
    AuthenticateRequest, ChangePasswordRequest, RegisterRequest, ResetRequest,
};
use crate::web::validation::ValidatedJson;
use crate::web::{AppState, error::AppError};

pub fn create_user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create", post(create_user_handler))
        .route("/authenticate", post(authenticate_handler))
        .route("/resetpassword", post(reset_password_handler))
        .route("/changepassword", post(change_password_handler))
}

async fn create_user_handler(
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<Json<Value>, AppError> {
    let id = auth_service::register_user(&app_state.db_pool, payload).await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

async fn authenticate_handler(
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<AuthenticateRequest>,
) -> Result<Json<Value>, AppError> {
    let success = auth_service::authenticate_user(
        &app_state.db_pool,
        &app_state.config.jwt_secret,
        &payload.username,
        &payload.password,
    )
    .await?;
    Ok(Json(json!({ "user": success.user, "token": success.token })))
}

async fn reset_password_handler(
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ResetRequest>,
) -> Result<Json<Value>, AppError> {
    auth_service::request_reset(
        &app_state.db_pool,
        app_state.mailer.clone(),
        &app_state.config.jwt_secret,
        &payload.username,
    )
    .await?;
    Ok(Json(json!({ "ok": true, "message": "Forgot password e-mail sent." })))
}

/// Applies a new password using the reset token as the credential. The
/// payload is validated before the token is checked, matching the guard
/// order on this route.
async fn change_password_handler(
    State(app_state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let token =
        auth::locate_token(query.as_deref(), &headers).ok_or(AppError::TokenMissing)?;
    let claims = auth::verify(&token, &app_state.config.jwt_secret)?;

    auth_service::change_password(&app_state.db_pool, &claims.username, &payload.password)
        .await?;
    Ok(Json(json!({ "ok": true, "message": "Password was changed." })))
}
