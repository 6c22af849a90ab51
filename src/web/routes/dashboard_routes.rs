use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware as axum_middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::db::services::dashboard_service::{self, PasswordCheck, ShareView};
use crate::web::middleware::auth;
use crate::web::models::{
    AuthenticatedUser, ChangeDashboardPasswordRequest, CheckPasswordNeededRequest,
    CheckPasswordRequest, CloneDashboardRequest, CreateDashboardRequest,
    DeleteDashboardRequest, SaveDashboardRequest, ShareDashboardRequest,
};
use crate::web::validation::ValidatedJson;
use crate::web::{AppState, error::AppError};

pub fn create_dashboard_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let protected = Router::new()
        .route("/dashboards", get(list_dashboards_handler))
        .route("/create-dashboard", post(create_dashboard_handler))
        .route("/delete-dashboard", post(delete_dashboard_handler))
        .route("/dashboard", get(dashboard_handler))
        .route("/save-dashboard", post(save_dashboard_handler))
        .route("/clone-dashboard", post(clone_dashboard_handler))
        .route("/share-dashboard", post(share_dashboard_handler))
        .route("/change-password", post(change_password_handler))
        .route_layer(axum_middleware::from_fn_with_state(app_state, auth::auth));

    // The share-view endpoints stay public; they resolve the requester (if
    // any) against the stored owner themselves.
    let public = Router::new()
        .route("/check-password-needed", post(check_password_needed_handler))
        .route("/check-password", post(check_password_handler));

    protected.merge(public)
}

async fn list_dashboards_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let dashboards =
        dashboard_service::list_dashboards(&app_state.db_pool, user.owner_id()?).await?;
    Ok(Json(json!({ "success": true, "dashboards": dashboards })))
}

async fn create_dashboard_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateDashboardRequest>,
) -> Result<Json<Value>, AppError> {
    let id = dashboard_service::create_dashboard(
        &app_state.db_pool,
        user.owner_id()?,
        &payload.name,
    )
    .await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

async fn delete_dashboard_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<DeleteDashboardRequest>,
) -> Result<Json<Value>, AppError> {
    dashboard_service::delete_dashboard(&app_state.db_pool, user.owner_id()?, payload.id)
        .await?;
    Ok(Json(json!({ "success": true })))
}

async fn dashboard_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let id = params
        .get("id")
        .and_then(|v| v.parse::<i32>().ok())
        .ok_or_else(|| {
            AppError::Validation("Validation Error: id must be a number".to_string())
        })?;
    let (dashboard, sources) =
        dashboard_service::get_dashboard(&app_state.db_pool, user.owner_id()?, id).await?;
    Ok(Json(json!({ "success": true, "dashboard": dashboard, "sources": sources })))
}

async fn save_dashboard_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<SaveDashboardRequest>,
) -> Result<Json<Value>, AppError> {
    dashboard_service::save_dashboard(
        &app_state.db_pool,
        user.owner_id()?,
        payload.id,
        payload.layout,
        payload.items,
        payload.next_id,
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

async fn clone_dashboard_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CloneDashboardRequest>,
) -> Result<Json<Value>, AppError> {
    dashboard_service::clone_dashboard(
        &app_state.db_pool,
        user.owner_id()?,
        payload.dashboard_id,
        &payload.name,
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

async fn check_password_needed_handler(
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CheckPasswordNeededRequest>,
) -> Result<Json<Value>, AppError> {
    let requester_id = payload.user.and_then(|u| u.id);
    let view = dashboard_service::check_password_needed(
        &app_state.db_pool,
        requester_id,
        payload.dashboard_id,
    )
    .await?;
    let body = match view {
        ShareView::Owner { shared, has_password, dashboard } => json!({
            "success": true,
            "owner": "self",
            "shared": shared,
            "hasPassword": has_password,
            "dashboard": dashboard,
        }),
        ShareView::NotShared => json!({
            "success": true,
            "owner": "",
            "shared": false,
        }),
        ShareView::Open { owner_id, dashboard } => json!({
            "success": true,
            "owner": owner_id,
            "shared": true,
            "passwordNeeded": false,
            "dashboard": dashboard,
        }),
        ShareView::PasswordRequired => json!({
            "success": true,
            "owner": "",
            "shared": true,
            "passwordNeeded": true,
        }),
    };
    Ok(Json(body))
}

async fn check_password_handler(
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CheckPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = dashboard_service::check_password(
        &app_state.db_pool,
        payload.dashboard_id,
        &payload.password,
    )
    .await?;
    let body = match outcome {
        PasswordCheck::Correct { owner_id, dashboard } => json!({
            "success": true,
            "correctPassword": true,
            "owner": owner_id,
            "dashboard": dashboard,
        }),
        PasswordCheck::Incorrect => json!({
            "success": true,
            "correctPassword": false,
        }),
    };
    Ok(Json(body))
}

async fn share_dashboard_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ShareDashboardRequest>,
) -> Result<Json<Value>, AppError> {
    let shared = dashboard_service::toggle_share(
        &app_state.db_pool,
        user.owner_id()?,
        payload.dashboard_id,
    )
    .await?;
    Ok(Json(json!({ "success": true, "shared": shared })))
}

async fn change_password_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ChangeDashboardPasswordRequest>,
) -> Result<Json<Value>, AppError> {
    dashboard_service::change_share_password(
        &app_state.db_pool,
        user.owner_id()?,
        payload.dashboard_id,
        payload.password,
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}
