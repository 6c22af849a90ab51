use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::State,
    middleware as axum_middleware,
    routing::{get, post},
};
use serde_json::{Value, json};

use crate::db::services::source_service::{self, SourceAttrs};
use crate::web::middleware::auth;
use crate::web::models::{
    AuthenticatedUser, ChangeSourceRequest, CheckSourcesRequest, CreateSourceRequest,
    DeleteSourceRequest, GetSourceRequest,
};
use crate::web::validation::ValidatedJson;
use crate::web::{AppState, error::AppError};

pub fn create_source_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/sources", get(list_sources_handler))
        .route("/create-source", post(create_source_handler))
        .route("/change-source", post(change_source_handler))
        .route("/delete-source", post(delete_source_handler))
        .route("/source", post(get_source_handler))
        .route("/check-sources", post(check_sources_handler))
        .route_layer(axum_middleware::from_fn_with_state(app_state, auth::auth))
}

async fn list_sources_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let sources = source_service::list_sources(&app_state.db_pool, user.owner_id()?).await?;
    Ok(Json(json!({ "success": true, "sources": sources })))
}

async fn create_source_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CreateSourceRequest>,
) -> Result<Json<Value>, AppError> {
    let id = source_service::create_source(
        &app_state.db_pool,
        user.owner_id()?,
        SourceAttrs {
            name: payload.name,
            source_type: payload.source_type,
            login: payload.login,
            passcode: payload.passcode,
            url: payload.url,
            vhost: payload.vhost,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true, "id": id })))
}

async fn change_source_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<ChangeSourceRequest>,
) -> Result<Json<Value>, AppError> {
    source_service::change_source(
        &app_state.db_pool,
        user.owner_id()?,
        payload.id,
        SourceAttrs {
            name: payload.name,
            source_type: payload.source_type,
            login: payload.login,
            passcode: payload.passcode,
            url: payload.url,
            vhost: payload.vhost,
        },
    )
    .await?;
    Ok(Json(json!({ "success": true })))
}

async fn delete_source_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<DeleteSourceRequest>,
) -> Result<Json<Value>, AppError> {
    source_service::delete_source(&app_state.db_pool, user.owner_id()?, payload.id).await?;
    Ok(Json(json!({ "success": true })))
}

async fn get_source_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<GetSourceRequest>,
) -> Result<Json<Value>, AppError> {
    let source =
        source_service::get_source(&app_state.db_pool, user.owner_id()?, &payload.name).await?;
    Ok(Json(json!({ "success": true, "source": source })))
}

async fn check_sources_handler(
    Extension(user): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    ValidatedJson(payload): ValidatedJson<CheckSourcesRequest>,
) -> Result<Json<Value>, AppError> {
    let new_sources =
        source_service::check_sources(&app_state.db_pool, user.owner_id()?, &payload.sources)
            .await?;
    Ok(Json(json!({ "success": true, "newSources": new_sources })))
}
