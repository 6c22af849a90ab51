use std::sync::Arc;

use axum::{Router, http::Method, routing::get};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};

use crate::server::config::AppConfig;
use crate::services::mailer_service::MailerService;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod validation;

pub use error::AppError;

/// Shared per-process state: the store connection pool, the configuration
/// and the optional mailer, injected into every service call.
///
/// Always used behind an `Arc`, so the state itself does not need `Clone`
/// (and `DatabaseConnection` is not `Clone` when the `mock` feature is on).
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub mailer: Option<Arc<MailerService>>,
}

async fn health_check_handler() -> &'static str {
    "OK"
}

pub fn create_router(app_state: AppState) -> Router {
    let app_state = Arc::new(app_state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check_handler))
        .nest("/users", routes::user_routes::create_user_router())
        .nest(
            "/dashboards",
            routes::dashboard_routes::create_dashboard_router(app_state.clone()),
        )
        .nest(
            "/sources",
            routes::source_routes::create_source_router(app_state.clone()),
        )
        .with_state(app_state)
        .layer(cors)
}
