pub mod dashboard_routes;
pub mod source_routes;
pub mod user_routes;
