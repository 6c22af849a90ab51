pub mod dashboard_service;
pub mod source_service;
