pub mod auth_service;
pub mod mailer_service;
