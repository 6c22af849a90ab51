use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    /// Base URL of the frontend, used for the reset link in e-mails.
    pub frontend_url: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;

        let frontend_url =
            env::var("FRONTEND_URL").map_err(|_| "FRONTEND_URL must be set".to_string())?;

        let port = env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);

        Ok(AppConfig { database_url, jwt_secret, frontend_url, port })
    }
}
