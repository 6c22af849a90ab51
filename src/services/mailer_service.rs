use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType, transport::smtp::authentication::Credentials,
};
use tracing::info;

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default sender address when `SMTP_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@gridboard.local";

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Email build error: {0}")]
    Build(String),
}

/// SMTP settings, loaded from the environment.
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
}

impl MailerConfig {
    /// Returns `None` if `SMTP_HOST` is not set, signalling that email
    /// delivery is not configured and should be skipped.
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
        })
    }
}

/// Sends the password-reset email over SMTP.
pub struct MailerService {
    config: MailerConfig,
    frontend_url: String,
}

/// Plain-text body of the reset email.
fn reset_email_body(frontend_url: &str, token: &str) -> String {
    format!(
        "Someone requested a password reset for your account.\n\
         \n\
         Follow this link to choose a new password:\n\
         {frontend_url}/reset-password?token={token}\n\
         \n\
         The link is valid for one hour and can be used once. If you did\n\
         not request this, you can ignore this message."
    )
}

impl MailerService {
    pub fn new(config: MailerConfig, frontend_url: String) -> Self {
        Self { config, frontend_url }
    }

    pub async fn send_reset_email(&self, to_email: &str, token: &str) -> Result<(), MailerError> {
        let email = Message::builder()
            .from(self.config.from_address.parse()?)
            .to(to_email.parse()?)
            .subject("Forgot Password")
            .header(ContentType::TEXT_PLAIN)
            .body(reset_email_body(&self.frontend_url, token))
            .map_err(|e| MailerError::Build(e.to_string()))?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)?
                .port(self.config.smtp_port);

        if let (Some(user), Some(pass)) = (&self.config.smtp_user, &self.config.smtp_password) {
            transport_builder =
                transport_builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let mailer = transport_builder.build();
        mailer.send(email).await?;

        info!(to = to_email, "Password reset email sent");
        Ok(())
    }
}
