use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use validator::{Validate, ValidationError};

use crate::web::error::AppError;

// --- Token payload ---

/// Claims carried by every signed token. Identity tokens embed the full
/// `{username, id, email}` triple; reset tokens carry only the username.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
}

/// Decoded identity attached to the request by the authorization middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Option<i32>,
    pub username: String,
}

impl AuthenticatedUser {
    /// Owner-scoped routes need a numeric identity; tokens without one
    /// (reset tokens) are not acceptable there.
    pub fn owner_id(&self) -> Result<i32, AppError> {
        self.id.ok_or(AppError::TokenInvalid)
    }
}

// --- User payloads (the named validation schemas) ---

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "username is a required field"))]
    pub username: String,
    #[validate(length(min = 5, message = "password must be at least 5 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AuthenticateRequest {
    #[validate(length(min = 1, message = "username is a required field"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is a required field"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequest {
    #[validate(length(min = 1, message = "username is a required field"))]
    pub username: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 5, message = "password must be at least 5 characters"))]
    pub password: String,
}

/// Profile update payload: either field may be absent, but not both.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_update_request"))]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    #[validate(length(min = 5, message = "password must be at least 5 characters"))]
    pub password: Option<String>,
}

fn validate_update_request(req: &UpdateUserRequest) -> Result<(), ValidationError> {
    if req.username.is_none() && req.password.is_none() {
        let mut error = ValidationError::new("missing_parameters");
        error.message = Some("Missing parameters".into());
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub username: String,
    pub id: i32,
    pub email: String,
}

// --- Dashboard payloads ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDashboardRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteDashboardRequest {
    pub id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveDashboardRequest {
    pub id: i32,
    pub layout: JsonValue,
    pub items: JsonValue,
    #[serde(rename = "nextId")]
    pub next_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CloneDashboardRequest {
    #[serde(rename = "dashboardId")]
    pub dashboard_id: i32,
    pub name: String,
}

/// Public share-resolution payload. The requester reference is whatever
/// identity the client holds locally; it is only trusted as far as the
/// owner comparison in the service.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckPasswordNeededRequest {
    #[serde(default)]
    pub user: Option<RequesterRef>,
    #[serde(rename = "dashboardId")]
    pub dashboard_id: i32,
}

#[derive(Debug, Deserialize)]
pub struct RequesterRef {
    #[serde(default)]
    pub id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckPasswordRequest {
    #[serde(rename = "dashboardId")]
    pub dashboard_id: i32,
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShareDashboardRequest {
    #[serde(rename = "dashboardId")]
    pub dashboard_id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeDashboardPasswordRequest {
    #[serde(rename = "dashboardId")]
    pub dashboard_id: i32,
    pub password: Option<String>,
}

// --- Source payloads ---

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSourceRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub login: String,
    pub passcode: String,
    pub url: String,
    pub vhost: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeSourceRequest {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub login: String,
    pub passcode: String,
    pub url: String,
    pub vhost: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DeleteSourceRequest {
    pub id: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GetSourceRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckSourcesRequest {
    pub sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_schema_accepts_valid_payload() {
        let req = RegisterRequest {
            email: "b@x.com".into(),
            username: "bob".into(),
            password: "secret123".into(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn register_schema_rejects_bad_email_and_short_password() {
        let req = RegisterRequest {
            email: "not-an-email".into(),
            username: "bob".into(),
            password: "ab".into(),
        };
        let errors = req.validate().unwrap_err();
        let rendered = errors.to_string();
        assert!(rendered.contains("email must be a valid email"));
        assert!(rendered.contains("password must be at least 5 characters"));
    }

    #[test]
    fn update_schema_requires_at_least_one_field() {
        let req = UpdateUserRequest { username: None, password: None };
        let errors = req.validate().unwrap_err();
        assert!(errors.to_string().contains("Missing parameters"));

        let req = UpdateUserRequest { username: Some("bob".into()), password: None };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn reset_token_claims_omit_identity_fields() {
        let claims = Claims { username: "bob".into(), id: None, email: None, exp: 0 };
        let value = serde_json::to_value(&claims).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("email").is_none());
    }
}
