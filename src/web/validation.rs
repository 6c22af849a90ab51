use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::web::error::AppError;

/// Json extractor that also runs the payload's declared validation schema.
/// Malformed bodies and schema failures both short-circuit with a 400
/// `Validation` error before the handler runs.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        payload
            .validate()
            .map_err(|errors| AppError::Validation(describe_errors(&errors)))?;
        Ok(ValidatedJson(payload))
    }
}

/// Flatten field errors into one deterministic human-readable line.
pub fn describe_errors(errors: &ValidationErrors) -> String {
    let mut details: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(_, field_errors)| field_errors.iter())
        .map(|error| match &error.message {
            Some(message) => message.to_string(),
            None => error.code.to_string(),
        })
        .collect();
    details.sort();
    details.dedup();
    format!("Validation Error: {}", details.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::models::RegisterRequest;

    #[test]
    fn describe_errors_is_deterministic_and_prefixed() {
        let req = RegisterRequest {
            email: "nope".into(),
            username: "".into(),
            password: "ab".into(),
        };
        let errors = req.validate().unwrap_err();
        let message = describe_errors(&errors);
        assert!(message.starts_with("Validation Error: "));
        assert!(message.contains("email must be a valid email"));
        assert!(message.contains("username is a required field"));
        assert!(message.contains("password must be at least 5 characters"));
    }
}
