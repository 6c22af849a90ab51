use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use tracing::warn;

use crate::web::models::{AuthenticatedUser, Claims};
use crate::web::{AppState, error::AppError};

/// Checks a token's presence and validity on the request and attaches the
/// decoded identity as an extension.
pub async fn auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = locate_token(req.uri().query(), req.headers()).ok_or(AppError::TokenMissing)?;
    let claims = verify(&token, &state.config.jwt_secret)?;

    let authenticated_user = AuthenticatedUser {
        id: claims.id,
        username: claims.username,
    };
    req.extensions_mut().insert(authenticated_user);
    Ok(next.run(req).await)
}

/// Credential lookup order: `token` query parameter, then the
/// `x-access-token` header, then the `authorization` header. A literal
/// `"Bearer "` prefix is stripped from whichever value was found.
pub fn locate_token(query: Option<&str>, headers: &HeaderMap) -> Option<String> {
    let raw = query
        .and_then(token_from_query)
        .or_else(|| header_value(headers, "x-access-token"))
        .or_else(|| header_value(headers, "authorization"))?;
    Some(strip_bearer(&raw))
}

/// Verify the signature and expiry of a token against the shared secret.
pub fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        if matches!(e.kind(), ErrorKind::ExpiredSignature) {
            AppError::TokenExpired
        } else {
            warn!(error = ?e, "JWT verification failed");
            AppError::TokenInvalid
        }
    })?;
    Ok(token_data.claims)
}

fn token_from_query(query: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != "token" {
            return None;
        }
        Some(
            urlencoding::decode(value)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| value.to_string()),
        )
    })
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn strip_bearer(raw: &str) -> String {
    match raw.strip_prefix("Bearer ") {
        Some(rest) => rest.trim_start().to_string(),
        None => raw.to_string(),
    }
}
