use std::sync::Arc;

use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, RuntimeErr, Set,
};
use tracing::warn;

use crate::db::entities::{reset_token, user};
use crate::services::mailer_service::MailerService;
use crate::web::error::AppError;
use crate::web::models::{Claims, PublicUser, RegisterRequest};

/// Identity tokens are valid for 24 hours.
const TOKEN_TTL_HOURS: i64 = 24;
/// A reset record dies one hour after it is issued.
const RESET_TOKEN_TTL_SECS: i64 = 3600;

const USER_EXISTS: &str =
    "Registration Error: A user with that e-mail or username already exists.";
const AUTH_USER_NOT_FOUND: &str = "Authentication Error: User not found.";
const AUTH_PASSWORD_MISMATCH: &str = "Authentication Error: Password does not match!";

/// Successful authentication payload: the token plus a user summary.
#[derive(Debug)]
pub struct AuthSuccess {
    pub token: String,
    pub user: PublicUser,
}

fn sign(claims: &Claims, secret: &str) -> Result<String, AppError> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AppError::Internal(format!("Token creation failed: {e}")))
}

/// Sign a full identity token embedding `{username, id, email}`.
pub fn sign_identity(user: &user::Model, secret: &str) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
    sign(
        &Claims {
            username: user.username.clone(),
            id: Some(user.id),
            email: Some(user.email.clone()),
            exp,
        },
        secret,
    )
}

/// Sign a reset token carrying only the username.
pub fn sign_reset(username: &str, secret: &str) -> Result<String, AppError> {
    let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
    sign(&Claims { username: username.to_string(), id: None, email: None, exp }, secret)
}

/// Map a database-level unique violation onto a domain conflict; everything
/// else stays a database error. The uniqueness checks are check-then-create,
/// so a concurrent insert can still trip the index underneath us.
fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    if let DbErr::Query(RuntimeErr::SqlxError(ref sqlx_error)) = err {
        if let sqlx::Error::Database(database_error) = sqlx_error {
            if database_error.is_unique_violation() {
                return AppError::Conflict(message.to_string());
            }
        }
    }
    AppError::Database(err)
}

async fn find_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<user::Model>, AppError> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

/// Create an account unless the username or the e-mail is already taken.
/// Username and e-mail are stored lowercase.
pub async fn register_user(
    db: &DatabaseConnection,
    req: RegisterRequest,
) -> Result<i32, AppError> {
    let username = req.username.trim().to_lowercase();
    let email = req.email.trim().to_lowercase();

    let existing = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(username.clone()))
                .add(user::Column::Email.eq(email.clone())),
        )
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(USER_EXISTS.to_string()));
    }

    let password_hash = hash(req.password.trim(), DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;
    let now = Utc::now();
    let created = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| conflict_on_unique(e, USER_EXISTS))?;
    Ok(created.id)
}

/// Check the credentials and issue an identity token. The two failure modes
/// differ only in message text; both embed a 401 in a 200 response.
pub async fn authenticate_user(
    db: &DatabaseConnection,
    jwt_secret: &str,
    username: &str,
    password: &str,
) -> Result<AuthSuccess, AppError> {
    let username = username.trim();
    let user = find_by_username(db, username)
        .await?
        .ok_or_else(|| AppError::Unauthorized(AUTH_USER_NOT_FOUND.to_string()))?;

    let valid = verify(password.trim(), &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {e}")))?;
    if !valid {
        return Err(AppError::Unauthorized(AUTH_PASSWORD_MISMATCH.to_string()));
    }

    let token = sign_identity(&user, jwt_secret)?;
    Ok(AuthSuccess {
        token,
        user: PublicUser { username: user.username, id: user.id, email: user.email },
    })
}

/// Issue a reset token, replace any prior reset record for the username and
/// dispatch the e-mail without awaiting it. The delete and the insert are
/// independent store operations; there is no atomicity between them.
pub async fn request_reset(
    db: &DatabaseConnection,
    mailer: Option<Arc<MailerService>>,
    jwt_secret: &str,
    username: &str,
) -> Result<(), AppError> {
    let username = username.trim().to_lowercase();
    let user = find_by_username(db, &username).await?.ok_or(AppError::UserNotFound)?;

    let token = sign_reset(&username, jwt_secret)?;

    reset_token::Entity::delete_many()
        .filter(reset_token::Column::Username.eq(username.clone()))
        .exec(db)
        .await?;
    reset_token::ActiveModel {
        username: Set(username),
        token: Set(token.clone()),
        expires_at: Set(Utc::now() + Duration::seconds(RESET_TOKEN_TTL_SECS)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(|e| conflict_on_unique(e, "A token already exists for that username!"))?;

    match mailer {
        Some(mailer) => {
            let recipient = user.email;
            tokio::spawn(async move {
                if let Err(e) = mailer.send_reset_email(&recipient, &token).await {
                    warn!(error = ?e, "Failed to send password reset email");
                }
            });
        }
        None => warn!("SMTP not configured; skipping password reset email"),
    }
    Ok(())
}

/// Consume the reset record for `username` and store the new password hash.
/// A missing or expired record means the token was already used or outlived
/// its window; expired rows are deleted on discovery.
pub async fn change_password(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<(), AppError> {
    let user = find_by_username(db, username).await?.ok_or(AppError::UserNotFound)?;

    let reset = reset_token::Entity::find()
        .filter(reset_token::Column::Username.eq(username))
        .one(db)
        .await?
        .ok_or(AppError::ResetExpired)?;
    reset_token::Entity::delete_many()
        .filter(reset_token::Column::Id.eq(reset.id))
        .exec(db)
        .await?;
    if reset.expires_at < Utc::now() {
        return Err(AppError::ResetExpired);
    }

    let password_hash = hash(password.trim(), DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))?;
    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(password_hash);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;
    Ok(())
}
