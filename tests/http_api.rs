//! Route-level tests driving the real router with a mocked store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
use serde_json::{Value, json};
use tower::ServiceExt;

use gridboard_backend::db::entities::{dashboard, user};
use gridboard_backend::server::config::AppConfig;
use gridboard_backend::web::models::Claims;
use gridboard_backend::web::{self, AppState};

const SECRET: &str = "test-secret";

fn test_config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        database_url: String::new(),
        jwt_secret: SECRET.to_string(),
        frontend_url: "http://localhost:5173".to_string(),
        port: 0,
    })
}

fn app_with(db_pool: DatabaseConnection) -> Router {
    web::create_router(AppState { db_pool, config: test_config(), mailer: None })
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn identity_token(id: i32, username: &str, offset_secs: i64) -> String {
    let claims = Claims {
        username: username.to_string(),
        id: Some(id),
        email: Some(format!("{username}@x.com")),
        exp: (Utc::now().timestamp() + offset_secs) as usize,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn sample_dashboard(id: i32, owner_id: i32) -> dashboard::Model {
    let now = Utc::now();
    dashboard::Model {
        id,
        owner_id,
        name: "Plant floor".to_string(),
        layout: json!([]),
        items: json!({}),
        next_id: 1,
        shared: false,
        password: None,
        views: 0,
        created_at: now,
        updated_at: now,
    }
}

fn sample_user(id: i32, username: &str, password_hash: &str) -> user::Model {
    let now = Utc::now();
    user::Model {
        id,
        username: username.to_string(),
        email: format!("{username}@x.com"),
        password_hash: password_hash.to_string(),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn protected_route_rejects_a_missing_token() {
    let response =
        app_with(empty_db()).oneshot(get("/dashboards/dashboards")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Authorization Error: token missing.");
    assert_eq!(body["status"], 403);
}

#[tokio::test]
async fn protected_route_rejects_an_unverifiable_token() {
    let request = Request::builder()
        .uri("/dashboards/dashboards")
        .header("x-access-token", "not-a-token")
        .body(Body::empty())
        .unwrap();
    let response = app_with(empty_db()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Authorization Error: Failed to verify token.");
    assert_eq!(body["status"], 403);
}

#[tokio::test]
async fn protected_route_distinguishes_an_expired_token() {
    // Far enough in the past to clear the decoder's leeway.
    let token = identity_token(7, "bob", -3600);
    let response = app_with(empty_db())
        .oneshot(get(&format!("/dashboards/dashboards?token={token}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "TokenExpiredError");
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn token_in_query_parameter_is_accepted() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<dashboard::Model>::new()])
        .into_connection();
    let token = identity_token(7, "bob", 3600);
    let response =
        app_with(db).oneshot(get(&format!("/dashboards/dashboards?token={token}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["dashboards"], json!([]));
}

#[tokio::test]
async fn bearer_token_in_authorization_header_is_accepted() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_dashboard(1, 7)]])
        .into_connection();
    let token = identity_token(7, "bob", 3600);
    let request = Request::builder()
        .uri("/dashboards/dashboards")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app_with(db).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["dashboards"][0]["name"], "Plant floor");
    assert_eq!(body["dashboards"][0]["views"], 0);
    // The listing carries summaries only.
    assert!(body["dashboards"][0].get("layout").is_none());
}

#[tokio::test]
async fn register_rejects_an_invalid_payload_with_a_real_400() {
    let payload = json!({ "email": "not-an-email", "username": "bob", "password": "secret123" });
    let response = app_with(empty_db()).oneshot(post("/users/create", payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn register_conflict_is_embedded_in_a_200() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user(7, "bob", "hash")]])
        .into_connection();
    let payload = json!({ "email": "b@x.com", "username": "bob2", "password": "secret123" });
    let response = app_with(db).oneshot(post("/users/create", payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], 409);
    assert_eq!(
        body["message"],
        "Registration Error: A user with that e-mail or username already exists."
    );
}

#[tokio::test]
async fn authenticate_embeds_a_401_on_password_mismatch() {
    let stored = bcrypt::hash("right-password", 4).unwrap();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user(7, "bob", &stored)]])
        .into_connection();
    let payload = json!({ "username": "bob", "password": "wrong" });
    let response =
        app_with(db).oneshot(post("/users/authenticate", payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], 401);
    assert_eq!(body["message"], "Authentication Error: Password does not match!");
}

#[tokio::test]
async fn authenticate_returns_token_and_user_summary() {
    let stored = bcrypt::hash("secret123", 4).unwrap();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user(7, "bob", &stored)]])
        .into_connection();
    let payload = json!({ "username": "bob", "password": "secret123" });
    let response =
        app_with(db).oneshot(post("/users/authenticate", payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["username"], "bob");
    assert_eq!(body["user"]["id"], 7);
    assert!(body["token"].as_str().unwrap().contains('.'));
    // The stored hash never leaks.
    assert!(body["user"].get("password").is_none());
    assert!(body["user"].get("password_hash").is_none());
}

#[tokio::test]
async fn unshared_dashboard_is_hidden_from_strangers() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_dashboard(1, 7)]])
        .into_connection();
    let payload = json!({ "dashboardId": 1 });
    let response = app_with(db)
        .oneshot(post("/dashboards/check-password-needed", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["shared"], false);
    assert_eq!(body["owner"], "");
    assert!(body.get("dashboard").is_none());
}

#[tokio::test]
async fn owner_sees_contents_regardless_of_sharing_state() {
    let mut model = sample_dashboard(1, 7);
    model.password = Some("pw".to_string());
    let mut bumped = model.clone();
    bumped.views = 1;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .append_query_results([vec![bumped]])
        .append_exec_results([MockExecResult { last_insert_id: 0, rows_affected: 1 }])
        .into_connection();
    let payload = json!({ "user": { "id": 7 }, "dashboardId": 1 });
    let response = app_with(db)
        .oneshot(post("/dashboards/check-password-needed", payload))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["owner"], "self");
    assert_eq!(body["shared"], false);
    assert_eq!(body["hasPassword"], true);
    assert_eq!(body["dashboard"]["name"], "Plant floor");
}

#[tokio::test]
async fn wrong_share_password_is_a_successful_response() {
    let mut model = sample_dashboard(1, 7);
    model.shared = true;
    model.password = Some("letmein".to_string());
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();
    let payload = json!({ "dashboardId": 1, "password": "nope" });
    let response =
        app_with(db).oneshot(post("/dashboards/check-password", payload)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["correctPassword"], false);
    assert!(body.get("dashboard").is_none());
}

#[tokio::test]
async fn missing_public_dashboard_embeds_a_409() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<dashboard::Model>::new()])
        .into_connection();
    let payload = json!({ "dashboardId": 99 });
    let response = app_with(db)
        .oneshot(post("/dashboards/check-password-needed", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], 409);
    assert_eq!(body["message"], "The specified dashboard has not been found.");
}

#[tokio::test]
async fn reset_flow_requires_a_live_reset_record() {
    // A valid reset-style token whose record is already consumed.
    let claims = Claims {
        username: "bob".to_string(),
        id: None,
        email: None,
        exp: (Utc::now().timestamp() + 3600) as usize,
    };
    let token =
        encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes()))
            .unwrap();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![sample_user(7, "bob", "hash")]])
        .append_query_results([Vec::<gridboard_backend::db::entities::reset_token::Model>::new()])
        .into_connection();
    let request = Request::builder()
        .method("POST")
        .uri("/users/changepassword")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-access-token", token)
        .body(Body::from(json!({ "password": "brand-new-pw" }).to_string()))
        .unwrap();
    let response = app_with(db).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], 410);
    assert_eq!(body["message"], " Resource Error: Reset token has expired.");
}

#[tokio::test]
async fn health_endpoint_answers_without_auth() {
    let response = app_with(empty_db()).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
