use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use percept::api::AppState;
use percept::auth::TokenCodec;
use percept::config::Config;
use percept::email::Mailer;

/// Captures reset links instead of sending mail, so tests can pull the
/// token back out of the URL.
#[derive(Default)]
struct CaptureMailer {
    links: Mutex<Vec<String>>,
}

#[async_trait]
impl Mailer for CaptureMailer {
    async fn send_password_reset(&self, _to: &str, reset_url: &str) -> anyhow::Result<()> {
        self.links.lock().unwrap().push(reset_url.to_string());
        Ok(())
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    // Keep hashing cheap in tests
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config
}

async fn spawn_app() -> (Router, Arc<AppState>, Arc<CaptureMailer>) {
    spawn_app_with_config(test_config()).await
}

async fn spawn_app_with_config(config: Config) -> (Router, Arc<AppState>, Arc<CaptureMailer>) {
    let mailer = Arc::new(CaptureMailer::default());
    let state = percept::api::create_app_state_with_mailer(config, None, mailer.clone())
        .await
        .expect("Failed to create app state");
    (percept::api::router(state.clone()), state, mailer)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn post_json(uri: &str, payload: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn register(app: &Router, username: &str, email: &str, password: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            &serde_json::json!({
                "username": username,
                "email": email,
                "password": password,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!("username={email}&password={password}")))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["token_type"], "bearer");
    json["access_token"].as_str().unwrap().to_string()
}

async fn get_me(app: &Router, token: &str) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn register_returns_user_without_password_material() {
    let (app, _, _) = spawn_app().await;

    let user = register(&app, "alice", "alice@example.com", "hunter42").await;

    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert!(user["id"].is_i64());
    assert!(user["created"].is_string());
    assert!(user.get("password").is_none());
    assert!(user.get("hashed_password").is_none());
}

#[tokio::test]
async fn duplicate_username_and_email_are_rejected() {
    let (app, _, _) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "hunter42").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            &serde_json::json!({
                "username": "alice",
                "email": "other@example.com",
                "password": "hunter42",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "User already exists");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/register",
            &serde_json::json!({
                "username": "alice2",
                "email": "alice@example.com",
                "password": "hunter42",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Email already registered"
    );
}

#[tokio::test]
async fn login_and_me_round_trip() {
    let (app, _, _) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "hunter42").await;
    let token = login(&app, "alice@example.com", "hunter42").await;

    let response = get_me(&app, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = body_json(response).await;
    assert_eq!(me["username"], "alice");
    assert_eq!(me["email"], "alice@example.com");
}

#[tokio::test]
async fn bad_credentials_are_rejected_uniformly() {
    let (app, _, _) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "hunter42").await;

    for (email, password) in [
        ("alice@example.com", "wrong"),
        ("nobody@example.com", "hunter42"),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/users/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(format!("username={email}&password={password}")))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(
            body_json(response).await["detail"],
            "Incorrect email or password"
        );
    }
}

#[tokio::test]
async fn logout_invalidates_outstanding_tokens() {
    let (app, _, _) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "hunter42").await;
    let token = login(&app, "alice@example.com", "hunter42").await;

    // The watermark advances only with the clock, so cross a second
    // boundary before logging out.
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/logout")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["detail"],
        "Successfully logged out"
    );

    let response = get_me(&app, &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["detail"],
        "Could not validate credentials"
    );
}

#[tokio::test]
async fn second_login_invalidates_first_token() {
    let (app, _, _) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "hunter42").await;
    let first = login(&app, "alice@example.com", "hunter42").await;

    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
    let second = login(&app, "alice@example.com", "hunter42").await;

    let response = get_me(&app, &first).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The token from the invalidating login itself stays valid.
    let response = get_me(&app, &second).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn issued_at_watermark_never_moves_backwards() {
    let (app, state, _) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "hunter42").await;
    let token = login(&app, "alice@example.com", "hunter42").await;
    let user = state
        .store
        .get_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();

    let later = TokenCodec::now() + 60;
    state.store.set_user_issued_at(user.id, later).await.unwrap();
    // A stale write from a rearranged clock must not rewind the watermark.
    state
        .store
        .set_user_issued_at(user.id, later - 120)
        .await
        .unwrap();

    let user = state.store.get_user_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(user.issued_at, Some(later));

    // The pre-watermark token stays dead.
    let response = get_me(&app, &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_without_stored_hash_is_a_uniform_401() {
    let (app, state, _) = spawn_app().await;

    state
        .store
        .create_user("ghost", "ghost@example.com", None)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=ghost@example.com&password=anything"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["detail"],
        "Incorrect email or password"
    );
}

#[tokio::test]
async fn malformed_and_expired_tokens_get_the_same_401() {
    let (app, _, _) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "hunter42").await;

    let expired = TokenCodec::new(&Config::default().auth.secret_key, -1)
        .issue("alice", TokenCodec::now())
        .unwrap();

    for token in [
        "not-a-token",
        "eyJhbGciOiJIUzI1NiJ9.garbage.sig",
        expired.as_str(),
    ] {
        let response = get_me(&app, token).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert_eq!(
            body_json(response).await["detail"],
            "Could not validate credentials"
        );
    }

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn exists_endpoint_reflects_registration() {
    let (app, _, _) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/exists/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["exists"], false);

    register(&app, "alice", "alice@example.com", "hunter42").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/exists/alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response).await["exists"], true);
}

fn token_from_reset_url(url: &str) -> String {
    url.split("token=").nth(1).unwrap().to_string()
}

#[tokio::test]
async fn password_reset_round_trip() {
    let (app, _, mailer) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "oldpassword").await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/forgot-password",
            &serde_json::json!({"email": "alice@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["msg"].is_string());

    let link = mailer.links.lock().unwrap().last().unwrap().clone();
    assert!(link.contains("/reset-password?token="));
    let token = token_from_reset_url(&link);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/reset-password",
            &serde_json::json!({"token": token, "new_password": "newpassword"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Old password no longer works, new one does.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/users/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "username=alice@example.com&password=oldpassword",
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    login(&app, "alice@example.com", "newpassword").await;

    // The token was consumed.
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/reset-password",
            &serde_json::json!({"token": token, "new_password": "another"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["detail"],
        "Invalid or expired token"
    );
}

#[tokio::test]
async fn expired_reset_token_is_rejected_and_not_consumed() {
    let (app, state, _) = spawn_app().await;

    register(&app, "alice", "alice@example.com", "hunter42").await;
    let user = state
        .store
        .get_user_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();

    let expired_at = TokenCodec::now() - 60;
    state
        .store
        .create_reset_token(user.id, "feedfacefeedface", expired_at)
        .await
        .unwrap();

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/users/reset-password",
                &serde_json::json!({"token": "feedfacefeedface", "new_password": "x"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["detail"],
            "Invalid or expired token"
        );
    }

    // Still present: expiry rejection does not consume the row.
    assert!(
        state
            .store
            .get_reset_token("feedfacefeedface")
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn forgot_password_unknown_email_is_404_by_default() {
    let (app, _, mailer) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/forgot-password",
            &serde_json::json!({"email": "ghost@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["detail"], "User not found");
    assert!(mailer.links.lock().unwrap().is_empty());
}

#[tokio::test]
async fn forgot_password_can_conceal_unknown_emails() {
    let mut config = test_config();
    config.auth.conceal_unknown_emails = true;
    let (app, _, mailer) = spawn_app_with_config(config).await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/users/forgot-password",
            &serde_json::json!({"email": "ghost@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(mailer.links.lock().unwrap().is_empty());
}
