use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use vitrine::config::Config;

/// Default admin password seeded on first startup (must match
/// db/repositories/admin.rs). Every test app starts from this credential.
const BOOTSTRAP_PASSWORD: &str = "changeme";

async fn spawn_app_with_db(db_url: &str) -> Router {
    let mut config = Config::default();
    config.general.database_path = db_url.to_string();
    // In-memory sqlite gives every pooled connection its own database, so
    // the test pool is pinned to a single connection.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;
    // Cheap argon2 parameters, hashing speed is not under test here.
    config.security.argon2_memory_cost_kib = 64;
    config.security.argon2_time_cost = 1;

    let state = vitrine::api::create_app_state(config)
        .await
        .expect("Failed to create app state");
    vitrine::api::router(state)
        .await
        .expect("Failed to build router")
}

async fn spawn_app() -> Router {
    spawn_app_with_db("sqlite::memory:").await
}

fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("No session cookie in response")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn json_request_with_cookie(method: &str, uri: &str, cookie: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn login(app: &Router, username: &str, password: &str) -> Response<Body> {
    app.clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &json!({"username": username, "password": password}),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = spawn_app().await;

    for uri in ["/api/auth/me", "/api/system/status", "/api/admin/posts"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {uri}");
    }
}

#[tokio::test]
async fn test_login_and_session() {
    let app = spawn_app().await;

    let response = login(&app, "admin", "not-the-password").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["username"], json!("admin"));
    // The seeded credential is a placeholder and must be flagged as such.
    assert_eq!(body["data"]["must_change_password"], json!(true));
    assert_eq!(body["data"]["redirect_to"], json!("/admin"));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/auth/me", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], json!("admin"));

    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/system/status", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_login_next_redirect() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &json!({
                "username": "admin",
                "password": BOOTSTRAP_PASSWORD,
                "next": "/admin/posts"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["redirect_to"], json!("/admin/posts"));

    // Absolute and protocol-relative targets fall back to the default.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            &json!({
                "username": "admin",
                "password": BOOTSTRAP_PASSWORD,
                "next": "//evil.example.com/"
            }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["redirect_to"], json!("/admin"));
}

#[tokio::test]
async fn test_lockout_after_repeated_failures() {
    let app = spawn_app().await;

    for _ in 0..4 {
        let response = login(&app, "admin", "wrong").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Fifth consecutive failure trips the lockout window.
    let response = login(&app, "admin", "wrong").await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"]["minutes_remaining"], json!(15));

    // Even the correct credential is rejected while locked.
    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_failure_counter_resets_on_success() {
    let app = spawn_app().await;

    for _ in 0..4 {
        login(&app, "admin", "wrong").await;
    }
    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    // The slate is clean again: four more failures stay at 401.
    for _ in 0..4 {
        let response = login(&app, "admin", "wrong").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let app = spawn_app().await;

    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The cookie no longer resolves to a session.
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/auth/me", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logging out again, or with no session at all, still succeeds.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/reset",
            &json!({"email": "nobody@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/reset",
            &json!({"email": "admin@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let temp = body["data"]["temp_password"].as_str().unwrap().to_string();
    assert!(temp.starts_with("reset-"));
    assert_eq!(temp.len(), "reset-".len() + 6);

    // Temporary secret is good for exactly one login.
    let response = login(&app, "admin", &temp).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["must_change_password"], json!(true));

    let response = login(&app, "admin", &temp).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The primary password keeps working throughout.
    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_change_password_flow() {
    let app = spawn_app().await;

    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    let cookie = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "PUT",
            "/api/auth/password",
            &cookie,
            &json!({"current_password": "wrong", "new_password": "a-new-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "PUT",
            "/api/auth/password",
            &cookie,
            &json!({"current_password": BOOTSTRAP_PASSWORD, "new_password": "short"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "PUT",
            "/api/auth/password",
            &cookie,
            &json!({"current_password": BOOTSTRAP_PASSWORD, "new_password": "a-new-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Changing the password ends the session that performed it.
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/auth/me", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = login(&app, "admin", "a-new-password").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["must_change_password"], json!(false));
}

#[tokio::test]
async fn test_password_change_invalidates_every_session() {
    let app = spawn_app().await;

    // Two independent sessions for the same administrator.
    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    let cookie_a = session_cookie(&response);
    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    let cookie_b = session_cookie(&response);

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "PUT",
            "/api/auth/password",
            &cookie_a,
            &json!({"current_password": BOOTSTRAP_PASSWORD, "new_password": "a-new-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Both sessions are gone, not just the one that made the change.
    for cookie in [&cookie_a, &cookie_b] {
        let response = app
            .clone()
            .oneshot(get_with_cookie("/api/auth/me", cookie))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = login(&app, "admin", "a-new-password").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_session_survives_restart() {
    let db_path = std::env::temp_dir().join(format!("vitrine-restart-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&db_path);
    let db_url = format!("sqlite:{}", db_path.display());

    let app = spawn_app_with_db(&db_url).await;
    let response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    drop(app);

    // Same database, fresh application state: the durable session store
    // restores the identity without a new login.
    let app = spawn_app_with_db(&db_url).await;
    let response = app
        .clone()
        .oneshot(get_with_cookie("/api/auth/me", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["username"], json!("admin"));

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn test_admin_pages_redirect_to_login() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/admin/posts")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers().get(header::LOCATION).unwrap();
    assert_eq!(location, "/login?next=%2Fadmin%2Fposts");

    // Logged in, the page is served.
    let login_response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    let cookie = session_cookie(&login_response);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/admin/posts", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_and_admin_posts() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/posts").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], json!([]));

    let login_response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    let cookie = session_cookie(&login_response);

    let draft = json!({
        "slug": "hello-world",
        "title": "Hello, world",
        "body": "First post.",
        "published": false
    });
    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            "/api/admin/posts",
            &cookie,
            &draft,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();

    // Drafts are invisible to the public surface.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/posts/hello-world")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let mut published = draft.clone();
    published["published"] = json!(true);
    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "PUT",
            &format!("/api/admin/posts/{id}"),
            &cookie,
            &published,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/posts/hello-world")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["title"], json!("Hello, world"));
}

#[tokio::test]
async fn test_duplicate_slug_rejected() {
    let app = spawn_app().await;

    let login_response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    let cookie = session_cookie(&login_response);

    let post = json!({
        "slug": "once",
        "title": "Once",
        "body": "Only once.",
        "published": true
    });
    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            "/api/admin/posts",
            &cookie,
            &post,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            "/api/admin/posts",
            &cookie,
            &post,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_projects_crud() {
    let app = spawn_app().await;

    let login_response = login(&app, "admin", BOOTSTRAP_PASSWORD).await;
    let cookie = session_cookie(&login_response);

    let response = app
        .clone()
        .oneshot(json_request_with_cookie(
            "POST",
            "/api/admin/projects",
            &cookie,
            &json!({
                "slug": "vitrine",
                "name": "Vitrine",
                "description": "This site.",
                "featured": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"][0]["name"], json!("Vitrine"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/admin/projects/{id}"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"], json!([]));
}
