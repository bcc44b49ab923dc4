//! Lectern HTTP server library.
//!
//! Routes:
//! - `POST /register`, `POST /login`, `GET /me` — auth
//! - `GET|POST /courses`, `GET|POST /courses/{course_id}` — course CRUD
//! - `GET|PUT /courses/{course_id}/lectures/{lecture_id}` — lecture materials
//! - `POST /api/lectures/save`, `GET /api/files/{course_id}` — uploads
//! - `GET /uploads/*` — static file serving

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;
pub mod uploads;

use lectern_shared::{LecternError, Result, load_config};
use state::AppState;

/// Build the application router.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/", get(routes::home))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/me", get(routes::auth::me))
        .route(
            "/courses",
            get(routes::courses::list_courses).post(routes::courses::create_course),
        )
        .route("/courses/", get(routes::courses::list_courses))
        .route(
            "/courses/{course_id}",
            get(routes::courses::list_lectures).post(routes::courses::create_lecture),
        )
        .route(
            "/courses/{course_id}/lectures/{lecture_id}",
            get(routes::lectures::get_lecture).put(routes::lectures::update_lecture),
        )
        .route("/api/lectures/save", post(routes::files::save_lecture))
        .route("/api/files/{course_id}", get(routes::files::list_files))
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Load config, open storage, and serve until shutdown.
pub async fn start_server() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = load_config()?;

    info!("initializing state");
    let state = AppState::from_config(&config.server).await?;

    let router = app(state);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| LecternError::Network(format!("bind {address}: {e}")))?;
    info!("server running on {address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| LecternError::Network(format!("serve: {e}")))?;

    info!("server shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use lectern_shared::new_id;
    use lectern_storage::Storage;

    async fn test_state() -> Arc<AppState> {
        let root = std::env::temp_dir().join(format!("lectern-server-test-{}", new_id()));
        std::fs::create_dir_all(&root).unwrap();

        Arc::new(AppState {
            storage: Storage::open(&root.join("test.db")).await.expect("open db"),
            uploads_dir: root.join("uploads"),
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 1,
        })
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap()
    }

    fn authed_request(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));

        match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&value).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn response_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Register a user and log in, returning an access token.
    async fn register_and_login(router: &Router, email: &str) -> String {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/register",
                json!({
                    "full_name": "Test User",
                    "email": email,
                    "password": "hunter2hunter2"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                json!({ "username": email, "password": "hunter2hunter2" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response_json(response).await;
        body["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn home_responds() {
        let router = app(test_state().await);
        let response = router
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let router = app(test_state().await);

        let payload = json!({
            "full_name": "Ada Lovelace",
            "email": "ada@example.edu",
            "password": "hunter2hunter2"
        });

        let first = router
            .clone()
            .oneshot(json_request("POST", "/register", payload.clone()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::CREATED);

        let body = response_json(first).await;
        assert_eq!(body["email"], "ada@example.edu");
        assert!(body.get("password").is_none());
        assert!(body.get("password_hash").is_none());

        let second = router
            .clone()
            .oneshot(json_request("POST", "/register", payload))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let router = app(test_state().await);
        let response = router
            .oneshot(json_request(
                "POST",
                "/register",
                json!({
                    "full_name": "A",
                    "email": "a@example.edu",
                    "password": "short"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_rejects_wrong_credentials() {
        let router = app(test_state().await);
        let _token = register_and_login(&router, "grace@example.edu").await;

        // Wrong password
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                json!({ "username": "grace@example.edu", "password": "not-the-password" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // Unknown user
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/login",
                json!({ "username": "nobody@example.edu", "password": "whatever12345" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_valid_token() {
        let router = app(test_state().await);
        let token = register_and_login(&router, "me@example.edu").await;

        let response = router
            .clone()
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/me", "garbage-token", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/me", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["email"], "me@example.edu");
    }

    #[tokio::test]
    async fn course_and_lecture_flow() {
        let router = app(test_state().await);
        let token = register_and_login(&router, "prof@example.edu").await;

        // Create a course
        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/courses",
                &token,
                Some(json!({ "course_name": "Distributed Systems" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let course_id = response_json(response).await["course_id"]
            .as_str()
            .unwrap()
            .to_string();

        // It shows up in the listing
        let response = router
            .clone()
            .oneshot(authed_request("GET", "/courses", &token, None))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body["courses"][0]["course_name"], "Distributed Systems");

        // Create a lecture
        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                &format!("/courses/{course_id}"),
                &token,
                Some(json!({
                    "title": "Consensus",
                    "user_note": "raft and paxos",
                    "transcript": "today we discuss leader election"
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let lecture_id = response_json(response).await["lecture_id"]
            .as_str()
            .unwrap()
            .to_string();

        // List lectures in the course
        let response = router
            .clone()
            .oneshot(authed_request(
                "GET",
                &format!("/courses/{course_id}"),
                &token,
                None,
            ))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body["lectures"][0]["lecture_name"], "Consensus");

        // Partial update: set ai_note only; untouched fields must survive.
        let response = router
            .clone()
            .oneshot(authed_request(
                "PUT",
                &format!("/courses/{course_id}/lectures/{lecture_id}"),
                &token,
                Some(json!({ "ai_note": "<h1>[00:00:10] 1. Consensus<h1>" })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(authed_request(
                "GET",
                &format!("/courses/{course_id}/lectures/{lecture_id}"),
                &token,
                None,
            ))
            .await
            .unwrap();
        let body = response_json(response).await;
        assert_eq!(body["title"], "Consensus");
        assert_eq!(body["note"], "raft and paxos");
        assert_eq!(body["transcript"], "today we discuss leader election");
        assert_eq!(body["ai_note"], "<h1>[00:00:10] 1. Consensus<h1>");
    }

    #[tokio::test]
    async fn unknown_course_is_404() {
        let router = app(test_state().await);
        let token = register_and_login(&router, "lost@example.edu").await;

        let response = router
            .clone()
            .oneshot(authed_request("GET", "/courses/no-such-course", &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn file_listing_empty_for_new_course() {
        let router = app(test_state().await);
        let token = register_and_login(&router, "files@example.edu").await;

        let response = router
            .clone()
            .oneshot(authed_request(
                "POST",
                "/courses",
                &token,
                Some(json!({ "course_name": "Networks" })),
            ))
            .await
            .unwrap();
        let course_id = response_json(response).await["course_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = router
            .clone()
            .oneshot(authed_request(
                "GET",
                &format!("/api/files/{course_id}"),
                &token,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response_json(response).await;
        assert_eq!(body["audioFiles"], json!([]));
        assert_eq!(body["pdfFiles"], json!([]));
    }
}
