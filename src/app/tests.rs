//! End-to-end tests for the assembled application.

use super::*;
use crate::config::{Locator, Paths, SecretKey};
use crate::extensions::CSRF_HEADER;
use crate::views::public::GREETING;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::fs;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::Level;

fn config(env: Environment, dir: &TempDir) -> Config {
    Config::for_environment(env, Paths::new(dir.path()), SecretKey::generate()).unwrap()
}

async fn testing_app(dir: &TempDir) -> App {
    App::create(config(Environment::Testing, dir)).await.unwrap()
}

async fn get(app: &App, uri: &str) -> (StatusCode, String) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.router().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

// ==================== Route tests ====================

#[tokio::test]
async fn test_visit_home_page() {
    let dir = TempDir::new().unwrap();
    let app = testing_app(&dir).await;

    let (status, body) = get(&app, "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Hello World!"));
}

#[tokio::test]
async fn test_home_alias_matches_root() {
    let dir = TempDir::new().unwrap();
    let app = testing_app(&dir).await;

    let root = get(&app, "/").await;
    let home = get(&app, "/home").await;
    let slash = get(&app, "/home/").await;

    assert_eq!(root, home);
    assert_eq!(root, slash);
    assert_eq!(home.1, GREETING);
}

#[tokio::test]
async fn test_home_is_plain_text() {
    let dir = TempDir::new().unwrap();
    let app = testing_app(&dir).await;
    let req = Request::builder().uri("/").body(Body::empty()).unwrap();

    let resp = app.router().oneshot(req).await.unwrap();

    let content_type = resp.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_home_rejects_writes() {
    let dir = TempDir::new().unwrap();
    let app = testing_app(&dir).await;
    let req = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::empty())
        .unwrap();

    let resp = app.router().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = testing_app(&dir).await;

    let (status, _) = get(&app, "/missing").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_home_logs_each_level_once() {
    let dir = TempDir::new().unwrap();
    let app = testing_app(&dir).await;
    let path = dir.path().join("home.log");

    {
        let _guard =
            logging::install_scoped(&[LogHandler::file(Level::TRACE, path.clone())]).unwrap();
        get(&app, "/").await;
    }

    let written = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = written
        .lines()
        .filter(|l| l.contains("Hello from the home route!"))
        .collect();
    assert_eq!(lines.len(), 5, "{written}");
    for level in ["TRACE", "DEBUG", "INFO", "WARNING", "ERROR"] {
        assert!(lines.iter().any(|l| l.contains(&format!(" {level} "))), "{level}");
    }
}

// ==================== Bootstrap tests ====================

#[tokio::test]
async fn test_testing_app_has_console_handler_only() {
    let dir = TempDir::new().unwrap();
    let app = testing_app(&dir).await;

    assert_eq!(app.log_handlers(), &[LogHandler::console(Level::INFO)]);
    assert!(app.config().testing);
    assert_eq!(app.config().database, Locator::Memory);
}

#[tokio::test]
async fn test_production_app_adds_file_handler() {
    let dir = TempDir::new().unwrap();
    let app = App::create(config(Environment::Production, &dir)).await.unwrap();

    assert_eq!(app.log_handlers().len(), 2);
    assert!(dir.path().join("tmp").join("logs").is_dir());
    assert!(dir.path().join("tmp").join("production.db").exists());
    app.extensions().db.close().await;
}

#[tokio::test]
async fn test_working_dir_with_query_characters_boots() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("site?v2");
    fs::create_dir(&root).unwrap();
    let cfg = Config::for_environment(
        Environment::Development,
        Paths::new(&root),
        SecretKey::generate(),
    )
    .unwrap();

    let app = App::create(cfg).await.unwrap();

    assert!(root.join("tmp").join("development.db").exists());
    app.extensions().db.close().await;
}

#[tokio::test]
async fn test_testing_apps_do_not_share_storage() {
    let dir = TempDir::new().unwrap();
    let first = testing_app(&dir).await;
    let second = testing_app(&dir).await;

    first
        .extensions()
        .register_user("alice", "pw")
        .await
        .unwrap();

    assert_eq!(first.extensions().db.count_users().await.unwrap(), 1);
    assert_eq!(second.extensions().db.count_users().await.unwrap(), 0);
}

#[tokio::test]
async fn test_invalid_config_aborts_startup() {
    let dir = TempDir::new().unwrap();
    let mut cfg = config(Environment::Testing, &dir);
    cfg.bind = String::new();

    let result = App::create(cfg).await;

    assert!(matches!(result, Err(AppError::Config(_))));
}

#[tokio::test]
async fn test_logging_failure_aborts_startup() {
    let dir = TempDir::new().unwrap();
    let cfg = config(Environment::Production, &dir);
    fs::write(dir.path().join("tmp").join("logs"), b"blocked").unwrap();

    let result = App::create(cfg).await;

    assert!(matches!(result, Err(AppError::Logging(_))));
}

// ==================== CSRF wiring tests ====================

#[tokio::test]
async fn test_production_unsupported_method_is_not_a_csrf_failure() {
    let dir = TempDir::new().unwrap();
    let app = App::create(config(Environment::Production, &dir)).await.unwrap();

    for uri in ["/", "/home"] {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let resp = app.router().oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{uri}");
    }
    app.extensions().db.close().await;
}

#[tokio::test]
async fn test_production_valid_token_still_gets_405() {
    let dir = TempDir::new().unwrap();
    let app = App::create(config(Environment::Production, &dir)).await.unwrap();
    let token = app.extensions().csrf.generate_token();
    let req = Request::builder()
        .method("POST")
        .uri("/")
        .header(CSRF_HEADER, token)
        .body(Body::empty())
        .unwrap();

    let resp = app.router().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    app.extensions().db.close().await;
}

#[tokio::test]
async fn test_remember_cookie_does_not_change_home() {
    let dir = TempDir::new().unwrap();
    let app = testing_app(&dir).await;
    let user = app.extensions().register_user("alice", "pw").await.unwrap();
    let cookie = app.extensions().login_manager.remember_cookie(user.id);
    let req = Request::builder()
        .uri("/home")
        .header("cookie", format!("remember_token={cookie}"))
        .body(Body::empty())
        .unwrap();

    let resp = app.router().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_production_reads_need_no_token() {
    let dir = TempDir::new().unwrap();
    let app = App::create(config(Environment::Production, &dir)).await.unwrap();

    let (status, body) = get(&app, "/home").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, GREETING);
    app.extensions().db.close().await;
}
