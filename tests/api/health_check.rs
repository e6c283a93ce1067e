use crate::helpers::{spawn_app, spawn_app_with_probe};
use async_trait::async_trait;
use quickstart_backend::database::DatabaseHandle;
use reqwest::StatusCode;

struct Stalled;

#[async_trait]
impl DatabaseHandle for Stalled {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

#[tokio::test]
async fn health_check_reports_server_and_database_running() {
    let app = spawn_app().await;

    let resp = app.get("/health").await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({"server": "Running", "db": "Running"})
    );

    app.cleanup().await;
}

#[tokio::test]
async fn health_check_returns_500_once_the_database_is_gone() {
    let app = spawn_app().await;
    assert_eq!(app.get("/health").await.status(), StatusCode::OK);

    // Severs the connection the handlers share
    app.pool.close().await;

    let resp = app.get("/health").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text().await.unwrap(), "Database connection error");

    // The service itself keeps answering
    assert_eq!(
        app.get("/health").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        app.get("/does-not-exist").await.status(),
        StatusCode::NOT_FOUND
    );

    app.cleanup().await;
}

#[tokio::test]
async fn health_check_gives_up_on_a_stalled_database() {
    let app = spawn_app_with_probe(Stalled).await;

    let resp = app.get("/health").await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.text().await.unwrap(), "Database connection error");

    app.cleanup().await;
}

#[tokio::test]
async fn health_check_is_not_cached_between_requests() {
    let app = spawn_app().await;

    for _ in 0..3 {
        assert_eq!(app.get("/health").await.status(), StatusCode::OK);
    }
    app.pool.close().await;
    assert_eq!(
        app.get("/health").await.status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );

    app.cleanup().await;
}
