use crate::helpers::spawn_app;
use quickstart_backend::middleware::{CSRF_COOKIE, CSRF_HEADER};
use reqwest::{header, Method, StatusCode};

#[tokio::test]
async fn unmatched_paths_return_404_with_an_empty_body_for_any_method() {
    let app = spawn_app().await;

    for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
        let resp = app
            .client
            .request(method.clone(), app.url("/does-not-exist"))
            .send()
            .await
            .expect("Failed to execute request.");

        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method}");
        assert_eq!(resp.text().await.unwrap(), "", "{method}");
    }

    app.cleanup().await;
}

#[tokio::test]
async fn responses_carry_security_headers() {
    let app = spawn_app().await;

    let resp = app.get("/health").await;

    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");
    assert_eq!(resp.headers()["x-frame-options"], "SAMEORIGIN");
    assert_eq!(resp.headers()["referrer-policy"], "no-referrer");

    app.cleanup().await;
}

#[tokio::test]
async fn favicon_is_short_circuited() {
    let app = spawn_app().await;

    let resp = app.get("/favicon.ico").await;

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    app.cleanup().await;
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let app = spawn_app().await;

    let resp = app
        .client
        .get(app.url("/health"))
        .header(header::ORIGIN, "https://frontend.example")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    app.cleanup().await;
}

#[tokio::test]
async fn writes_without_a_csrf_token_are_forbidden() {
    let app = spawn_app().await;

    let resp = app
        .client
        .post(app.url("/api/v1/users"))
        .json(&serde_json::json!({"name": "Ursula", "email": "u@example.ca"}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    app.cleanup().await;
}

#[tokio::test]
async fn writes_with_a_forged_csrf_token_are_forbidden() {
    let app = spawn_app().await;
    let token = app.csrf_token().await;

    let resp = app
        .client
        .post(app.url("/api/v1/users"))
        .header(header::COOKIE, format!("{CSRF_COOKIE}={token}"))
        .header(CSRF_HEADER, "forged")
        .json(&serde_json::json!({"name": "Ursula", "email": "u@example.ca"}))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    app.cleanup().await;
}

#[tokio::test]
async fn swagger_documentation_is_served() {
    let app = spawn_app().await;

    let resp = app.get("/swagger/doc.json").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let doc: serde_json::Value = resp.json().await.unwrap();
    assert!(doc["paths"]["/api/v1/users"].is_object());

    let resp = app.get("/swagger/index.html").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("/swagger/doc.json"));

    app.cleanup().await;
}
