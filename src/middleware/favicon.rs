use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

const FAVICON_PATH: &str = "/favicon.ico";
const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// There is no icon to serve, so browsers get an empty `204` instead of
/// a logged 404.
pub async fn favicon(request: Request, next: Next) -> Response {
    if request.uri().path() != FAVICON_PATH {
        return next.run(request).await;
    }

    match *request.method() {
        Method::GET | Method::HEAD => StatusCode::NO_CONTENT.into_response(),
        Method::OPTIONS => {
            (StatusCode::OK, [(header::ALLOW, ALLOWED_METHODS)]).into_response()
        }
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            [(header::ALLOW, ALLOWED_METHODS)],
        )
            .into_response(),
    }
}
