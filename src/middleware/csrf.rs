//! Double-submit cookie CSRF protection.
//!
//! Safe requests are handed a token in the `csrf_` cookie. Anything that
//! can change state must echo that token back in the `X-Csrf-Token`
//! header; a cross-site page can make the browser send the cookie but
//! cannot read it to fill in the header.

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

pub const CSRF_COOKIE: &str = "csrf_";
pub const CSRF_HEADER: &str = "x-csrf-token";
const TOKEN_MAX_AGE: time::Duration = time::Duration::hours(1);

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Compare without bailing out on the first differing byte.
fn tokens_match(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes().zip(b.bytes()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn token_cookie(token: String) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .same_site(SameSite::Lax)
        .max_age(TOKEN_MAX_AGE)
        .build()
}

pub async fn csrf(jar: CookieJar, request: Request, next: Next) -> Response {
    let cookie_token = jar.get(CSRF_COOKIE).map(|c| c.value().to_owned());

    if is_safe(request.method()) {
        let token = cookie_token.unwrap_or_else(|| Uuid::new_v4().to_string());
        let response = next.run(request).await;
        return (jar.add(token_cookie(token)), response).into_response();
    }

    let header_token = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());
    let authorised = match (cookie_token.as_deref(), header_token) {
        (Some(cookie), Some(header)) if !cookie.is_empty() => tokens_match(cookie, header),
        _ => false,
    };

    if !authorised {
        tracing::warn!(
            method = %request.method(),
            uri = %request.uri(),
            "Rejected request with a missing or mismatched CSRF token"
        );
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }
    next.run(request).await
}
