// Copyright 2024 David Kalliecharan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// 	http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Copyright (c) 2024 David Kalliecharan
//
// SPDX-License-Identifier: BSD-2-Clause

//! src/middleware/mod.rs
//!
//! Interceptors wrapped around every route, the 404 fallback included.

mod csrf;
mod favicon;
mod security_headers;

pub use csrf::{csrf, CSRF_COOKIE, CSRF_HEADER};
pub use favicon::favicon;

use crate::{settings::CorsSettings, telemetry::make_request_span};
use axum::{
    body::Body,
    http::{HeaderValue, Method},
    middleware::from_fn,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

/// One interceptor in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MiddlewareStage {
    /// Post: hardening headers on every response, unless already set.
    SecurityHeaders,
    /// Pre: answers `/favicon.ico` itself, the request goes no further.
    Favicon,
    /// Turns a panic anywhere further in into a `500`.
    PanicRecovery,
    /// Pre: answers preflights. Post: adds the CORS headers.
    Cors,
    /// Pre: rejects unsafe methods without a matching token.
    /// Post: (re)issues the token cookie on safe methods.
    /// Guards matched routes only, so unmatched paths still get their 404.
    Csrf,
    /// One span per request, with its id, method and uri.
    RequestLogging,
}

/// The chain, outermost first: a request walks it top to bottom and the
/// response walks back up.
pub const MIDDLEWARE_CHAIN: [MiddlewareStage; 6] = [
    MiddlewareStage::SecurityHeaders,
    MiddlewareStage::Favicon,
    MiddlewareStage::PanicRecovery,
    MiddlewareStage::Cors,
    MiddlewareStage::Csrf,
    MiddlewareStage::RequestLogging,
];

impl MiddlewareStage {
    fn wrap<S>(self, router: Router<S>, cors: &CorsSettings) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        match self {
            MiddlewareStage::SecurityHeaders => security_headers::wrap(router),
            MiddlewareStage::Favicon => router.layer(from_fn(favicon)),
            MiddlewareStage::PanicRecovery => {
                router.layer(CatchPanicLayer::new())
            }
            MiddlewareStage::Cors => router.layer(cors_layer(cors)),
            MiddlewareStage::Csrf => router.route_layer(from_fn(csrf)),
            MiddlewareStage::RequestLogging => router.layer(
                TraceLayer::new_for_http()
                    .make_span_with(make_request_span::<Body>),
            ),
        }
    }
}

/// Wrap `router` in every stage of [`MIDDLEWARE_CHAIN`].
///
/// `Router::layer` wraps what is already there, so the innermost stage has
/// to go on first.
pub fn wrap_in_chain<S>(router: Router<S>, cors: &CorsSettings) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    MIDDLEWARE_CHAIN
        .iter()
        .rev()
        .fold(router, |router, stage| stage.wrap(router, cors))
}

pub fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    let origins = if settings.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(settings.allowed_origins.iter().filter_map(
            |origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            },
        ))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers(Any)
}
