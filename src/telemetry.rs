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

//! src/telemetry.rs

use axum::http::Request;
use tracing::{subscriber::set_global_default, Level, Span, Subscriber};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, EnvFilter, Registry,
};

/// Verbosity used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "debug";

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to set logger")]
    Logger(#[from] tracing_log::log::SetLoggerError),
    #[error("Failed to set global subscriber")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Compose multi layers into a `tracing` subscriber
///
/// Using `impl Subscriber` to be more generic. We also need `Send` and
/// `Sync` to be able to pass to `init_subscriber` later.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    // Higher-ranked trait bound (HRTB) Sink implements the MakeWriter trait
    // See: https://doc.rust-lang.org/nomicon/hrtb.html
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(env_filter));

    let formatting_layer = BunyanFormattingLayer::new(name, sink);

    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
}

/// Initialize global subscriber
///
/// Redirects `log` records (sqlx emits those) into `tracing` and installs
/// the subscriber. Can only succeed once per process.
pub fn init_subscriber(
    subscriber: impl Subscriber + Send + Sync,
) -> Result<(), TelemetryError> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}

/// Span wrapping a single request, tagged with a fresh request id.
pub fn make_request_span<B>(request: &Request<B>) -> Span {
    let request_id = uuid::Uuid::new_v4().to_string();

    tracing::span!(
        Level::INFO,
        "request",
        %request_id,
        method = ?request.method(),
        uri = %request.uri(),
        version = ?request.version(),
    )
}
