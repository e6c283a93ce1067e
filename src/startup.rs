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

//! src/startup.rs

use crate::{
    database::{self, DatabaseHandle},
    docs::docs_routes,
    middleware::wrap_in_chain,
    routes::{employee_routes, error_chain_fmt, health_check, HealthProbe},
    settings::{AppSettings, SettingsError},
};
use axum::{http::StatusCode, routing::get, Router};
use axum_macros::FromRef;
use sqlx::SqlitePool;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, signal};

/// Everything a handler may need, built once at startup and cloned into
/// each request.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub pool: SqlitePool,
    pub health: HealthProbe,
}

impl AppState {
    /// The health check pings the same pool the routes use.
    pub fn new(pool: SqlitePool, settings: &AppSettings) -> Self {
        let database: Arc<dyn DatabaseHandle> = Arc::new(pool.clone());
        Self {
            pool,
            health: HealthProbe {
                database,
                ping_timeout: settings.database.ping_timeout(),
            },
        }
    }
}

#[derive(thiserror::Error)]
pub enum StartupError {
    #[error("Failed to load settings")]
    Settings(#[from] SettingsError),
    #[error("Failed to connect to the database")]
    Database(#[source] sqlx::Error),
    #[error("Failed to migrate the database")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Failed to bind {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl std::fmt::Debug for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Register every route, then wrap the lot in the middleware chain.
pub fn app(state: AppState, settings: &AppSettings) -> Router {
    let router: Router<AppState> = Router::new()
        .route("/health", get(health_check))
        .merge(employee_routes::<AppState>())
        .merge(docs_routes::<AppState>())
        .fallback(|| async { StatusCode::NOT_FOUND });

    wrap_in_chain(router, &settings.cors).with_state(state)
}

pub struct Application {
    addr: SocketAddr,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Connect, migrate and bind. Any failure here is fatal to the process.
    pub async fn build(settings: AppSettings) -> Result<Self, StartupError> {
        let pool = database::connect(&settings.database)
            .await
            .map_err(StartupError::Database)?;
        database::migrate(&pool).await?;

        let state = AppState::new(pool, &settings);
        Self::build_with_state(settings, state).await
    }

    /// Bind and assemble the router around an existing state.
    pub async fn build_with_state(
        settings: AppSettings,
        state: AppState,
    ) -> Result<Self, StartupError> {
        let bind_addr = format!("{}:{}", settings.addr, settings.port);
        let listener = TcpListener::bind(&bind_addr).await.map_err(|source| {
            StartupError::Bind {
                addr: bind_addr.clone(),
                source,
            }
        })?;
        let addr = listener.local_addr().map_err(|source| StartupError::Bind {
            addr: bind_addr,
            source,
        })?;

        Ok(Self {
            addr,
            listener,
            router: app(state, &settings),
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        tracing::info!(addr = %self.addr, "Listening");
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install SIGINT handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
