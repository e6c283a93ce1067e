//! src/routes/health_check.rs

use crate::database::DatabaseHandle;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::{sync::Arc, time::Duration};
use utoipa::ToSchema;

pub const DATABASE_ERROR_BODY: &str = "Database connection error";

/// What the health check needs: something to ping and how long to wait.
#[derive(Clone)]
pub struct HealthProbe {
    pub database: Arc<dyn DatabaseHandle>,
    pub ping_timeout: Duration,
}

#[derive(Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    Running,
    Unknown,
}

#[derive(Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseStatus {
    Running,
    Unreachable,
}

/// Built fresh for every request, never cached.
#[derive(Serialize, ToSchema, Debug, PartialEq, Eq)]
pub struct LivenessReport {
    pub server: ServerStatus,
    pub db: DatabaseStatus,
}

#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("Database ping failed")]
    Ping(#[from] sqlx::Error),
    #[error("Database ping did not complete within {0:?}")]
    Timeout(Duration),
}

impl HealthProbe {
    /// Ping the database once, bounded by `ping_timeout`.
    pub async fn ping(&self) -> Result<(), ProbeError> {
        tokio::time::timeout(self.ping_timeout, self.database.ping())
            .await
            .map_err(|_| ProbeError::Timeout(self.ping_timeout))??;
        Ok(())
    }

    /// One fresh probe. A failure is logged here and only its outcome
    /// makes it into the report.
    pub async fn check(&self) -> LivenessReport {
        let db = match self.ping().await {
            Ok(()) => DatabaseStatus::Running,
            Err(e) => {
                tracing::error!(error = ?e, "Database ping failed");
                DatabaseStatus::Unreachable
            }
        };

        LivenessReport {
            server: ServerStatus::Running,
            db,
        }
    }
}

/// Health check
///
/// Liveness probe for orchestration: reports the server and its database.
///
/// # Returns
/// `200` with `{"server": "Running", "db": "Running"}` when the database
/// answers, otherwise `500` with a plain text body.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Server and database are running", body = LivenessReport),
        (status = 500, description = "Database connection error", content_type = "text/plain", body = String)
    )
)]
#[tracing::instrument(name = "Health check", skip(probe))]
pub async fn health_check(State(probe): State<HealthProbe>) -> Response {
    let report = probe.check().await;
    match report.db {
        DatabaseStatus::Running => (StatusCode::OK, Json(report)).into_response(),
        DatabaseStatus::Unreachable => {
            (StatusCode::INTERNAL_SERVER_ERROR, DATABASE_ERROR_BODY)
                .into_response()
        }
    }
}
