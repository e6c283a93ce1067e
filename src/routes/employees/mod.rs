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

//! src/routes/employees/mod.rs
//!
//! Users and their addresses under `/api/v1/users`.

mod addresses;
mod users;

pub use addresses::*;
pub use users::*;

use crate::routes::error_chain_fmt;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sqlx::SqlitePool;

/// Mount the employee routes on any router whose state can hand out the
/// database pool.
pub fn employee_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    SqlitePool: axum::extract::FromRef<S>,
{
    Router::new()
        .route("/api/v1/users", get(list_users).post(create_user))
        .route(
            "/api/v1/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route(
            "/api/v1/users/:id/addresses",
            get(list_addresses).post(create_address),
        )
}

#[derive(thiserror::Error)]
pub enum EmployeeError {
    #[error("{0}")]
    Validation(String),
    #[error("User {0} was not found")]
    NotFound(i64),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for EmployeeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for EmployeeError {
    fn into_response(self) -> Response {
        let status = match &self {
            EmployeeError::Validation(_) => StatusCode::BAD_REQUEST,
            EmployeeError::NotFound(_) => StatusCode::NOT_FOUND,
            EmployeeError::UnexpectedError(_) => {
                tracing::error!(error = ?self, "Employee request failed.");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}
