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

//! src/database.rs

use crate::settings::DatabaseSettings;
use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Connection, SqlitePool};

/// Anything the health check can ping.
///
/// The pool is handed to handlers through the app state rather than a
/// global, so tests are free to swap in their own implementation.
#[async_trait]
pub trait DatabaseHandle: Send + Sync {
    async fn ping(&self) -> Result<(), sqlx::Error>;
}

#[async_trait]
impl DatabaseHandle for SqlitePool {
    async fn ping(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.acquire().await?;
        conn.ping().await
    }
}

/// Open the pool and establish a first connection.
///
/// Connecting eagerly means an unreachable database is reported at
/// startup instead of on the first request.
#[tracing::instrument(name = "Connecting to the database", skip(settings))]
pub async fn connect(
    settings: &DatabaseSettings,
) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(settings.max_connections)
        .connect_with(settings.connect_options()?)
        .await
}

#[tracing::instrument(name = "Running database migrations", skip(pool))]
pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
