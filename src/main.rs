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

//! quickstart_backend is an axum scaffold for a small records service.
//!
//! # Table of contents
//!
//! - [Introduction](#introduction)
//!
//! # Introduction
//!
//! On start it reads its settings, connects to the database (giving up
//! immediately if it cannot) and serves,
//! * `GET /health` for liveness probes
//! * `/api/v1/users` for employee records
//! * `/swagger/*` for the API documentation

use quickstart_backend::{
    settings::read_settings_file,
    startup::{Application, StartupError},
    telemetry::{get_subscriber, init_subscriber, DEFAULT_FILTER},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber(
        "quickstart_backend".into(),
        DEFAULT_FILTER.into(),
        std::io::stdout,
    );
    init_subscriber(subscriber)?;

    let app = match startup().await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = ?e, "Startup failed");
            return Err(e.into());
        }
    };
    app.run_until_stopped().await?;
    Ok(())
}

async fn startup() -> Result<Application, StartupError> {
    let app_settings = read_settings_file()?;
    Application::build(app_settings).await
}
