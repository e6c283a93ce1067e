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

//! src/docs.rs
//!
//! OpenAPI document for the service, served under `/swagger`.

use crate::domain::{User, UserAddress};
use crate::routes::{
    self, AddressPayload, DatabaseStatus, LivenessReport, ServerStatus,
    UserPayload,
};
use axum::{
    extract::Path,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quickstart Backend API",
        description = "Health check and employee records",
        license(name = "Apache 2.0", url = "http://www.apache.org/licenses/LICENSE-2.0.html")
    ),
    paths(
        routes::health_check,
        routes::list_users,
        routes::get_user,
        routes::create_user,
        routes::update_user,
        routes::delete_user,
        routes::list_addresses,
        routes::create_address,
    ),
    components(schemas(
        LivenessReport,
        ServerStatus,
        DatabaseStatus,
        User,
        UserAddress,
        UserPayload,
        AddressPayload,
    )),
    tags(
        (name = "health", description = "Liveness of the server and its database"),
        (name = "employees", description = "Users and their addresses")
    )
)]
pub struct ApiDoc;

const DOC_PATH: &str = "doc.json";

const SWAGGER_UI: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>Quickstart Backend API</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "/swagger/doc.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

pub fn docs_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/swagger/*asset", get(swagger))
}

/// `doc.json` is the OpenAPI document, every other asset the UI page.
async fn swagger(Path(asset): Path<String>) -> Response {
    if asset.trim_start_matches('/') == DOC_PATH {
        Json(ApiDoc::openapi()).into_response()
    } else {
        Html(SWAGGER_UI).into_response()
    }
}
