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

//! src/settings.rs

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sqlx::sqlite::SqliteConnectOptions;
use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// AppSettings
///
/// This controls the settings for the app itself. Every field has a
/// default so a partial (or missing) settings file is fine.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AppSettings {
    pub addr: String,
    pub port: u16,
    pub database: DatabaseSettings,
    pub cors: CorsSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0".into(),
            port: 3000,
            database: DatabaseSettings::default(),
            cors: CorsSettings::default(),
        }
    }
}

/// DatabaseSettings
///
/// We are using `sqlite`, so the url is all the connection information
/// needed. It is kept behind `Secret` as a production url may carry
/// credentials and `secrecy` keeps it out of `Debug` output.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Secret<String>,
    pub create_if_missing: bool,
    pub max_connections: u32,
    /// Deadline for the `/health` database ping
    pub ping_timeout_milliseconds: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: Secret::new("sqlite://quickstart.db".into()),
            create_if_missing: true,
            max_connections: 10,
            ping_timeout_milliseconds: 5000,
        }
    }
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<SqliteConnectOptions, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(self.url.expose_secret())?
            .create_if_missing(self.create_if_missing)
            .foreign_keys(true);
        Ok(options)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_milliseconds)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CorsSettings {
    /// `*` allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("{0}")]
    Environment(String),
    #[error("Failed to read settings file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse settings file")]
    Parse(#[from] toml::de::Error),
    #[error("{name}={value:?} is not a valid value")]
    InvalidVariable { name: &'static str, value: String },
}

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. \
                Use either `local` or `production`.",
                other
            )),
        }
    }
}

impl AppSettings {
    /// Environment variables win over whatever the settings file said.
    ///
    /// `lookup` is `std::env::var` in production, tests hand in a map.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("APP_ADDR") {
            self.addr = addr;
        }
        if let Some(port) = lookup("APP_PORT") {
            self.port = port.parse().map_err(|_| {
                SettingsError::InvalidVariable {
                    name: "APP_PORT",
                    value: port,
                }
            })?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = Secret::new(url);
        }
        Ok(())
    }
}

/// Load a settings file, falling back to defaults when it does not exist.
pub fn load_settings_file(path: &Path) -> Result<AppSettings, SettingsError> {
    match fs::read_to_string(path) {
        Ok(toml_str) => Ok(toml::from_str(&toml_str)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(?path, "No settings file, using defaults");
            Ok(AppSettings::default())
        }
        Err(source) => Err(SettingsError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Read `.env`, then `./settings.<APP_ENV>.toml`, then the environment.
pub fn read_settings_file() -> Result<AppSettings, SettingsError> {
    // A missing .env is normal outside of local development
    let _ = dotenv::dotenv();

    let env: Environment = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(SettingsError::Environment)?;
    let filename = format!("./settings.{}.toml", env.as_str());

    let mut settings = load_settings_file(Path::new(&filename))?;
    settings.apply_overrides(|key| std::env::var(key).ok())?;
    Ok(settings)
}
