use once_cell::sync::Lazy;
use quickstart_backend::{
    database::{self, DatabaseHandle},
    middleware::{CSRF_COOKIE, CSRF_HEADER},
    routes::HealthProbe,
    settings::AppSettings,
    startup::{AppState, Application},
};
use reqwest::{
    header::{COOKIE, SET_COOKIE},
    Client, Response,
};
use secrecy::Secret;
use sqlx::SqlitePool;
use std::{fs::remove_file, net::SocketAddr, path::PathBuf, sync::Arc};
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    // Output of `get_subscriber` cannot be assigned to a variable since
    // the Sink is part of the return type, therefore,
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = quickstart_backend::telemetry::get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::stdout,
        );
        quickstart_backend::telemetry::init_subscriber(subscriber)
            .expect("Failed to init tracing");
    } else {
        let subscriber = quickstart_backend::telemetry::get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::sink,
        );
        quickstart_backend::telemetry::init_subscriber(subscriber)
            .expect("Failed to init tracing");
    }
});

pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: SqlitePool,
    pub db_path: PathBuf,
    pub client: Client,
}

/// spawn_app
///
/// Spawns the app on a random port against its own throwaway database.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Like `spawn_app`, but the health check pings `database` instead of the
/// pool.
pub async fn spawn_app_with_probe(
    database: impl DatabaseHandle + 'static,
) -> TestApp {
    let database: Arc<dyn DatabaseHandle> = Arc::new(database);
    spawn_app_with(move |state| {
        state.health = HealthProbe {
            database,
            ping_timeout: state.health.ping_timeout,
        };
    })
    .await
}

async fn spawn_app_with<F>(customise: F) -> TestApp
where
    F: FnOnce(&mut AppState),
{
    Lazy::force(&TRACING);

    let db_path = std::env::temp_dir().join(format!("{}.db", Uuid::new_v4()));

    let mut settings = AppSettings::default();
    settings.addr = "127.0.0.1".into();
    // NOTE: Must bind to any available port, set to 0.
    // Otherwise all bound to same port and tests complain about used
    // port number.
    settings.port = 0;
    settings.database.url =
        Secret::new(format!("sqlite://{}", db_path.display()));
    settings.database.ping_timeout_milliseconds = 500;

    let pool = database::connect(&settings.database)
        .await
        .expect("Failed to create database pool.");
    database::migrate(&pool)
        .await
        .expect("Failed to migrate the database");

    let mut state = AppState::new(pool.clone(), &settings);
    customise(&mut state);

    let app = Application::build_with_state(settings, state)
        .await
        .expect("Failed to build application.");
    let addr = app.address();
    let _ = tokio::spawn(app.run_until_stopped());

    let client = Client::new();

    TestApp {
        addr,
        pool,
        db_path,
        client,
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Fetch a fresh CSRF token from a safe request.
    pub async fn csrf_token(&self) -> String {
        let resp = self.get("/health").await;
        resp.headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(|cookie| {
                cookie
                    .split(';')
                    .next()?
                    .strip_prefix(&format!("{CSRF_COOKIE}="))
                    .map(str::to_string)
            })
            .expect("No CSRF cookie was issued.")
    }

    pub async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Response {
        let token = self.csrf_token().await;
        self.client
            .request(method, self.url(path))
            .header(COOKIE, format!("{CSRF_COOKIE}={token}"))
            .header(CSRF_HEADER, token)
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn post_user(&self, body: &serde_json::Value) -> Response {
        self.send_json(reqwest::Method::POST, "/api/v1/users", body)
            .await
    }

    pub async fn delete(&self, path: &str) -> Response {
        let token = self.csrf_token().await;
        self.client
            .delete(self.url(path))
            .header(COOKIE, format!("{CSRF_COOKIE}={token}"))
            .header(CSRF_HEADER, token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn cleanup(self) {
        self.pool.close().await;
        let path = self.db_path.display().to_string();
        for file in [path.clone(), format!("{path}-wal"), format!("{path}-shm")]
        {
            // WAL side files may not exist
            let _ = remove_file(file);
        }
    }
}
