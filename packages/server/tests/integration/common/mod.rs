use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use ::common::config::ProgressConfig;
use ::common::time_format::DisplayClock;
use reqwest::Client;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;

use server::config::{
    AppConfig, CorsConfig, DatabaseConfig, JudgingConfig, LogConfig, ServerConfig,
};
use server::services::judging::JudgingService;
use server::state::AppState;
use server::store::{MemoryStore, NewJudging, ResultStore};

pub mod routes {
    pub const STANDINGS: &str = "/api/v1/course/standings";
    pub const OPENAPI: &str = "/api-docs/openapi.json";

    pub fn judging(id: i32) -> String {
        format!("/api/v1/judgings/{id}")
    }

    pub fn judging_verify(id: i32) -> String {
        format!("/api/v1/judgings/{id}/verify")
    }
}

/// Contest start used by every fixture: 2024-04-15 09:00 UTC.
pub fn contest_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 15, 9, 0, 0).unwrap()
}

/// `seconds` after [`contest_start`].
pub fn at(seconds: i64) -> DateTime<Utc> {
    contest_start() + Duration::seconds(seconds)
}

pub fn new_judging(submission_id: i32, start_offset_secs: i64) -> NewJudging {
    NewJudging {
        submission_id,
        contest_id: 1,
        start_time: at(start_offset_secs),
        judgehost: Some("judgehost-1".into()),
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors: CorsConfig {
                allow_origins: vec![],
                max_age: 3600,
            },
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        progress: ProgressConfig::default(),
        judging: JudgingConfig::default(),
        log: LogConfig::default(),
    }
}

/// Memory store with contest 1 (`week01`) starting at [`contest_start`].
pub async fn memory_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .add_contest(1, "week01", contest_start(), contest_start() + Duration::days(7))
        .await;
    store
}

pub fn judging_service(store: Arc<MemoryStore>) -> JudgingService {
    JudgingService::new(store, Arc::new(DisplayClock::utc()))
}

/// Fresh in-memory SQLite database with the schema synced.
///
/// A single connection, since every connection to `sqlite::memory:` opens its
/// own empty database.
pub async fn sqlite_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).min_connections(1);
    let db = Database::connect(opts)
        .await
        .expect("Failed to open in-memory SQLite database");
    server::database::sync_schema(&db)
        .await
        .expect("Failed to sync schema");
    db
}

/// A running test server.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn(store: Arc<dyn ResultStore>) -> Self {
        let app = server::build_router(AppState::new(test_config(), store));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    /// The `code` field of an `ErrorBody`.
    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
