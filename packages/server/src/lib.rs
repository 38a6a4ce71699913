#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for campus metric uploads and dashboards.
//!
//! A thin HTTP layer over `campus_kpi_ingest` and `campus_kpi_dashboard`.
//! All requests share one `DuckDB` connection.

mod handlers;

use std::sync::{Mutex, MutexGuard, PoisonError};

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use campus_kpi_database::{db, paths};
use campus_kpi_ingest_models::IngestConfig;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared application state.
pub struct AppState {
    /// Metric store. `duckdb::Connection` is `Send` but not `Sync`, so a
    /// `Mutex` is needed.
    db: Mutex<duckdb::Connection>,
    /// Settings applied to every upload.
    pub ingest_config: IngestConfig,
}

impl AppState {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(conn: duckdb::Connection, ingest_config: IngestConfig) -> Self {
        Self {
            db: Mutex::new(conn),
            ingest_config,
        }
    }

    /// Locks the shared connection. A poisoned lock is recovered since the
    /// connection holds no in-memory invariants of ours.
    pub fn lock_db(&self) -> MutexGuard<'_, duckdb::Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_UPLOAD_BYTES)).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/ingest", web::post().to(handlers::ingest))
            .service(
                web::scope("/dashboard")
                    .route("/chart-data", web::get().to(handlers::chart_data))
                    .route("/records", web::get().to(handlers::records))
                    .route("/filters", web::get().to(handlers::filters)),
            ),
    );
}

/// Starts the API server.
///
/// Opens the metric database (creating the schema if needed), reads the
/// ingest configuration from the environment and serves on `BIND_ADDR:PORT`
/// (default `127.0.0.1:8080`). The caller provides the async runtime, e.g.
/// via `#[actix_web::main]`.
///
/// # Errors
///
/// Returns an `std::io::Result` error if the database cannot be opened, or
/// the HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    log::info!(
        "Opening metric database at {}...",
        paths::metrics_db_path().display()
    );
    let conn = db::open_from_env().map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState::new(conn, IngestConfig::from_env()));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::Value;

    use super::*;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(
            db::open_in_memory().unwrap(),
            IngestConfig::default(),
        ))
    }

    const CSV: &str = "year,department,metric_type,value\n\
                       2023,philosophy,PAPER,3\n\
                       2024,철학과,paper,4\n\
                       2024,education,BUDGET,100\n";

    #[actix_web::test]
    async fn health_reports_version() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["healthy"], true);
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn non_integer_year_is_bad_request() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/dashboard/chart-data?year=abc")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({"error": "invalid_parameter"}));
    }

    #[actix_web::test]
    async fn empty_store_gives_empty_chart() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;
        let req = test::TestRequest::get()
            .uri("/api/dashboard/chart-data?year=&department=")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, serde_json::json!({"labels": [], "datasets": []}));
    }

    #[actix_web::test]
    async fn upload_then_chart() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/ingest?filename=metrics.csv")
            .set_payload(CSV)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["successCount"], 3);
        assert_eq!(body["failureCount"], 0);
        assert_eq!(body["summary"], "Total 3 rows: 3 success, 0 failed");

        let req = test::TestRequest::get()
            .uri("/api/dashboard/chart-data?department=philosophy")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["labels"], serde_json::json!(["2023", "2024"]));
        assert_eq!(body["datasets"][0]["label"], "PAPER");
        assert_eq!(body["datasets"][0]["data"], serde_json::json!([3.0, 4.0]));
        assert_eq!(body["datasets"][0]["backgroundColor"], "#4A90E2");

        let req = test::TestRequest::get()
            .uri("/api/dashboard/records?year=2024")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(2));
        assert_eq!(body[0]["department"], "education");

        let req = test::TestRequest::get()
            .uri("/api/dashboard/filters")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["defaultYear"], 2024);
        assert_eq!(body["departments"], serde_json::json!(["education", "philosophy"]));
    }

    #[actix_web::test]
    async fn rejected_upload_is_validation_error() {
        let app =
            test::init_service(App::new().app_data(state()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/ingest?filename=notes.txt")
            .set_payload("hello")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "validation_error");

        let req = test::TestRequest::post()
            .uri("/api/ingest")
            .set_payload(CSV)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
