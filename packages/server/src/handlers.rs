//! HTTP handler functions for the campus metrics API.
//!
//! Database work runs on actix's blocking pool via [`web::block`].

use actix_web::{HttpResponse, web};
use campus_kpi_dashboard::FilterError;
use campus_kpi_database_models::MetricQuery;
use campus_kpi_ingest::IngestError;
use campus_kpi_server_models::{
    ApiError, ApiHealth, ApiIngestResult, ApiMetricRecord, IngestParams, MetricQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/dashboard/chart-data`
///
/// Returns the `{labels, datasets}` chart payload for the optional `year`
/// and `department` filters.
pub async fn chart_data(
    state: web::Data<AppState>,
    params: web::Query<MetricQueryParams>,
) -> HttpResponse {
    let filters = match parse_params(&params) {
        Ok(filters) => filters,
        Err(e) => return invalid_parameter(&e),
    };

    let result = web::block(move || {
        let conn = state.lock_db();
        campus_kpi_dashboard::chart_data(&conn, &filters)
    })
    .await;

    match result {
        Ok(Ok(chart)) => HttpResponse::Ok().json(chart),
        Ok(Err(e)) => server_error("Failed to build chart data", &e),
        Err(e) => server_error("Failed to build chart data", &e),
    }
}

/// `GET /api/dashboard/records`
///
/// Returns stored records ordered by year, department and metric type.
pub async fn records(
    state: web::Data<AppState>,
    params: web::Query<MetricQueryParams>,
) -> HttpResponse {
    let filters = match parse_params(&params) {
        Ok(filters) => filters,
        Err(e) => return invalid_parameter(&e),
    };

    let result = web::block(move || {
        let conn = state.lock_db();
        campus_kpi_dashboard::query(&conn, &filters)
    })
    .await;

    match result {
        Ok(Ok(records)) => {
            let records: Vec<ApiMetricRecord> =
                records.into_iter().map(ApiMetricRecord::from).collect();
            HttpResponse::Ok().json(records)
        }
        Ok(Err(e)) => server_error("Failed to query records", &e),
        Err(e) => server_error("Failed to query records", &e),
    }
}

/// `GET /api/dashboard/filters`
///
/// Returns the latest year, recent years and all departments with data.
pub async fn filters(state: web::Data<AppState>) -> HttpResponse {
    let result = web::block(move || {
        let conn = state.lock_db();
        campus_kpi_dashboard::default_filters(&conn)
    })
    .await;

    match result {
        Ok(Ok(filters)) => HttpResponse::Ok().json(filters),
        Ok(Err(e)) => server_error("Failed to load default filters", &e),
        Err(e) => server_error("Failed to load default filters", &e),
    }
}

/// `POST /api/ingest?filename=<name>`
///
/// Ingests the raw request body as the named file.
pub async fn ingest(
    state: web::Data<AppState>,
    params: web::Query<IngestParams>,
    body: web::Bytes,
) -> HttpResponse {
    let Some(filename) = params
        .into_inner()
        .filename
        .filter(|name| !name.trim().is_empty())
    else {
        return validation_error("filename is required");
    };

    log::info!("Received upload {filename} ({} bytes)", body.len());

    let result = web::block(move || {
        let mut conn = state.lock_db();
        campus_kpi_ingest::ingest_file(&mut conn, &filename, &body, &state.ingest_config)
    })
    .await;

    match result {
        Ok(Ok(report)) => HttpResponse::Ok().json(ApiIngestResult::from(report)),
        Ok(Err(IngestError::Validation { message })) => {
            log::error!("Upload rejected: {message}");
            validation_error(&message)
        }
        Ok(Err(e)) => server_error("Failed to ingest upload", &e),
        Err(e) => server_error("Failed to ingest upload", &e),
    }
}

fn parse_params(params: &MetricQueryParams) -> Result<MetricQuery, FilterError> {
    campus_kpi_dashboard::parse_filters(params.year.as_deref(), params.department.as_deref())
}

fn invalid_parameter(e: &FilterError) -> HttpResponse {
    log::warn!("{e}");
    HttpResponse::BadRequest().json(ApiError::code("invalid_parameter"))
}

fn validation_error(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiError::with_message("validation_error", message))
}

fn server_error(context: &str, e: &dyn std::fmt::Display) -> HttpResponse {
    log::error!("{context}: {e}");
    HttpResponse::InternalServerError().json(ApiError::code("server_error"))
}
