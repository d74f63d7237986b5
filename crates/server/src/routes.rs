use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use url::Url;

use webcrawl_core::types::ScanConfig;
use webcrawl_controller::stats::ScanReport;
use webcrawl_controller::Controller;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanParams {
    pub domain: String,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub detailed: bool,
    #[serde(default = "default_true")]
    pub include_links: bool,
}

fn default_max_pages() -> usize {
    50
}
fn default_max_depth() -> u32 {
    3
}
fn default_workers() -> usize {
    5
}
fn default_timeout() -> u64 {
    100
}
fn default_request_timeout() -> u64 {
    15
}
fn default_true() -> bool {
    true
}

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub scan_id: String,
    pub timestamp: String,
    pub domain: String,
    #[serde(flatten)]
    pub report: ScanReport,
    pub status: String,
}

pub async fn start_scan(
    State(state): State<AppState>,
    Query(params): Query<ScanParams>,
) -> Result<Json<ScanResponse>, ApiError> {
    let defaults = &state.config.scan_defaults;

    if params.domain.trim().is_empty() {
        return Err(ApiError::BadRequest("domain is required".into()));
    }
    if params.max_pages < 1 {
        return Err(ApiError::BadRequest("max_pages must be >= 1".into()));
    }
    if params.workers < 1 || params.workers > defaults.max_workers {
        return Err(ApiError::BadRequest(format!(
            "workers must be between 1 and {}",
            defaults.max_workers
        )));
    }
    if !(1..=3600).contains(&params.timeout) {
        return Err(ApiError::BadRequest("timeout must be between 1 and 3600".into()));
    }
    if !(1..=120).contains(&params.request_timeout) {
        return Err(ApiError::BadRequest(
            "request_timeout must be between 1 and 120".into(),
        ));
    }

    let seed_url = if params.domain.starts_with("http://") || params.domain.starts_with("https://")
    {
        params.domain.clone()
    } else {
        format!("https://{}", params.domain)
    };

    let parsed = Url::parse(&seed_url)
        .map_err(|e| ApiError::Internal(format!("could not parse seed url: {e}")))?;
    let base_host = parsed
        .host_str()
        .ok_or_else(|| ApiError::Internal("seed url has no host".to_string()))?
        .to_string();

    let scan_id = format!("scan-{}", uuid::Uuid::new_v4());

    let config = ScanConfig {
        scan_id: scan_id.clone(),
        seed_url: seed_url.clone(),
        base_host: base_host.clone(),
        max_pages: params.max_pages,
        max_depth: params.max_depth,
        num_workers: params.workers,
        global_deadline: Duration::from_secs(params.timeout),
        request_deadline: Duration::from_secs(params.request_timeout),
        queue_timeout: Duration::from_secs(defaults.queue_timeout_secs),
        grace_period: Duration::from_secs(defaults.grace_period_secs),
        min_delay: Duration::from_millis(defaults.min_delay_ms),
        max_delay: Duration::from_millis(defaults.max_delay_ms),
        detailed: params.detailed,
        include_links: params.include_links,
    };

    let controller = Controller::new(config)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    state
        .active_scans
        .insert(scan_id.clone(), controller.clone());
    info!(scan_id = %scan_id, domain = %base_host, "scan accepted");

    let report = controller.run().await;
    state.active_scans.remove(&scan_id);

    Ok(Json(ScanResponse {
        scan_id: scan_id.clone(),
        timestamp: chrono_now(),
        domain: base_host,
        status: report.scan_summary.completion_status.to_string(),
        report,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ControlBody {
    pub action: String,
}

pub async fn control_scan(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
    Json(body): Json<ControlBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let controller = state
        .active_scans
        .get(&scan_id)
        .ok_or_else(|| ApiError::NotFound(format!("no active scan {scan_id}")))?
        .clone();

    match body.action.as_str() {
        "pause" => controller.pause(),
        "resume" => controller.resume(),
        "stop" => controller.stop(),
        other => {
            warn!(scan_id = %scan_id, action = other, "unrecognized control action");
            return Err(ApiError::BadRequest(format!("unknown action: {other}")));
        }
    }

    Ok(Json(serde_json::json!({ "scan_id": scan_id, "action": body.action })))
}

pub async fn scan_progress(
    State(state): State<AppState>,
    Path(scan_id): Path<String>,
) -> Result<Json<webcrawl_core::types::ScanProgress>, ApiError> {
    let controller = state
        .active_scans
        .get(&scan_id)
        .ok_or_else(|| ApiError::NotFound(format!("no active scan {scan_id}")))?
        .clone();

    Ok(Json(controller.progress().await))
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub ready: bool,
    pub active_scans: usize,
    pub max_workers: usize,
    pub devices: Vec<&'static str>,
}

pub async fn server_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ready: true,
        active_scans: state.active_scans.len(),
        max_workers: state.config.scan_defaults.max_workers,
        devices: webcrawl_fetcher::device_catalogue()
            .iter()
            .map(|d| d.id)
            .collect(),
    })
}

fn chrono_now() -> String {
    chrono::Utc::now().to_rfc3339()
}
