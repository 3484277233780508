// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP routes
//!
//! `/health` is open; everything under `/api/heat-to-target` needs the
//! service token, and `/api/esp32` needs the sensor key.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tub_adapters::{celsius_to_fahrenheit, ProbeReading, ReadingFileSource, TemperatureReading};
use tub_core::{
    CheckResult, Clock, ConfigError, InvalidTarget, StartResult, StatusReport, StopResult,
    SystemClock, TubConfig,
};
use tub_engine::ControlError;

use crate::auth::{require_token, TokenDigest};
use crate::control::HeatControl;

/// Shared state behind every route
pub struct AppState<H> {
    pub control: H,
    pub readings: ReadingFileSource<SystemClock>,
    pub config: TubConfig,
    pub start_time: Instant,
}

impl<H: HeatControl> AppState<H> {
    pub fn new(control: H, config: TubConfig) -> Self {
        let readings =
            ReadingFileSource::new(config.reading_path(), config.sensor.max_age, SystemClock);
        Self {
            control,
            readings,
            config,
            start_time: Instant::now(),
        }
    }
}

/// Errors surfaced to HTTP callers as `{"error": ...}`
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing or invalid credential")]
    Unauthorized,
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTarget),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidTarget(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ControlError> for ApiError {
    fn from(e: ControlError) -> Self {
        match e {
            ControlError::InvalidTarget(invalid) => ApiError::InvalidTarget(invalid),
            ControlError::Storage(e) => ApiError::Internal(format!("session store error: {e}")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

/// Build the router; fails without a service token
pub fn router<H: HeatControl>(state: Arc<AppState<H>>) -> Result<Router, ConfigError> {
    let api_token = TokenDigest::of(state.config.require_token()?);
    let esp32_key = state
        .config
        .esp32_key()
        .map(TokenDigest::of)
        .unwrap_or(api_token);

    let heat = Router::new()
        .route("/start", post(start::<H>))
        .route("/check", post(check::<H>))
        .route("/stop", post(stop::<H>))
        .route("/status", get(status::<H>))
        .route_layer(from_fn_with_state(api_token, require_token));

    let esp32 = Router::new()
        .route("/temperature", post(ingest_temperature::<H>))
        .route_layer(from_fn_with_state(esp32_key, require_token));

    Ok(Router::new()
        .route("/health", get(health::<H>))
        .nest("/api/heat-to-target", heat)
        .nest("/api/esp32", esp32)
        .with_state(state))
}

async fn health<H: HeatControl>(State(state): State<Arc<AppState<H>>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "tubd",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub target_temp_f: f64,
}

async fn start<H: HeatControl>(
    State(state): State<Arc<AppState<H>>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResult>, ApiError> {
    tracing::info!(target_temp_f = request.target_temp_f, "start requested");
    let result = state.control.start(request.target_temp_f).await?;
    Ok(Json(result))
}

async fn check<H: HeatControl>(State(state): State<Arc<AppState<H>>>) -> Json<CheckResult> {
    tracing::info!("check requested");
    Json(state.control.check().await)
}

async fn stop<H: HeatControl>(State(state): State<Arc<AppState<H>>>) -> Json<StopResult> {
    tracing::info!("stop requested");
    Json(state.control.stop().await)
}

async fn status<H: HeatControl>(State(state): State<Arc<AppState<H>>>) -> Json<StatusReport> {
    Json(state.control.status().await)
}

/// Report posted by the ESP32 sensor
#[derive(Debug, Clone, Deserialize)]
pub struct Esp32Report {
    pub device_id: String,
    #[serde(default)]
    pub temp_f: Option<f64>,
    #[serde(default)]
    pub temp_c: Option<f64>,
    #[serde(default)]
    pub sensors: Vec<ProbeReading>,
    #[serde(default)]
    pub uptime_seconds: Option<u64>,
}

impl Esp32Report {
    /// Normalize to a stored reading: °F wins, then °C, then the first probe
    pub fn into_reading(
        self,
        received_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<TemperatureReading, ApiError> {
        let temp_c = self
            .temp_c
            .or_else(|| self.sensors.first().map(|probe| probe.temp_c));
        let temp_f = match (self.temp_f, temp_c) {
            (Some(f), _) => f,
            (None, Some(c)) => celsius_to_fahrenheit(c),
            (None, None) => {
                return Err(ApiError::BadRequest(
                    "report carries no temperature".to_string(),
                ))
            }
        };
        if !temp_f.is_finite() {
            return Err(ApiError::BadRequest("temperature is not a number".to_string()));
        }
        Ok(TemperatureReading {
            device_id: self.device_id,
            temp_f,
            temp_c,
            sensors: self.sensors,
            uptime_seconds: self.uptime_seconds,
            received_at,
        })
    }
}

#[derive(Debug, Serialize)]
struct IngestResponse {
    status: &'static str,
    interval_seconds: u64,
}

async fn ingest_temperature<H: HeatControl>(
    State(state): State<Arc<AppState<H>>>,
    Json(report): Json<Esp32Report>,
) -> Result<Json<IngestResponse>, ApiError> {
    let reading = report.into_reading(SystemClock.now())?;
    state.readings.store(&reading).await.map_err(|e| {
        tracing::error!(error = %e, "failed to store temperature reading");
        ApiError::Internal(format!("failed to store reading: {e}"))
    })?;
    tracing::debug!(device = %reading.device_id, temp_f = reading.temp_f, "temperature reading stored");

    let heating = state.control.is_active().await;
    Ok(Json(IngestResponse {
        status: "ok",
        interval_seconds: state.config.report_interval(heating),
    }))
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
