//! Well lookup endpoints.
//!
//! `GET /api/wells/:well_id` — sensor row plus a fresh diagnosis
//! `GET /api/wells/:well_id/chart.png` — 1×3 sensor bar chart

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;

use crate::analysis;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::diagnosis::Diagnosis;
use crate::session::SessionView;
use crate::wells::SensorRecord;

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub well_id: String,
    pub temperature: f64,
    pub pressure: f64,
    pub flow_rate: f64,
    pub vibration: f64,
    pub humidity: f64,
    pub fault_detected: String,
    pub suggested_action: String,
}

impl From<SensorRecord> for RecordResponse {
    fn from(r: SensorRecord) -> Self {
        Self {
            well_id: r.well_id,
            temperature: r.temperature,
            pressure: r.pressure,
            flow_rate: r.flow_rate,
            vibration: r.vibration,
            humidity: r.humidity,
            fault_detected: r.fault_detected,
            suggested_action: r.suggested_action,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiagnosisResponse {
    pub status: &'static str,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<Diagnosis> for DiagnosisResponse {
    fn from(d: Diagnosis) -> Self {
        let text = d.text().to_string();
        match d {
            Diagnosis::Generated(_) => Self {
                status: "generated",
                text,
                reason: None,
            },
            Diagnosis::Failed { reason } => Self {
                status: "failed",
                text,
                reason: Some(reason),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WellResponse {
    pub query: String,
    pub record: RecordResponse,
    pub diagnosis: DiagnosisResponse,
}

/// `GET /api/wells/:well_id`
pub async fn lookup(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionView>,
    Path(well_id): Path<String>,
) -> Result<Json<WellResponse>, ApiError> {
    let generator = ctx.generator.clone();
    let analysis = tokio::task::spawn_blocking(move || {
        analysis::analyze_well(&session.dataset, generator.as_ref(), &well_id)
    })
    .await??;

    Ok(Json(WellResponse {
        query: analysis.query,
        record: analysis.record.into(),
        diagnosis: analysis.diagnosis.into(),
    }))
}

/// `GET /api/wells/:well_id/chart.png`
pub async fn chart(
    Extension(session): Extension<SessionView>,
    Path(well_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let png = tokio::task::spawn_blocking(move || {
        analysis::chart_png(&session.dataset, &well_id)
    })
    .await??;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
