//! Report endpoints.
//!
//! `GET /api/wells/:well_id/report.pdf` — download the PDF report
//! `POST /api/wells/:well_id/report/email` — email the PDF report

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::analysis;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::session::SessionView;

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct EmailResponse {
    pub sent_to: String,
}

/// `GET /api/wells/:well_id/report.pdf`
pub async fn download(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionView>,
    Path(well_id): Path<String>,
) -> Result<Response, ApiError> {
    let generator = ctx.generator.clone();
    let font = ctx.font.clone();
    let report = tokio::task::spawn_blocking(move || {
        analysis::build_report(
            &session.dataset,
            generator.as_ref(),
            &font,
            &well_id,
            &Local::now(),
        )
    })
    .await??;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        report.filename
    ))
    .map_err(|e| ApiError::Internal(format!("content disposition: {e}")))?;

    let mut response = report.pdf.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/pdf"));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

/// `POST /api/wells/:well_id/report/email` — 202 once the mail is handed
/// to the transport.
pub async fn email(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionView>,
    Path(well_id): Path<String>,
    Json(request): Json<EmailRequest>,
) -> Result<(StatusCode, Json<EmailResponse>), ApiError> {
    let mailer = ctx.mailer.clone().ok_or(ApiError::DeliveryUnavailable)?;
    let generator = ctx.generator.clone();
    let font = ctx.font.clone();

    let sent_to = tokio::task::spawn_blocking(move || {
        analysis::email_report(
            &session.dataset,
            generator.as_ref(),
            &font,
            mailer.as_ref(),
            &well_id,
            &request.email,
        )
    })
    .await??;

    Ok((
        StatusCode::ACCEPTED,
        Json(EmailResponse {
            sent_to: sent_to.to_string(),
        }),
    ))
}
