//! One well analysis, end to end: resolve the row, then chart, diagnosis,
//! report and optional email. Everything here is blocking; the API layer
//! runs it on the blocking pool.

use chrono::{DateTime, Local};
use lettre::Address;
use thiserror::Error;

use crate::chart::{self, ChartError};
use crate::delivery::{self, DeliveryError, ReportMailer};
use crate::diagnosis::{request_diagnosis, Diagnosis, TextGenerator};
use crate::report::{self, ReportError, ReportFont};
use crate::wells::{normalize_well_id, Dataset, SensorRecord};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Well not found: {query}")]
    WellNotFound { query: String },

    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Lookup result with a fresh diagnosis.
#[derive(Debug, Clone)]
pub struct WellAnalysis {
    pub query: String,
    pub record: SensorRecord,
    pub diagnosis: Diagnosis,
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub filename: String,
    pub pdf: Vec<u8>,
}

pub fn find_well(dataset: &Dataset, query: &str) -> Result<SensorRecord, AnalysisError> {
    match dataset.resolve(query) {
        Some(record) => Ok(record.clone()),
        None => {
            tracing::warn!(query = %query, key = %normalize_well_id(query), "Well not found");
            Err(AnalysisError::WellNotFound {
                query: query.to_string(),
            })
        }
    }
}

pub fn analyze_well(
    dataset: &Dataset,
    generator: &dyn TextGenerator,
    query: &str,
) -> Result<WellAnalysis, AnalysisError> {
    let record = find_well(dataset, query)?;
    let diagnosis = request_diagnosis(generator, &record);
    Ok(WellAnalysis {
        query: query.to_string(),
        record,
        diagnosis,
    })
}

pub fn chart_png(dataset: &Dataset, query: &str) -> Result<Vec<u8>, AnalysisError> {
    let record = find_well(dataset, query)?;
    let png = chart::render_sensor_chart(&record)?.to_png()?;
    Ok(png)
}

pub fn build_report(
    dataset: &Dataset,
    generator: &dyn TextGenerator,
    font: &ReportFont,
    query: &str,
    now: &DateTime<Local>,
) -> Result<GeneratedReport, AnalysisError> {
    let analysis = analyze_well(dataset, generator, query)?;
    let chart = chart::render_sensor_chart(&analysis.record)?;
    let layout = report::compose(&analysis.record, analysis.diagnosis.text(), &chart);
    let pdf = report::render_pdf(&layout, &chart, font)?;
    tracing::info!(
        well = %analysis.record.well_id,
        pages = layout.pages.len(),
        bytes = pdf.len(),
        "Report generated"
    );
    Ok(GeneratedReport {
        filename: report::report_filename(query, now),
        pdf,
    })
}

/// Build the report for `query` and email it to `recipient`. The recipient
/// is validated before any work is done.
pub fn email_report(
    dataset: &Dataset,
    generator: &dyn TextGenerator,
    font: &ReportFont,
    mailer: &dyn ReportMailer,
    query: &str,
    recipient: &str,
) -> Result<Address, AnalysisError> {
    delivery::parse_recipient(recipient)?;
    let report = build_report(dataset, generator, font, query, &Local::now())?;
    let to = delivery::deliver_report(mailer, recipient, &report.pdf)?;
    Ok(to)
}
