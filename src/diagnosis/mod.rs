//! Fault diagnosis via an external text-generation service.
//!
//! The prompt template lives in `prompt`, the HTTPS client in `gemini`.
//! `request_diagnosis` folds every failure into `Diagnosis::Failed`, so a
//! lookup always has something to show; callers still branch on the variant
//! instead of comparing against the placeholder text.

pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;
pub use prompt::build_prompt;

use thiserror::Error;

use crate::wells::SensorRecord;

/// Text shown to users whenever no diagnosis could be generated.
pub const FAILURE_PLACEHOLDER: &str = "❌ Gemini analysis failed.";

#[derive(Error, Debug)]
pub enum DiagnosisError {
    #[error("Text generation is not configured")]
    NotConfigured,

    #[error("Cannot reach text-generation endpoint at {0}")]
    Connection(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Text-generation endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed response: {0}")]
    ResponseParsing(String),

    #[error("Response contained no candidate text")]
    EmptyResponse,
}

impl DiagnosisError {
    /// Short machine-readable label, safe to show to clients.
    pub fn kind(&self) -> &'static str {
        match self {
            DiagnosisError::NotConfigured => "not_configured",
            DiagnosisError::Connection(_) => "connection",
            DiagnosisError::HttpClient(_) => "http_client",
            DiagnosisError::Upstream { .. } => "upstream_status",
            DiagnosisError::ResponseParsing(_) => "malformed_response",
            DiagnosisError::EmptyResponse => "empty_response",
        }
    }
}

/// Generates free text for a prompt. Implemented by `GeminiClient`.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, DiagnosisError>;
}

/// Outcome of one diagnosis request. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnosis {
    Generated(String),
    /// `reason` is a `DiagnosisError::kind` label; details go to the log.
    Failed { reason: String },
}

impl Diagnosis {
    /// Text to display or embed in a report.
    pub fn text(&self) -> &str {
        match self {
            Diagnosis::Generated(text) => text,
            Diagnosis::Failed { .. } => FAILURE_PLACEHOLDER,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, Diagnosis::Generated(_))
    }
}

/// Build the prompt for `record` and submit it. Never returns an error.
pub fn request_diagnosis(generator: &dyn TextGenerator, record: &SensorRecord) -> Diagnosis {
    let prompt = build_prompt(record);
    match generator.generate(&prompt) {
        Ok(text) => {
            tracing::info!(well = %record.well_id, chars = text.chars().count(), "Diagnosis generated");
            Diagnosis::Generated(text)
        }
        Err(e) => {
            tracing::warn!(well = %record.well_id, error = %e, "Diagnosis failed");
            Diagnosis::Failed {
                reason: e.kind().to_string(),
            }
        }
    }
}

/// Returns a fixed response or a fixed error, and records the last prompt.
#[cfg(test)]
pub(crate) struct MockTextGenerator {
    response: Result<String, String>,
    pub last_prompt: std::sync::Mutex<Option<String>>,
}

#[cfg(test)]
impl MockTextGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            last_prompt: std::sync::Mutex::new(None),
        }
    }

    pub fn failing(detail: &str) -> Self {
        Self {
            response: Err(detail.to_string()),
            last_prompt: std::sync::Mutex::new(None),
        }
    }
}

#[cfg(test)]
impl TextGenerator for MockTextGenerator {
    fn generate(&self, prompt: &str) -> Result<String, DiagnosisError> {
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.response
            .clone()
            .map_err(DiagnosisError::HttpClient)
    }
}
