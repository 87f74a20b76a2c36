use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{DiagnosisError, TextGenerator};
use crate::config::GeminiConfig;

const TEMPERATURE: f32 = 0.7;
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 1024;

/// Longest upstream error body kept in logs and errors.
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Blocking HTTPS client for the Gemini `generateContent` API.
pub struct GeminiClient {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, DiagnosisError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DiagnosisError::HttpClient(e.to_string()))?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// `candidates[0].content.parts[0].text`
    fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
    }
}

impl TextGenerator for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, DiagnosisError> {
        let api_key = self.api_key.as_deref().ok_or(DiagnosisError::NotConfigured)?;

        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_k: TOP_K,
                top_p: TOP_P,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    DiagnosisError::Connection(self.endpoint.clone())
                } else if e.is_timeout() {
                    DiagnosisError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    DiagnosisError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body: String = response
                .text()
                .unwrap_or_default()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect();
            return Err(DiagnosisError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .map_err(|e| DiagnosisError::ResponseParsing(e.to_string()))?;

        parsed.into_first_text().ok_or(DiagnosisError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnosis::{request_diagnosis, FAILURE_PLACEHOLDER};
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};

    fn gemini_config(endpoint: String, api_key: Option<&str>) -> GeminiConfig {
        GeminiConfig {
            endpoint,
            api_key: api_key.map(str::to_string),
            timeout_secs: 5,
        }
    }

    /// Serve `router` on an ephemeral localhost port, return the base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    /// The blocking client owns a runtime of its own, so it is built, used
    /// and dropped off the async workers.
    async fn generate_blocking(config: GeminiConfig, prompt: &str) -> Result<String, DiagnosisError> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || GeminiClient::new(&config)?.generate(&prompt))
            .await
            .unwrap()
    }

    /// Echoes sampling parameters and prompt back as candidate text.
    async fn echo(headers: HeaderMap, Json(body): Json<serde_json::Value>) -> (StatusCode, Json<serde_json::Value>) {
        if headers.get("x-goog-api-key").map(|v| v.as_bytes()) != Some(b"test-key".as_slice()) {
            return (StatusCode::FORBIDDEN, Json(serde_json::json!({"error": "bad key"})));
        }
        let cfg = &body["generationConfig"];
        let text = format!(
            "{}|{}|{}|{}|{}",
            cfg["temperature"].as_f64().unwrap_or_default(),
            cfg["topK"],
            cfg["topP"].as_f64().unwrap_or_default(),
            cfg["maxOutputTokens"],
            body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default(),
        );
        (
            StatusCode::OK,
            Json(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": text}]}}]
            })),
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn success_returns_first_candidate_text() {
        let base = serve(Router::new().route("/generate", post(echo))).await;
        let config = gemini_config(format!("{base}/generate"), Some("test-key"));
        let text = generate_blocking(config, "Diagnose well 2 — température élevée").await.unwrap();
        let parts: Vec<&str> = text.split('|').collect();
        assert!((parts[0].parse::<f64>().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(parts[1], "40");
        assert!((parts[2].parse::<f64>().unwrap() - 0.95).abs() < 1e-6);
        assert_eq!(parts[3], "1024");
        assert_eq!(parts[4], "Diagnose well 2 — température élevée");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_200_status_is_upstream_error() {
        let base = serve(Router::new().route("/generate", post(echo))).await;
        let config = gemini_config(format!("{base}/generate"), Some("wrong-key"));
        let err = generate_blocking(config, "prompt").await.unwrap_err();
        assert!(matches!(err, DiagnosisError::Upstream { status: 403, .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_200_success_status_is_still_an_error() {
        let router = Router::new().route(
            "/generate",
            post(|| async {
                (
                    StatusCode::ACCEPTED,
                    Json(serde_json::json!({"candidates": [{"content": {"parts": [{"text": "x"}]}}]})),
                )
            }),
        );
        let base = serve(router).await;
        let config = gemini_config(format!("{base}/generate"), Some("k"));
        let err = generate_blocking(config, "prompt").await.unwrap_err();
        assert!(matches!(err, DiagnosisError::Upstream { status: 202, .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_candidates_is_empty_response() {
        let router = Router::new().route(
            "/generate",
            post(|| async { Json(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}})) }),
        );
        let base = serve(router).await;
        let config = gemini_config(format!("{base}/generate"), Some("k"));
        let err = generate_blocking(config, "prompt").await.unwrap_err();
        assert!(matches!(err, DiagnosisError::EmptyResponse));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_json_body_is_parse_error() {
        let router = Router::new().route("/generate", post(|| async { "not json" }));
        let base = serve(router).await;
        let config = gemini_config(format!("{base}/generate"), Some("k"));
        let err = generate_blocking(config, "prompt").await.unwrap_err();
        assert!(matches!(err, DiagnosisError::ResponseParsing(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn unreachable_endpoint_is_connection_error() {
        // Bind then drop to obtain a port with nothing listening.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = gemini_config(format!("http://{addr}/generate"), Some("k"));
        let err = generate_blocking(config, "prompt").await.unwrap_err();
        assert!(matches!(err, DiagnosisError::Connection(_)));
    }

    #[test]
    fn missing_api_key_fails_without_network() {
        let client = GeminiClient::new(&gemini_config("http://unused.invalid".into(), None)).unwrap();
        assert!(!client.is_configured());
        assert!(matches!(client.generate("prompt"), Err(DiagnosisError::NotConfigured)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn request_diagnosis_uses_placeholder_for_upstream_failure() {
        let router = Router::new().route(
            "/generate",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(router).await;
        let config = gemini_config(format!("{base}/generate"), Some("k"));
        let record = crate::wells::dataset::tests::sample_record();

        let diagnosis = tokio::task::spawn_blocking(move || {
            let client = GeminiClient::new(&config).unwrap();
            request_diagnosis(&client, &record)
        })
        .await
        .unwrap();
        assert_eq!(diagnosis.text(), FAILURE_PLACEHOLDER);
    }
}
