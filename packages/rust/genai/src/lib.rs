//! Generative-language API client.
//!
//! A thin `reqwest` wrapper around a Gemini-style REST API: media upload
//! plus `generateContent`. Model identifiers and prompt text are call
//! parameters, not part of any durable contract.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lectern_shared::{LecternError, Result};

/// Default API base. Tests override this with a mock server URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("Lectern/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the generative-language API.
#[derive(Debug, Clone)]
pub struct GenAiClient {
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl GenAiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LecternError::config("generative API key cannot be empty"));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| LecternError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http,
        })
    }

    /// Point the client at a different API base (mock servers in tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Upload a file to the media endpoint, returning a handle whose URI
    /// later `generate` calls can reference.
    pub async fn upload_file(
        &self,
        display_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<FileHandle> {
        let url = format!(
            "{}/upload/v1beta/files?key={}",
            self.base_url, self.api_key
        );

        debug!(display_name, mime_type, size = bytes.len(), "uploading file");

        let response = self
            .http
            .post(&url)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("X-Goog-File-Name", display_name)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| LecternError::Network(format!("file upload: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LecternError::Generation(format!(
                "file upload failed: HTTP {status}: {}",
                excerpt(&body)
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| LecternError::Generation(format!("invalid upload response: {e}")))?;

        info!(uri = %uploaded.file.uri, "file uploaded");
        Ok(FileHandle {
            uri: uploaded.file.uri,
            mime_type: mime_type.to_string(),
        })
    }

    /// Generate text from a sequence of parts (text and/or uploaded files).
    ///
    /// Returns the first candidate's text. Token usage is logged, not
    /// returned; callers that care can lower the log filter.
    pub async fn generate(&self, model: &str, parts: &[Part]) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: parts.iter().map(WirePart::from).collect(),
                role: Some("user".into()),
            }],
        };

        debug!(model, parts = parts.len(), "sending generate request");

        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LecternError::Network(format!("generate: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LecternError::Generation(format!(
                "generate failed: HTTP {status}: {}",
                excerpt(&body)
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LecternError::Generation(format!("invalid generate response: {e}")))?;

        let text = generated
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.clone())
            .ok_or_else(|| LecternError::Generation("empty response from model".into()))?;

        if let Some(usage) = &generated.usage_metadata {
            info!(
                model,
                tokens_in = usage.prompt_token_count.unwrap_or(0),
                tokens_out = usage.candidates_token_count.unwrap_or(0),
                "generation complete"
            );
        } else {
            info!(model, chars_out = text.len(), "generation complete");
        }

        Ok(text)
    }
}

/// Truncate an error body for log/error messages.
fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

// ---------------------------------------------------------------------------
// Request parts
// ---------------------------------------------------------------------------

/// A single piece of model input.
#[derive(Debug, Clone)]
pub enum Part {
    /// Inline prompt text.
    Text(String),
    /// A previously uploaded file.
    File(FileHandle),
}

impl Part {
    /// Convenience constructor for text parts.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

/// Handle to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub uri: String,
    pub mime_type: String,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<WirePart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
}

#[derive(Debug, Serialize)]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "file_data", skip_serializing_if = "Option::is_none")]
    file_data: Option<WireFileData>,
}

#[derive(Debug, Serialize)]
struct WireFileData {
    #[serde(rename = "file_uri")]
    file_uri: String,
    #[serde(rename = "mime_type")]
    mime_type: String,
}

impl From<&Part> for WirePart {
    fn from(part: &Part) -> Self {
        match part {
            Part::Text(text) => Self {
                text: Some(text.clone()),
                file_data: None,
            },
            Part::File(handle) => Self {
                text: None,
                file_data: Some(WireFileData {
                    file_uri: handle.uri.clone(),
                    mime_type: handle.mime_type.clone(),
                }),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    uri: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> GenAiClient {
        GenAiClient::new("test-key")
            .unwrap()
            .with_base_url(server.uri())
    }

    #[test]
    fn empty_api_key_rejected() {
        let err = GenAiClient::new("").unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn text_part_serializes_without_file_data() {
        let wire = WirePart::from(&Part::text("hello"));
        let json = serde_json::to_string(&wire).unwrap();
        assert_eq!(json, r#"{"text":"hello"}"#);
    }

    #[test]
    fn file_part_serializes_as_file_data() {
        let wire = WirePart::from(&Part::File(FileHandle {
            uri: "files/abc".into(),
            mime_type: "text/plain".into(),
        }));
        let json = serde_json::to_string(&wire).unwrap();
        assert!(json.contains(r#""file_uri":"files/abc""#));
        assert!(json.contains(r#""mime_type":"text/plain""#));
        assert!(!json.contains("\"text\""));
    }

    #[tokio::test]
    async fn generate_returns_candidate_text() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{
                    "candidates": [{
                        "content": {
                            "parts": [{"text": "<h1>1. Sorting</h1>"}],
                            "role": "model"
                        },
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": {
                        "promptTokenCount": 120,
                        "candidatesTokenCount": 40
                    }
                }"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let text = client
            .generate("gemini-2.0-flash", &[Part::text("summarize this")])
            .await
            .expect("generate");
        assert_eq!(text, "<h1>1. Sorting</h1>");
    }

    #[tokio::test]
    async fn generate_surfaces_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_string(r#"{"error": {"message": "quota exceeded"}}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .generate("gemini-2.0-flash", &[Part::text("hi")])
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("429"), "got: {msg}");
        assert!(msg.contains("quota exceeded"), "got: {msg}");
    }

    #[tokio::test]
    async fn generate_rejects_empty_candidates() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"candidates": []}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .generate("gemini-2.0-flash", &[Part::text("hi")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty response"));
    }

    #[tokio::test]
    async fn upload_file_returns_handle() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"file": {"name": "files/xyz", "uri": "https://api.example/files/xyz"}}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let handle = client
            .upload_file("transcript.txt", "text/plain", b"hello lecture".to_vec())
            .await
            .expect("upload");
        assert_eq!(handle.uri, "https://api.example/files/xyz");
        assert_eq!(handle.mime_type, "text/plain");
    }
}
