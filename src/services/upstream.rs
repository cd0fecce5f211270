//! Upstream Client Service
//!
//! Handles communication with the upstream document/user/company API:
//! - Per-call authentication (bearer token, API key), never stored on the client
//! - Query, JSON and multipart request bodies
//! - Response classification into JSON, text or binary

use axum::http::StatusCode;
use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use serde_json::Value;
use std::sync::Arc;

use crate::config::AppState;
use crate::error::{AppError, AppResult};
use crate::metrics;

/// Maximum response size allowed (50MB)
pub const MAX_RESPONSE_SIZE: usize = 50 * 1024 * 1024;

/// Error text when a failed response carries no message of its own
pub const UPSTREAM_FAILED: &str = "Sunucu isteği başarısız oldu";

/// Header carrying the fixed key for the public PDF endpoint
pub const API_KEY_HEADER: &str = "x-api-key";

/// HTTP methods the upstream accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamMethod {
    Get,
    Post,
}

impl UpstreamMethod {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            UpstreamMethod::Get => reqwest::Method::GET,
            UpstreamMethod::Post => reqwest::Method::POST,
        }
    }
}

/// How a single call authenticates
#[derive(Debug, Clone, Default)]
pub enum UpstreamAuth {
    #[default]
    None,
    Bearer(String),
    ApiKey(String),
}

/// One part of an outbound multipart form
#[derive(Debug, Clone)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// Outbound request body
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    None,
    Json(Value),
    Multipart(Vec<FormPart>),
}

/// Everything a single upstream call needs besides method and path
#[derive(Debug, Clone, Default)]
pub struct UpstreamRequest {
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub auth: UpstreamAuth,
}

impl UpstreamRequest {
    pub fn bearer(token: &str) -> Self {
        Self {
            auth: UpstreamAuth::Bearer(token.to_string()),
            ..Default::default()
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }
}

/// Response body, classified once when it is read
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    Json(Value),
    /// Non-JSON text, e.g. a bare id or a diagnostic phrase
    Text(String),
    Binary { data: Bytes, content_type: String },
}

impl UpstreamBody {
    /// Classify a buffered body by content type, then by JSON parse success
    pub fn classify(content_type: Option<&str>, data: Bytes) -> Self {
        let textual = match content_type {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.starts_with("text/") || ct.contains("json") || ct.contains("xml")
            }
        };

        if !textual {
            return UpstreamBody::Binary {
                data,
                content_type: content_type.unwrap_or("application/octet-stream").to_string(),
            };
        }

        let text = String::from_utf8_lossy(&data).into_owned();
        match serde_json::from_str::<Value>(&text) {
            Ok(json) => UpstreamBody::Json(json),
            Err(_) => UpstreamBody::Text(text),
        }
    }

    /// The body as a JSON value; text becomes a JSON string
    pub fn to_json(&self) -> Value {
        match self {
            UpstreamBody::Json(value) => value.clone(),
            UpstreamBody::Text(text) if text.is_empty() => Value::Null,
            UpstreamBody::Text(text) => Value::String(text.clone()),
            UpstreamBody::Binary { .. } => Value::Null,
        }
    }

    /// Best-effort human readable message from an error body
    pub fn message(&self) -> Option<String> {
        match self {
            UpstreamBody::Json(value) => ["message", "error", "title", "detail"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str))
                .map(str::to_string)
                .or_else(|| value.as_str().map(str::to_string)),
            UpstreamBody::Text(text) => {
                let text = text.trim();
                (!text.is_empty()).then(|| text.to_string())
            }
            UpstreamBody::Binary { .. } => None,
        }
    }
}

/// Buffered upstream response
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    /// Apply the shared status policy.
    ///
    /// 401 means the upstream session is gone and maps to `SessionExpired`,
    /// which clears the browser cookies. Any other non-2xx status is surfaced
    /// with its body, never retried.
    pub fn into_success(self) -> AppResult<Self> {
        if self.status == StatusCode::UNAUTHORIZED {
            return Err(AppError::SessionExpired);
        }
        if !self.status.is_success() {
            return Err(self.into_error());
        }
        Ok(self)
    }

    pub fn into_error(self) -> AppError {
        let message = self
            .body
            .message()
            .unwrap_or_else(|| UPSTREAM_FAILED.to_string());
        AppError::Upstream {
            status: self.status.as_u16(),
            message,
            body: self.body.to_json(),
        }
    }

    /// JSON payload with an optional `result` envelope removed
    pub fn payload(&self, unwrap_result: bool) -> Value {
        let value = self.body.to_json();
        if unwrap_result {
            if let Value::Object(mut obj) = value {
                return match obj.remove("result") {
                    Some(result) => result,
                    None => Value::Object(obj),
                };
            }
        }
        value
    }
}

/// Client for the upstream API
pub struct UpstreamClient {
    state: Arc<AppState>,
}

impl UpstreamClient {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Absolute URL for an upstream path such as `Document/Template/List`
    pub fn url_for(&self, path: &str, query: &[(String, String)]) -> String {
        let base = self.state.config.upstream.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');

        if query.is_empty() {
            format!("{}/{}", base, path)
        } else {
            format!("{}/{}?{}", base, path, encode_query(query))
        }
    }

    /// Perform one call. Non-2xx statuses are returned, not raised; callers
    /// apply `UpstreamResponse::into_success`.
    pub async fn call(
        &self,
        method: UpstreamMethod,
        path: &str,
        request: UpstreamRequest,
        request_id: &str,
    ) -> AppResult<UpstreamResponse> {
        let url = self.url_for(path, &request.query);
        let service = path.trim_start_matches('/').split('/').next().unwrap_or("unknown");

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
        match &request.auth {
            UpstreamAuth::None => {}
            UpstreamAuth::Bearer(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| AppError::Unauthenticated)?;
                headers.insert(AUTHORIZATION, value);
            }
            UpstreamAuth::ApiKey(key) => {
                let value = HeaderValue::from_str(key)
                    .map_err(|_| AppError::Config("public_pdf_api_key is not a valid header value".into()))?;
                headers.insert(API_KEY_HEADER, value);
            }
        }

        let mut builder = self
            .state
            .http_client
            .request(method.as_reqwest(), &url)
            .headers(headers);

        let body_kind = match request.body {
            RequestBody::None => "none",
            RequestBody::Json(body) => {
                builder = builder.json(&body);
                "json"
            }
            RequestBody::Multipart(parts) => {
                builder = builder.multipart(build_form(parts)?);
                "multipart"
            }
        };

        tracing::debug!(
            request_id = %request_id,
            method = ?method,
            path = %path,
            body = body_kind,
            "[UPSTREAM-SEND] Sending to upstream"
        );

        let start = std::time::Instant::now();
        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    request_id = %request_id,
                    path = %path,
                    is_timeout = e.is_timeout(),
                    is_connect = e.is_connect(),
                    is_request = e.is_request(),
                    "[UPSTREAM-ERR] Request failed"
                );
                metrics::record_upstream_request(service, 0, start.elapsed().as_secs_f64());
                return Err(AppError::HttpClient(e.without_url()));
            }
        };

        let status = response.status();
        let response_headers = response.headers().clone();

        // Reject responses that are too large
        let content_length = response_headers
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<usize>().ok());
        if let Some(len) = content_length {
            if len > MAX_RESPONSE_SIZE {
                tracing::warn!(
                    request_id = %request_id,
                    content_length = len,
                    max_size = MAX_RESPONSE_SIZE,
                    "[UPSTREAM-ERR] Response too large"
                );
                return Err(AppError::ResponseTooLarge(format!(
                    "Response size {} bytes exceeds maximum allowed {} bytes",
                    len, MAX_RESPONSE_SIZE
                )));
            }
        }

        let content_type = response_headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let data = read_response_with_limit(response, MAX_RESPONSE_SIZE, request_id).await?;
        let elapsed = start.elapsed();

        tracing::debug!(
            request_id = %request_id,
            path = %path,
            status = status.as_u16(),
            elapsed_ms = elapsed.as_millis() as u64,
            body_size = data.len(),
            "[UPSTREAM-RECV] Response from upstream"
        );
        metrics::record_upstream_request(service, status.as_u16(), elapsed.as_secs_f64());

        Ok(UpstreamResponse {
            status,
            headers: response_headers,
            body: UpstreamBody::classify(content_type.as_deref(), data),
        })
    }
}

/// Query string with every key and value percent-encoded
pub fn encode_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn build_form(parts: Vec<FormPart>) -> AppResult<reqwest::multipart::Form> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name, value),
            FormPart::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                let mut file = reqwest::multipart::Part::bytes(data.to_vec()).file_name(file_name);
                if let Some(ct) = content_type {
                    file = file
                        .mime_str(&ct)
                        .map_err(|_| AppError::invalid(format!("{} dosya türü geçersiz", name)))?;
                }
                form.part(name, file)
            }
        };
    }
    Ok(form)
}

/// Read response body with size limit protection
async fn read_response_with_limit(
    response: reqwest::Response,
    max_size: usize,
    request_id: &str,
) -> AppResult<Bytes> {
    let mut stream = response.bytes_stream();
    let mut body = Vec::new();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(reqwest::Error::without_url)?;
        if body.len() + chunk.len() > max_size {
            tracing::warn!(
                request_id = %request_id,
                current_size = body.len(),
                chunk_size = chunk.len(),
                max_size = max_size,
                "[UPSTREAM-ERR] Response exceeded size limit while reading"
            );
            return Err(AppError::ResponseTooLarge(format!(
                "Response exceeded maximum size of {} bytes while reading",
                max_size
            )));
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(body))
}
