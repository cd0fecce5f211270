//! Error types and handling for the SignDesk Gateway
//!
//! Provides a unified error type that converts to the JSON error envelope
//! `{ "error": ..., "details": ... }` returned to the browser.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::services::session::{self, SetCookies};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Session expired")]
    SessionExpired,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid input: {message}")]
    InvalidInput {
        message: String,
        details: Option<Value>,
    },

    #[error("Upstream error: {status} - {message}")]
    Upstream {
        status: u16,
        message: String,
        body: Value,
    },

    #[error("Response too large: {0}")]
    ResponseTooLarge(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput {
            message: message.into(),
            details: None,
        }
    }

    /// Missing required parameter, named the way the browser sent it
    pub fn missing(field: &str) -> Self {
        Self::invalid(format!("{} parametresi eksik", field))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, details) = match self {
            AppError::Unauthenticated => {
                let body = Json(json!({ "error": "Oturum bulunamadı, lütfen giriş yapın" }));
                return (
                    StatusCode::UNAUTHORIZED,
                    SetCookies(session::clear().to_vec()),
                    body,
                )
                    .into_response();
            }
            AppError::SessionExpired => {
                tracing::info!("Upstream rejected the session, clearing cookies");
                let body = Json(json!({ "error": "Oturumunuzun süresi doldu, lütfen tekrar giriş yapın" }));
                return (
                    StatusCode::UNAUTHORIZED,
                    SetCookies(session::clear().to_vec()),
                    body,
                )
                    .into_response();
            }
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Bu işlem için yetkiniz yok".to_string(),
                None,
            ),
            AppError::InvalidInput { message, details } => {
                (StatusCode::BAD_REQUEST, message, details)
            }
            AppError::Upstream {
                status,
                message,
                body,
            } => {
                let status_code = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY);
                let details = if body.is_null() { None } else { Some(body) };
                (status_code, message, details)
            }
            AppError::ResponseTooLarge(msg) => {
                tracing::error!("Upstream response too large: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Sunucu yanıtı çok büyük".to_string(),
                    None,
                )
            }
            AppError::HttpClient(e) => {
                // The URL may carry shared-secret query parameters
                tracing::error!("HTTP client error: {}", e.without_url());
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Sunucuya ulaşılamadı".to_string(),
                    None,
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Sunucu yanıtı işlenemedi".to_string(),
                    None,
                )
            }
            AppError::Config(msg) => {
                tracing::error!("Config error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Sunucu yapılandırma hatası".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg, None)
            }
        };

        let body = match details {
            Some(details) => json!({ "error": message, "details": details }),
            None => json!({ "error": message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::SET_COOKIE;

    #[test]
    fn test_missing_field_message() {
        match AppError::missing("docGId") {
            AppError::InvalidInput { message, .. } => {
                assert_eq!(message, "docGId parametresi eksik")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_session_expired_clears_both_cookies() {
        let response = AppError::SessionExpired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let cookies: Vec<_> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect();
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().any(|c| c.starts_with("token=;")));
        assert!(cookies.iter().any(|c| c.starts_with("user=;")));
        assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
    }

    #[test]
    fn test_upstream_status_is_passed_through() {
        let response = AppError::Upstream {
            status: 409,
            message: "Kayıt zaten var".to_string(),
            body: json!({ "message": "Kayıt zaten var" }),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
