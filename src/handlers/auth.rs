//! Auth Handlers
//!
//! Login, logout and the current session projection. These shape cookies, so
//! they are written out instead of living in the forwarding catalog.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppState;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::session_from_headers;
use crate::models::{LoginRequest, LogoutQuery, SessionInfo};
use crate::services::forwarder::request_id;
use crate::services::session::{self, CookieOptions, SetCookies};
use crate::services::{UpstreamClient, UpstreamMethod, UpstreamRequest};

const LOGIN_PATH: &str = "UserAuth/User/Login";

/// Handle login
///
/// POST /api/auth/login `{ email, password }`
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> AppResult<Response> {
    let request_id = request_id(&headers);

    let email = body
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::missing("email"))?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::missing("password"))?;

    tracing::info!(request_id = %request_id, "Login request");

    let request = UpstreamRequest::default().with_json(json!({
        "email": email,
        "password": password,
    }));
    let response = UpstreamClient::new(state.clone())
        .call(UpstreamMethod::Post, LOGIN_PATH, request, &request_id)
        .await?;

    if !response.status.is_success() {
        metrics::record_login(false);
        let status = response.status.as_u16();
        tracing::info!(request_id = %request_id, status, "Login rejected by upstream");
        // A 401 here is bad credentials, not an expired session
        return Err(AppError::Upstream {
            status,
            message: response
                .body
                .message()
                .unwrap_or_else(|| "E-posta veya şifre hatalı".to_string()),
            body: response.body.to_json(),
        });
    }

    let payload = response.payload(true);
    let token = payload
        .get("token")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Internal("Login response did not contain a token".into()))?;
    let user = payload.get("user").cloned().unwrap_or(Value::Null);
    let user_roles = payload
        .get("userRoles")
        .or_else(|| user.get("userRoles"))
        .or_else(|| user.get("roles"))
        .cloned()
        .unwrap_or_else(|| json!([]));

    let cookie_payload = session::cookie_payload(&user, &user_roles);
    let cookies = session::encode(token, &cookie_payload, CookieOptions::from_state(&state));

    metrics::record_login(true);
    tracing::info!(request_id = %request_id, "Login succeeded");

    Ok((
        SetCookies(cookies.to_vec()),
        Json(json!({ "user": cookie_payload["user"] })),
    )
        .into_response())
}

/// Logout responder
///
/// GET|POST /api/auth/logout?locale=en&redirect=/en/login
///
/// Clears both cookies whether or not a session exists.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogoutQuery>,
) -> Response {
    let routing = &state.config.routing;
    let locale = query
        .locale
        .filter(|l| routing.locales.contains(l))
        .unwrap_or_else(|| routing.default_locale.clone());

    let target = query
        .redirect
        .filter(|r| session::is_safe_redirect(r))
        .unwrap_or_else(|| format!("/{}{}", locale, routing.login_path));

    tracing::debug!(target = %target, "Logout");
    session::logout_redirect(&target)
}

/// Current session projection
///
/// GET /api/auth/session
pub async fn get_session(headers: HeaderMap) -> AppResult<Response> {
    let session = session_from_headers(&headers).ok_or(AppError::Unauthenticated)?;

    let info = SessionInfo {
        user: session.user().clone(),
        user_roles: session.roles(),
        is_admin: session.is_admin(),
    };
    Ok((StatusCode::OK, Json(info)).into_response())
}
