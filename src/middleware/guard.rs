//! Session Guard
//!
//! Edge middleware for page routes. Evaluated once per request:
//! 1. static assets (known prefixes or real files) and public pages pass through
//! 2. no session: clear cookies and redirect to the login page (unless already there)
//! 3. session on the login page: redirect to the dashboard
//! 4. admin prefix without the admin role: redirect to the dashboard
//! 5. everything else passes through

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{AppState, RoutingConfig};
use crate::metrics;
use crate::middleware::auth::session_from_headers;
use crate::models::Session;
use crate::services::session::{self, SetCookies};

/// Operations endpoints, matched exactly
const OPERATIONS_PATHS: &[&str] = &["/health", "/ready", "/live", "/metrics"];

/// API routes enforce auth per operation
const API_PREFIX: &str = "/api";

/// Static asset prefixes
const STATIC_PREFIXES: &[&str] = &["/_next/", "/static/", "/assets/", "/images/", "/fonts/"];

/// Outcome of the guard for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    /// Clear cookies and go to `/{locale}/login`
    RedirectToLogin(String),
    /// Go to `/{locale}/dashboard`
    RedirectToDashboard(String),
}

/// Split the locale segment off a path.
///
/// Returns `(locale, logical_path)`. Unknown first segments mean the default
/// locale and the whole path is logical.
pub fn resolve_locale<'a>(path: &'a str, routing: &'a RoutingConfig) -> (&'a str, &'a str) {
    let trimmed = path.trim_start_matches('/');
    let (first, rest) = match trimmed.find('/') {
        Some(idx) => (&trimmed[..idx], &trimmed[idx..]),
        None => (trimmed, ""),
    };

    match routing.locales.iter().find(|l| l.as_str() == first) {
        Some(locale) => (locale.as_str(), if rest.is_empty() { "/" } else { rest }),
        None => (routing.default_locale.as_str(), if path.is_empty() { "/" } else { path }),
    }
}

/// `prefix` matches `path` exactly or as a whole leading segment
fn has_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    path == prefix || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

/// Requests the page guard never sees
pub fn is_non_page(path: &str) -> bool {
    OPERATIONS_PATHS.contains(&path) || has_prefix(path, API_PREFIX)
}

fn is_static_asset(path: &str) -> bool {
    STATIC_PREFIXES.iter().any(|p| path.starts_with(p)) || path == "/favicon.ico"
}

/// A regular file under `static_dir` that the page fallback would serve as-is
pub async fn is_existing_asset(static_dir: &Path, path: &str) -> bool {
    let Ok(decoded) = urlencoding::decode(path) else {
        return false;
    };
    let relative = decoded.trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|seg| seg == ".." || seg.contains('\\')) {
        return false;
    }

    tokio::fs::metadata(static_dir.join(relative))
        .await
        .is_ok_and(|meta| meta.is_file())
}

/// Decide what happens to a page request
pub fn evaluate(path: &str, session: Option<&Session>, routing: &RoutingConfig) -> GuardDecision {
    if is_static_asset(path) {
        return GuardDecision::Allow;
    }

    let (locale, logical) = resolve_locale(path, routing);

    if routing.public_paths.iter().any(|p| has_prefix(logical, p)) {
        return GuardDecision::Allow;
    }

    let on_login = has_prefix(logical, &routing.login_path);

    match session {
        None if on_login => GuardDecision::Allow,
        None => GuardDecision::RedirectToLogin(locale.to_string()),
        Some(_) if on_login => GuardDecision::RedirectToDashboard(locale.to_string()),
        Some(session) if has_prefix(logical, &routing.admin_prefix) && !session.is_admin() => {
            GuardDecision::RedirectToDashboard(locale.to_string())
        }
        Some(_) => GuardDecision::Allow,
    }
}

/// Session guard middleware for page routes
pub async fn session_guard(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    if is_non_page(&path) {
        return next.run(req).await;
    }
    if is_existing_asset(Path::new(&state.config.server.static_dir), &path).await {
        metrics::record_guard_decision("asset");
        return next.run(req).await;
    }

    let routing = &state.config.routing;
    let session = session_from_headers(req.headers());

    match evaluate(&path, session.as_ref(), routing) {
        GuardDecision::Allow => {
            metrics::record_guard_decision("allow");
            next.run(req).await
        }
        GuardDecision::RedirectToLogin(locale) => {
            metrics::record_guard_decision("login");
            tracing::debug!(path = %path, "No session, redirecting to login");
            let target = format!("/{}{}", locale, routing.login_path);
            (SetCookies(session::clear().to_vec()), Redirect::temporary(&target)).into_response()
        }
        GuardDecision::RedirectToDashboard(locale) => {
            metrics::record_guard_decision("dashboard");
            tracing::debug!(path = %path, "Redirecting to dashboard");
            let target = format!("/{}{}", locale, routing.dashboard_path);
            Redirect::temporary(&target).into_response()
        }
    }
}
