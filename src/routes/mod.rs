//! Router assembly
//!
//! - `/api/*`: auth, composite document endpoints and the forwarding catalog
//! - `/health`, `/ready`, `/live`, `/metrics`
//! - everything else: static pages behind the session guard

pub mod api;
pub mod health;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Method, Request},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppState;
use crate::metrics::metrics_handler;
use crate::middleware::session_guard;

/// CORS for the app's own origin; cookies require credentials
fn cors_layer(state: &AppState) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
        .allow_credentials(true);

    match HeaderValue::from_str(state.config.server.public_url.trim_end_matches('/')) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!("server.public_url is not a valid origin, CORS disabled");
            cors
        }
    }
}

/// Last segment looks like a file name rather than a page route
fn looks_like_file(path: &str) -> bool {
    path.rsplit('/')
        .next()
        .is_some_and(|last| last.contains('.') && !last.starts_with('.'))
}

/// Static files, else the page shell. Missing file-like paths are a plain 404
/// and never get the shell.
async fn page_fallback(State(state): State<Arc<AppState>>, req: Request<Body>) -> Response {
    let static_dir = Path::new(&state.config.server.static_dir);
    let files = ServeDir::new(static_dir);

    let served = if looks_like_file(req.uri().path()) {
        files.oneshot(req).await.map(IntoResponse::into_response)
    } else {
        files
            .fallback(ServeFile::new(static_dir.join("index.html")))
            .oneshot(req)
            .await
            .map(IntoResponse::into_response)
    };

    match served {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// Build the full application
pub fn app(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/live", get(health::liveness_check))
        .route("/metrics", get(metrics_handler))
        .merge(api::create_router())
        .fallback(page_fallback)
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), session_guard))
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer(&state))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_like_paths() {
        assert!(looks_like_file("/assets/app.js"));
        assert!(looks_like_file("/tr/admin/registrations.x"));
        assert!(!looks_like_file("/tr/admin/registrations"));
        assert!(!looks_like_file("/.well-known"));
        assert!(!looks_like_file("/"));
    }
}
