//! API Routes
//!
//! Defines the `/api` surface:
//! - Auth endpoints with cookie handling (/api/auth/login, logout, session)
//! - Composite document endpoints (/api/documents/send, /api/documents/tracking)
//! - Every forwarding operation in the catalog

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, State},
    http::Request,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;

use crate::config::AppState;
use crate::handlers::{auth, catalog, documents};
use crate::services::forwarder::{forward, RouteMethod, MAX_UPLOAD_SIZE};
use crate::services::Operation;

/// Method router that runs one catalog operation
fn forward_route(op: &'static Operation) -> MethodRouter<Arc<AppState>> {
    let handler = move |State(state): State<Arc<AppState>>, req: Request<Body>| async move {
        forward(state, op, req).await
    };

    match op.route_method {
        RouteMethod::Get => get(handler),
        RouteMethod::Post => post(handler),
    }
}

/// Create the API router
pub fn create_router() -> Router<Arc<AppState>> {
    let router = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", get(auth::logout).post(auth::logout))
        .route("/api/auth/session", get(auth::get_session))
        .route("/api/documents/send", post(documents::upload_and_send))
        .route("/api/documents/tracking", get(documents::tracking_list));

    catalog::OPERATIONS
        .iter()
        .fold(router, |router, op| router.route(op.route, forward_route(*op)))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
}
