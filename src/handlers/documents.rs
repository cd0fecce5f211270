//! Document Handlers
//!
//! The two document operations that need more than one upstream call:
//! - upload-and-send: upload, then send the new group for signature
//! - tracking list: list, then join group metadata per distinct group

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppState;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::session_from_headers;
use crate::models::GroupMeta;
use crate::services::forwarder::{
    collect_params, request_id, resolve_auth, validate, Encoding, Field, FieldKind, Operation,
};
use crate::services::tracking;
use crate::services::{UpstreamBody, UpstreamClient, UpstreamMethod};

// ── Upload and send ───────────────────────────────────────────

const UPLOAD_FIELDS: &[Field] = &[
    Field::required("files", FieldKind::File).aliases(&["file"]),
    Field::optional("title", FieldKind::Text),
    Field::optional("description", FieldKind::Text),
];

/// First step: multipart upload answering with the new group id as bare text
pub static UPLOAD_DOCUMENTS: Operation = Operation::post(
    "upload_documents",
    "/api/documents/send",
    "Document/DocumentGroup/Upload",
)
.fields(UPLOAD_FIELDS)
.inbound(Encoding::Multipart)
.outbound(Encoding::Multipart);

const SEND_FIELDS: &[Field] = &[
    Field::required("signers", FieldKind::Json),
    Field::optional("message", FieldKind::Text),
    Field::optional("dueDate", FieldKind::Text),
    Field::optional("userId", FieldKind::Numeric).local(),
];

/// Second step: JSON send-for-signature keyed by group id and caller
pub static SEND_FOR_SIGNATURE: Operation = Operation::post(
    "send_for_signature",
    "/api/documents/send",
    "Document/DocumentGroup/SendForSignature",
)
.fields(SEND_FIELDS)
.inbound(Encoding::Multipart);

/// Read the group id out of the upload response (`"123"`, `123` or `123\n`)
fn parse_group_id(body: &UpstreamBody) -> Option<String> {
    let id = match body {
        UpstreamBody::Json(Value::Number(n)) => n.to_string(),
        UpstreamBody::Json(Value::String(s)) | UpstreamBody::Text(s) => s.trim().to_string(),
        UpstreamBody::Json(Value::Object(obj)) => obj
            .get("docGId")
            .or_else(|| obj.get("result"))
            .map(|v| match v {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })?,
        _ => return None,
    };

    (!id.is_empty() && !id.contains(char::is_whitespace) && id != "null").then_some(id)
}

/// Upload documents and send them for signature
///
/// POST /api/documents/send (multipart: files, signers, title?, message?, dueDate?)
///
/// Strictly sequential. If the upload fails its error is returned as-is and
/// nothing is sent. The sender is the session user; a form `userId` is only
/// accepted when it names that same user.
pub async fn upload_and_send(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
) -> AppResult<Response> {
    let request_id = request_id(req.headers());
    let auth = resolve_auth(&UPLOAD_DOCUMENTS, req.headers(), &state, &request_id).await?;
    let user_id = session_from_headers(req.headers())
        .and_then(|s| s.user_id())
        .ok_or(AppError::Unauthenticated)?;

    let params = collect_params(req, Encoding::Multipart, &state).await?;
    let upload = validate(&UPLOAD_DOCUMENTS, &params)?;
    let send = validate(&SEND_FOR_SIGNATURE, &params)?;

    if let Some(claimed) = params.values.get("userId").and_then(Value::as_str) {
        if claimed.trim() != user_id {
            tracing::warn!(request_id = %request_id, "userId does not match the session user");
            return Err(AppError::Forbidden);
        }
    }

    let client = UpstreamClient::new(state.clone());

    let uploaded = client
        .call(
            UPLOAD_DOCUMENTS.upstream_method,
            UPLOAD_DOCUMENTS.upstream_path,
            upload.into_request(Encoding::Multipart, auth.clone()),
            &request_id,
        )
        .await?
        .into_success()
        .inspect_err(|e| {
            tracing::warn!(request_id = %request_id, "Upload failed, not sending: {}", e);
        })?;

    let doc_gid = parse_group_id(&uploaded.body).ok_or_else(|| {
        AppError::Internal("Yükleme yanıtında belge grubu numarası bulunamadı".into())
    })?;
    tracing::info!(request_id = %request_id, doc_gid = %doc_gid, "Documents uploaded");

    let mut body = send.to_json();
    if let Some(obj) = body.as_object_mut() {
        obj.insert("docGId".to_string(), Value::String(doc_gid.clone()));
        obj.insert("userId".to_string(), Value::String(user_id));
    }

    let sent = client
        .call(
            SEND_FOR_SIGNATURE.upstream_method,
            SEND_FOR_SIGNATURE.upstream_path,
            auth.with_json(body),
            &request_id,
        )
        .await?
        .into_success()?;

    tracing::info!(request_id = %request_id, doc_gid = %doc_gid, "Sent for signature");

    Ok(Json(json!({
        "success": true,
        "docGId": doc_gid,
        "data": sent.payload(true),
    }))
    .into_response())
}

// ── Tracking list ─────────────────────────────────────────────

const TRACKING_LIST_FIELDS: &[Field] = &[
    Field::optional("period", FieldKind::OneOf(&["week", "month", "year", "all"])),
    Field::optional("status", FieldKind::Text),
    Field::optional("search", FieldKind::Text),
];

/// Primary list fetch
pub static TRACKING_LIST: Operation = Operation::get(
    "tracking_list",
    "/api/documents/tracking",
    "Document/DocumentGroup/TrackingList",
)
.fields(TRACKING_LIST_FIELDS)
.unwrap_result();

/// Per-group metadata lookup
pub const GROUP_INFO_PATH: &str = "Document/DocumentGroup/GetInfo";

/// Tracking list enriched with group name and description
///
/// GET /api/documents/tracking?period=month
pub async fn tracking_list(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
) -> AppResult<Response> {
    let request_id = request_id(req.headers());
    let auth = resolve_auth(&TRACKING_LIST, req.headers(), &state, &request_id)
        .await
        .inspect_err(|_| {
            metrics::record_rejection(TRACKING_LIST.name, "auth");
        })?;

    let params = collect_params(req, Encoding::Query, &state).await?;
    let validated = validate(&TRACKING_LIST, &params).inspect_err(|_| {
        metrics::record_rejection(TRACKING_LIST.name, "validation");
    })?;

    let client = UpstreamClient::new(state.clone());
    let listed = client
        .call(
            TRACKING_LIST.upstream_method,
            TRACKING_LIST.upstream_path,
            validated.into_request(Encoding::Query, auth.clone()),
            &request_id,
        )
        .await?
        .into_success()?;

    let items = match listed.payload(TRACKING_LIST.unwrap_result) {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("items") {
            Some(Value::Array(items)) => items,
            _ => return Err(AppError::Internal("Takip listesi beklenen biçimde değil".into())),
        },
        Value::Null => Vec::new(),
        _ => return Err(AppError::Internal("Takip listesi beklenen biçimde değil".into())),
    };

    let lookup = |id: String| {
        let client = &client;
        let auth = auth.clone();
        let request_id = request_id.as_str();
        async move {
            let request = auth.with_query(vec![("docGId".to_string(), id)]);
            let response = client
                .call(UpstreamMethod::Get, GROUP_INFO_PATH, request, request_id)
                .await?
                .into_success()?;
            Ok::<_, AppError>(GroupMeta::from_payload(&response.payload(true)))
        }
    };

    let count = items.len();
    let enriched = tracking::enrich(items, lookup).await?;
    tracing::info!(request_id = %request_id, items = count, "Tracking list enriched");

    Ok(Json(Value::Array(enriched)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group_id_shapes() {
        assert_eq!(parse_group_id(&UpstreamBody::Json(json!(123))).as_deref(), Some("123"));
        assert_eq!(parse_group_id(&UpstreamBody::Text("  77\n".into())).as_deref(), Some("77"));
        assert_eq!(
            parse_group_id(&UpstreamBody::Json(json!({ "result": 5 }))).as_deref(),
            Some("5")
        );
        assert_eq!(parse_group_id(&UpstreamBody::Text("Dosya yüklenemedi".into())), None);
        assert_eq!(parse_group_id(&UpstreamBody::Text(String::new())), None);
    }
}
