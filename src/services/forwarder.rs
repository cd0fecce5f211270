//! Request Forwarder
//!
//! Every forwarding endpoint is a declarative [`Operation`]: where it lives,
//! what it requires, how it authenticates and how the upstream response is
//! shaped. [`forward`] runs one operation end to end:
//! auth -> collect params -> validate -> upstream call -> response mapping.

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Query},
    http::{
        header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, Request, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::config::AppState;
use crate::error::{AppError, AppResult};
use crate::metrics;
use crate::middleware::{bearer_token, session_from_headers};
use crate::services::session::has_admin_role;
use crate::services::upstream::{
    FormPart, UpstreamAuth, UpstreamBody, UpstreamClient, UpstreamMethod,
    UpstreamRequest, UpstreamResponse, UPSTREAM_FAILED,
};

/// Largest inbound body the gateway buffers (document uploads)
pub const MAX_UPLOAD_SIZE: usize = 25 * 1024 * 1024;

/// Query parameter names for the super user shared secret
pub const SUPER_USER_NAME_PARAM: &str = "suUserName";
pub const SUPER_USER_PASSWORD_PARAM: &str = "suPassword";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMethod {
    Get,
    Post,
}

/// Where parameters come from, or how they are sent upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Query,
    Multipart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Bearer token from the session cookie or `Authorization` header
    Required,
    /// Forward a token when one is present (external signers have none)
    Optional,
    /// Fixed API key, no user token
    ApiKey,
    /// Admin confirmed by the upstream, then the caller's bearer token plus
    /// the shared-secret query pair
    SuperUser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// 2xx required, answered with 200
    Ok,
    /// Upstream status returned as-is
    PassThrough,
    /// Always 200 with `{ valid }` for client errors
    Validity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Json,
    /// Download; `{field}` and `{date}` are substituted in the file name
    Binary { filename: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Passwords: forwarded byte for byte, never trimmed
    Secret,
    Numeric,
    OneOf(&'static [&'static str]),
    /// JSON object or array, also accepted as a JSON string (multipart)
    Json,
    Any,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forward {
    Same,
    As(&'static str),
    /// Validated but never sent upstream
    Skip,
}

/// One inbound parameter
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    /// Older spellings accepted for compatibility, normalised to `name`
    pub aliases: &'static [&'static str],
    pub kind: FieldKind,
    pub required: bool,
    pub forward: Forward,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            aliases: &[],
            kind,
            required: true,
            forward: Forward::Same,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn forward_as(mut self, upstream: &'static str) -> Self {
        self.forward = Forward::As(upstream);
        self
    }

    pub const fn local(mut self) -> Self {
        self.forward = Forward::Skip;
        self
    }

    fn upstream_name(&self) -> Option<&'static str> {
        match self.forward {
            Forward::Same => Some(self.name),
            Forward::As(name) => Some(name),
            Forward::Skip => None,
        }
    }

    fn matches(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }
}

/// Two fields that must carry the same value
#[derive(Debug, Clone, Copy)]
pub struct Confirm {
    pub field: &'static str,
    pub confirmation: &'static str,
    pub message: &'static str,
}

/// Declarative description of a forwarding endpoint
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub route: &'static str,
    pub route_method: RouteMethod,
    pub upstream_method: UpstreamMethod,
    pub upstream_path: &'static str,
    pub inbound: Encoding,
    pub outbound: Encoding,
    pub fields: &'static [Field],
    pub confirm: Option<Confirm>,
    /// Copy undeclared parameters upstream unchanged
    pub passthrough: bool,
    pub auth: AuthMode,
    pub unwrap_result: bool,
    pub status: StatusPolicy,
    pub response: ResponseMode,
}

impl Operation {
    /// GET with query parameters in and out
    pub const fn get(name: &'static str, route: &'static str, upstream_path: &'static str) -> Self {
        Self {
            name,
            route,
            route_method: RouteMethod::Get,
            upstream_method: UpstreamMethod::Get,
            upstream_path,
            inbound: Encoding::Query,
            outbound: Encoding::Query,
            fields: &[],
            confirm: None,
            passthrough: false,
            auth: AuthMode::Required,
            unwrap_result: false,
            status: StatusPolicy::Ok,
            response: ResponseMode::Json,
        }
    }

    /// POST with a JSON body in and out
    pub const fn post(name: &'static str, route: &'static str, upstream_path: &'static str) -> Self {
        Self {
            route_method: RouteMethod::Post,
            upstream_method: UpstreamMethod::Post,
            inbound: Encoding::Json,
            outbound: Encoding::Json,
            ..Self::get(name, route, upstream_path)
        }
    }

    pub const fn fields(mut self, fields: &'static [Field]) -> Self {
        self.fields = fields;
        self
    }

    pub const fn inbound(mut self, inbound: Encoding) -> Self {
        self.inbound = inbound;
        self
    }

    pub const fn outbound(mut self, outbound: Encoding) -> Self {
        self.outbound = outbound;
        self
    }

    pub const fn confirm(mut self, confirm: Confirm) -> Self {
        self.confirm = Some(confirm);
        self
    }

    pub const fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    pub const fn auth(mut self, auth: AuthMode) -> Self {
        self.auth = auth;
        self
    }

    pub const fn unwrap_result(mut self) -> Self {
        self.unwrap_result = true;
        self
    }

    pub const fn status(mut self, status: StatusPolicy) -> Self {
        self.status = status;
        self
    }

    pub const fn binary(mut self, filename: &'static str) -> Self {
        self.response = ResponseMode::Binary { filename };
        self
    }
}

/// File received in an inbound multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Inbound parameters, whatever encoding they arrived in
#[derive(Debug, Clone, Default)]
pub struct Params {
    pub values: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

impl Params {
    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            values,
            files: Vec::new(),
        }
    }

    /// First non-empty value under the field name or one of its aliases
    fn lookup(&self, field: &Field) -> Option<(&str, &Value)> {
        std::iter::once(field.name)
            .chain(field.aliases.iter().copied())
            .find_map(|key| {
                self.values
                    .get_key_value(key)
                    .filter(|(_, v)| !is_blank(v))
                    .map(|(k, v)| (k.as_str(), v))
            })
    }
}

/// Validated parameters, already renamed for the upstream
#[derive(Debug, Clone, Default)]
pub struct Validated {
    pub values: Map<String, Value>,
    pub files: Vec<UploadedFile>,
}

impl Validated {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.values.clone())
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), value_to_text(v)))
            .collect()
    }

    pub fn to_form(&self) -> Vec<FormPart> {
        let mut parts: Vec<FormPart> = self
            .values
            .iter()
            .map(|(k, v)| FormPart::Text {
                name: k.clone(),
                value: value_to_text(v),
            })
            .collect();

        parts.extend(self.files.iter().map(|f| FormPart::File {
            name: f.field.clone(),
            file_name: f.file_name.clone(),
            content_type: f.content_type.clone(),
            data: f.data.clone(),
        }));
        parts
    }

    /// Build the upstream request body for an encoding
    pub fn into_request(self, outbound: Encoding, request: UpstreamRequest) -> UpstreamRequest {
        match outbound {
            Encoding::Json => request.with_json(self.to_json()),
            Encoding::Query => {
                let mut query = self.to_query();
                query.extend(request.query.iter().cloned());
                UpstreamRequest { query, ..request }
            }
            Encoding::Multipart => request.with_multipart(self.to_form()),
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Text form of a JSON value for query strings and multipart fields
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn coerce(field: &Field, value: &Value) -> Result<Value, AppError> {
    let invalid = || AppError::invalid(format!("{} parametresi geçersiz", field.name));

    match field.kind {
        FieldKind::Text => match value {
            Value::String(s) => Ok(Value::String(s.trim().to_string())),
            Value::Number(_) | Value::Bool(_) => Ok(Value::String(value_to_text(value))),
            _ => Err(invalid()),
        },
        FieldKind::Secret => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(invalid()),
        },
        FieldKind::Numeric => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<i64>() {
                    Ok(Value::from(n))
                } else {
                    s.parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .and_then(serde_json::Number::from_f64)
                        .map(Value::Number)
                        .ok_or_else(invalid)
                }
            }
            _ => Err(invalid()),
        },
        FieldKind::OneOf(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(value.clone()),
            _ => Err(AppError::InvalidInput {
                message: format!("{} parametresi geçersiz", field.name),
                details: Some(json!({ "allowed": allowed })),
            }),
        },
        FieldKind::Json => match value {
            Value::Object(_) | Value::Array(_) => Ok(value.clone()),
            Value::String(s) => serde_json::from_str::<Value>(s)
                .ok()
                .filter(|v| v.is_object() || v.is_array())
                .ok_or_else(invalid),
            _ => Err(invalid()),
        },
        FieldKind::Any | FieldKind::File => Ok(value.clone()),
    }
}

/// Validate params against an operation's fields.
///
/// Every missing field is reported at once; malformed values and confirmation
/// mismatches are reported after that. Nothing here talks to the upstream.
pub fn validate(op: &Operation, params: &Params) -> AppResult<Validated> {
    let mut missing = Vec::new();
    let mut validated = Validated::default();

    for field in op.fields {
        if field.kind == FieldKind::File {
            let files: Vec<UploadedFile> = params
                .files
                .iter()
                .filter(|f| field.matches(&f.field))
                .map(|f| UploadedFile {
                    field: field.upstream_name().unwrap_or(field.name).to_string(),
                    ..f.clone()
                })
                .collect();
            if files.is_empty() && field.required {
                missing.push(field.name);
            }
            if field.upstream_name().is_some() {
                validated.files.extend(files);
            }
            continue;
        }

        match params.lookup(field) {
            None if field.required => missing.push(field.name),
            None => {}
            Some((key, value)) => {
                if key != field.name {
                    tracing::debug!(
                        operation = op.name,
                        alias = key,
                        canonical = field.name,
                        "Accepted aliased parameter"
                    );
                }
                let value = coerce(field, value)?;
                if let Some(upstream) = field.upstream_name() {
                    validated.values.insert(upstream.to_string(), value);
                }
            }
        }
    }

    match missing.as_slice() {
        [] => {}
        [only] => return Err(AppError::missing(only)),
        many => {
            return Err(AppError::InvalidInput {
                message: format!("Eksik parametreler: {}", many.join(", ")),
                details: Some(json!({ "missing": many })),
            })
        }
    }

    if let Some(confirm) = op.confirm {
        let value_of = |name: &str| {
            op.fields
                .iter()
                .find(|f| f.name == name)
                .and_then(|f| params.lookup(f))
                .map(|(_, v)| value_to_text(v))
        };
        if value_of(confirm.field) != value_of(confirm.confirmation) {
            return Err(AppError::invalid(confirm.message));
        }
    }

    if op.passthrough {
        for (key, value) in &params.values {
            let declared = op.fields.iter().any(|f| f.matches(key));
            if !declared && !validated.values.contains_key(key) {
                validated.values.insert(key.clone(), value.clone());
            }
        }
    }

    Ok(validated)
}

/// Request id set by the request-id layer, or a fresh one
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Resolve upstream credentials for an operation
pub async fn resolve_auth(
    op: &Operation,
    headers: &HeaderMap,
    state: &Arc<AppState>,
    request_id: &str,
) -> AppResult<UpstreamRequest> {
    match op.auth {
        AuthMode::Required => bearer_token(headers)
            .map(|token| UpstreamRequest::bearer(&token))
            .ok_or(AppError::Unauthenticated),
        AuthMode::Optional => Ok(bearer_token(headers)
            .map(|token| UpstreamRequest::bearer(&token))
            .unwrap_or_default()),
        AuthMode::ApiKey => {
            let key = state
                .config
                .upstream
                .public_pdf_api_key
                .clone()
                .ok_or_else(|| AppError::Config("upstream.public_pdf_api_key is not set".into()))?;
            Ok(UpstreamRequest {
                auth: UpstreamAuth::ApiKey(key),
                ..Default::default()
            })
        }
        AuthMode::SuperUser => {
            let token = bearer_token(headers).ok_or(AppError::Unauthenticated)?;
            // The user cookie is client-writable; it only short-circuits obvious non-admins
            let session = session_from_headers(headers).ok_or(AppError::Unauthenticated)?;
            if !session.is_admin() {
                return Err(AppError::Forbidden);
            }

            let upstream = &state.config.upstream;
            let (Some(name), Some(password)) =
                (upstream.super_user_name.clone(), upstream.super_user_password.clone())
            else {
                return Err(AppError::Config("super user credentials are not set".into()));
            };

            verify_admin(state, &token, request_id).await?;

            Ok(UpstreamRequest::bearer(&token).with_query(vec![
                (SUPER_USER_NAME_PARAM.to_string(), name),
                (SUPER_USER_PASSWORD_PARAM.to_string(), password),
            ]))
        }
    }
}

/// Ask the upstream who owns `token` and require the admin role there.
///
/// A rejected token surfaces as `SessionExpired`.
async fn verify_admin(state: &Arc<AppState>, token: &str, request_id: &str) -> AppResult<()> {
    let response = UpstreamClient::new(state.clone())
        .call(
            UpstreamMethod::Get,
            &state.config.upstream.current_user_path,
            UpstreamRequest::bearer(token),
            request_id,
        )
        .await?
        .into_success()?;

    let profile = response.payload(true);
    if has_admin_role(&profile) || has_admin_role(&json!({ "user": profile })) {
        Ok(())
    } else {
        tracing::warn!(request_id = %request_id, "Admin cookie not confirmed by upstream");
        Err(AppError::Forbidden)
    }
}

/// Read inbound parameters in the operation's encoding.
///
/// JSON bodies also pick up query string values they do not define.
pub async fn collect_params(
    req: Request<Body>,
    inbound: Encoding,
    state: &Arc<AppState>,
) -> AppResult<Params> {
    let query = Query::<Vec<(String, String)>>::try_from_uri(req.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    let mut params = Params::from_values(
        query
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect(),
    );

    match inbound {
        Encoding::Query => {}
        Encoding::Json => {
            let bytes = axum::body::to_bytes(req.into_body(), MAX_UPLOAD_SIZE)
                .await
                .map_err(|e| AppError::invalid(format!("İstek gövdesi okunamadı: {}", e)))?;
            if !bytes.iter().all(u8::is_ascii_whitespace) {
                match serde_json::from_slice::<Value>(&bytes) {
                    Ok(Value::Object(body)) => params.values.extend(body),
                    _ => return Err(AppError::invalid("İstek gövdesi geçerli bir JSON nesnesi değil")),
                }
            }
        }
        Encoding::Multipart => {
            let mut multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::invalid(format!("Form verisi okunamadı: {}", e)))?;

            while let Some(field) = multipart
                .next_field()
                .await
                .map_err(|e| AppError::invalid(format!("Form verisi okunamadı: {}", e)))?
            {
                let Some(name) = field.name().map(str::to_string) else {
                    continue;
                };
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::invalid(format!("{} okunamadı: {}", name, e)))?;

                match file_name {
                    Some(file_name) => params.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        data,
                    }),
                    None => {
                        let text = String::from_utf8_lossy(&data).into_owned();
                        params.values.insert(name, Value::String(text));
                    }
                }
            }
        }
    }

    Ok(params)
}

/// Run one operation end to end
pub async fn forward(
    state: Arc<AppState>,
    op: &'static Operation,
    req: Request<Body>,
) -> AppResult<Response> {
    let request_id = request_id(req.headers());

    let request = resolve_auth(op, req.headers(), &state, &request_id)
        .await
        .inspect_err(|e| {
            tracing::debug!(request_id = %request_id, operation = op.name, "Rejected: {}", e);
            metrics::record_rejection(op.name, "auth");
        })?;

    let params = collect_params(req, op.inbound, &state).await?;
    let validated = validate(op, &params).inspect_err(|e| {
        tracing::debug!(request_id = %request_id, operation = op.name, "Rejected: {}", e);
        metrics::record_rejection(op.name, "validation");
    })?;

    let request = validated.clone().into_request(op.outbound, request);
    let response = UpstreamClient::new(state.clone())
        .call(op.upstream_method, op.upstream_path, request, &request_id)
        .await?;

    tracing::info!(
        request_id = %request_id,
        operation = op.name,
        status = response.status.as_u16(),
        "Forwarded"
    );

    shape_response(op, response, &validated)
}

/// Map an upstream response to the browser response
pub fn shape_response(
    op: &Operation,
    response: UpstreamResponse,
    validated: &Validated,
) -> AppResult<Response> {
    if response.status == StatusCode::UNAUTHORIZED {
        return Err(AppError::SessionExpired);
    }

    match op.status {
        StatusPolicy::Ok => {
            let response = response.into_success()?;
            Ok(success_body(op, response, validated, StatusCode::OK))
        }
        StatusPolicy::PassThrough => {
            let status = response.status;
            if status.is_success() {
                Ok(success_body(op, response, validated, status))
            } else {
                let message = response
                    .body
                    .message()
                    .unwrap_or_else(|| UPSTREAM_FAILED.to_string());
                let body = json!({ "error": message, "details": response.body.to_json() });
                Ok((status, Json(body)).into_response())
            }
        }
        StatusPolicy::Validity => {
            if response.status.is_success() {
                let data = response.payload(op.unwrap_result);
                Ok(Json(json!({ "valid": true, "data": data })).into_response())
            } else if response.status.is_client_error() {
                let body = json!({
                    "valid": false,
                    "error": response.body.message().unwrap_or_else(|| UPSTREAM_FAILED.to_string()),
                    "details": response.body.to_json(),
                });
                Ok(Json(body).into_response())
            } else {
                Err(response.into_error())
            }
        }
    }
}

fn success_body(
    op: &Operation,
    response: UpstreamResponse,
    validated: &Validated,
    status: StatusCode,
) -> Response {
    match (&response.body, op.response) {
        (UpstreamBody::Binary { data, content_type }, mode) => {
            let filename = match mode {
                ResponseMode::Binary { filename } => render_filename(filename, validated),
                ResponseMode::Json => "download".to_string(),
            };
            (
                status,
                [
                    (CONTENT_TYPE, content_type.clone()),
                    (CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
                    (CACHE_CONTROL, "no-store".to_string()),
                ],
                data.clone(),
            )
                .into_response()
        }
        (UpstreamBody::Text(text), _) => {
            let body = if text.trim().is_empty() {
                json!({ "success": true })
            } else {
                json!({ "success": true, "data": text })
            };
            (status, Json(body)).into_response()
        }
        (UpstreamBody::Json(_), _) => (status, Json(response.payload(op.unwrap_result))).into_response(),
    }
}

/// Substitute `{field}` and `{date}` placeholders and keep the name header-safe
pub fn render_filename(template: &str, validated: &Validated) -> String {
    let mut name = template.replace("{date}", &chrono::Local::now().format("%Y-%m-%d").to_string());
    for (key, value) in &validated.values {
        name = name.replace(&format!("{{{}}}", key), &value_to_text(value));
    }

    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGN_FIELDS: &[Field] = &[
        Field::required("docGId", FieldKind::Numeric)
            .aliases(&["groupId", "docGroupId", "documentGroupId"]),
        Field::optional("note", FieldKind::Text),
    ];

    static SIGN: Operation =
        Operation::post("sign", "/api/documents/sign", "Document/Signature/Sign").fields(SIGN_FIELDS);

    const CHANGE_PASSWORD_FIELDS: &[Field] = &[
        Field::required("oldPas", FieldKind::Text).forward_as("oldPassword"),
        Field::required("newPas", FieldKind::Text).forward_as("newPassword"),
        Field::required("newPasAgain", FieldKind::Text).local(),
    ];

    static CHANGE_PASSWORD: Operation =
        Operation::post("change_password", "/api/auth/change-password", "UserAuth/User/ChangePassword")
            .fields(CHANGE_PASSWORD_FIELDS)
            .confirm(Confirm {
                field: "newPas",
                confirmation: "newPasAgain",
                message: "Şifreler eşleşmiyor",
            });

    const ANALYTICS_FIELDS: &[Field] = &[Field::required("period", FieldKind::OneOf(&["daily", "weekly"]))];

    static ANALYTICS: Operation =
        Operation::get("analytics", "/api/analytics", "Document/Analytics/Summary").fields(ANALYTICS_FIELDS);

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => Params::from_values(map),
            _ => unreachable!(),
        }
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::InvalidInput { message, .. } => message,
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate(&SIGN, &params(json!({ "note": "x" }))).unwrap_err();
        assert_eq!(message(err), "docGId parametresi eksik");

        let err = validate(&SIGN, &params(json!({ "docGId": "" }))).unwrap_err();
        assert_eq!(message(err), "docGId parametresi eksik");
    }

    #[test]
    fn test_alias_is_normalised() {
        let validated = validate(&SIGN, &params(json!({ "documentGroupId": "15" }))).unwrap();
        assert_eq!(validated.get("docGId"), Some(&json!(15)));
        assert!(validated.get("documentGroupId").is_none());
    }

    #[test]
    fn test_non_numeric_id_rejected() {
        let err = validate(&SIGN, &params(json!({ "docGId": "abc" }))).unwrap_err();
        assert_eq!(message(err), "docGId parametresi geçersiz");
    }

    #[test]
    fn test_password_confirmation() {
        let err = validate(
            &CHANGE_PASSWORD,
            &params(json!({ "oldPas": "a", "newPas": "b", "newPasAgain": "c" })),
        )
        .unwrap_err();
        assert_eq!(message(err), "Şifreler eşleşmiyor");

        let validated = validate(
            &CHANGE_PASSWORD,
            &params(json!({ "oldPas": "a", "newPas": "b", "newPasAgain": "b" })),
        )
        .unwrap();
        assert_eq!(validated.to_json(), json!({ "oldPassword": "a", "newPassword": "b" }));
    }

    #[test]
    fn test_several_missing_fields_listed() {
        match validate(&CHANGE_PASSWORD, &params(json!({ "oldPas": "a" }))).unwrap_err() {
            AppError::InvalidInput { message, details } => {
                assert_eq!(message, "Eksik parametreler: newPas, newPasAgain");
                assert_eq!(details, Some(json!({ "missing": ["newPas", "newPasAgain"] })));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_disallowed_enum_value() {
        let err = validate(&ANALYTICS, &params(json!({ "period": "hourly" }))).unwrap_err();
        assert_eq!(message(err), "period parametresi geçersiz");
        assert!(validate(&ANALYTICS, &params(json!({ "period": "weekly" }))).is_ok());
    }

    #[test]
    fn test_query_encoding_uses_text_values() {
        let validated = validate(&SIGN, &params(json!({ "docGId": 3, "note": "a b" }))).unwrap();
        let request = validated.into_request(Encoding::Query, UpstreamRequest::default());
        assert!(request.query.contains(&("docGId".to_string(), "3".to_string())));
        assert!(request.query.contains(&("note".to_string(), "a b".to_string())));
    }

    const SECRET_FIELDS: &[Field] = &[
        Field::required("newPas", FieldKind::Secret).forward_as("newPassword"),
        Field::required("newPasAgain", FieldKind::Secret).local(),
    ];

    static SET_PASSWORD: Operation =
        Operation::post("set_password", "/api/auth/reset-password", "UserAuth/User/ResetPassword")
            .fields(SECRET_FIELDS)
            .confirm(Confirm {
                field: "newPas",
                confirmation: "newPasAgain",
                message: "Şifreler eşleşmiyor",
            });

    #[test]
    fn test_secret_is_forwarded_verbatim() {
        let validated = validate(
            &SET_PASSWORD,
            &params(json!({ "newPas": " pw ", "newPasAgain": " pw " })),
        )
        .unwrap();
        assert_eq!(validated.to_json(), json!({ "newPassword": " pw " }));

        // Whitespace differences are real differences for a password
        let err = validate(
            &SET_PASSWORD,
            &params(json!({ "newPas": " pw ", "newPasAgain": "pw" })),
        )
        .unwrap_err();
        assert_eq!(message(err), "Şifreler eşleşmiyor");
    }

    const REGISTER_FIELDS: &[Field] = &[Field::required("email", FieldKind::Text)];

    static REGISTER: Operation =
        Operation::post("register", "/api/auth/register", "UserAuth/Registration/Create")
            .fields(REGISTER_FIELDS)
            .status(StatusPolicy::PassThrough);

    #[tokio::test]
    async fn test_pass_through_error_without_message() {
        let response = UpstreamResponse {
            status: StatusCode::CONFLICT,
            headers: HeaderMap::new(),
            body: UpstreamBody::Text(String::new()),
        };
        let shaped = shape_response(&REGISTER, response, &Validated::default()).unwrap();
        assert_eq!(shaped.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(shaped.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], json!(UPSTREAM_FAILED));
    }

    #[test]
    fn test_render_filename() {
        let validated = validate(&SIGN, &params(json!({ "docGId": 42 }))).unwrap();
        assert_eq!(render_filename("imzali-belge-{docGId}.pdf", &validated), "imzali-belge-42.pdf");
        assert_eq!(render_filename("a b\"c.pdf", &validated), "a_b_c.pdf");
    }
}
