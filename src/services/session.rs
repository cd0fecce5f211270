//! Session cookie codec
//!
//! The browser session is two cookies: `token` holds the upstream bearer token
//! verbatim, `user` holds the URL-encoded JSON `{ user, userRoles }`. They are
//! always written and cleared together.

use axum::{
    http::{header::SET_COOKIE, HeaderValue},
    response::{IntoResponse, IntoResponseParts, Redirect, Response, ResponseParts},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde_json::Value;
use std::convert::Infallible;

use crate::config::AppState;
use crate::models::Session;

/// Cookie holding the raw bearer token
pub const TOKEN_COOKIE: &str = "token";

/// Cookie holding the URL-encoded user payload
pub const USER_COOKIE: &str = "user";

/// Role name that unlocks the admin pages
pub const ADMIN_ROLE: &str = "Admin";

/// Keys never copied into the client-readable user cookie
const REDACTED_USER_KEYS: &[&str] = &["password", "passwordHash", "token", "refreshToken"];

/// Cookie attributes that depend on deployment
#[derive(Debug, Clone, Copy)]
pub struct CookieOptions {
    pub secure: bool,
    pub max_age_secs: i64,
    pub token_http_only: bool,
}

impl CookieOptions {
    pub fn from_state(state: &AppState) -> Self {
        Self {
            secure: state.secure_cookies(),
            max_age_secs: state.config.session.max_age_secs,
            token_http_only: state.config.session.token_http_only,
        }
    }
}

/// Decode the two raw cookie values into a session.
///
/// The user cookie is URL-decoded before parsing; if that fails the raw value
/// is parsed as-is, which tolerates clients that stored plain JSON.
pub fn decode(token: Option<&str>, user: Option<&str>) -> Option<Session> {
    let token = token.filter(|t| !t.is_empty())?;
    let raw = user.filter(|u| !u.is_empty())?;

    let decoded = urlencoding::decode(raw)
        .ok()
        .and_then(|s| serde_json::from_str::<Value>(&s).ok());

    let payload = match decoded {
        Some(value) => value,
        None => serde_json::from_str::<Value>(raw).ok()?,
    };

    Some(Session {
        token: token.to_string(),
        payload,
    })
}

/// Build the two session cookies for a successful login
pub fn encode(token: &str, payload: &Value, options: CookieOptions) -> [Cookie<'static>; 2] {
    let encoded_user = urlencoding::encode(&payload.to_string()).into_owned();
    let max_age = time::Duration::seconds(options.max_age_secs);

    let token_cookie = Cookie::build((TOKEN_COOKIE, token.to_string()))
        .path("/")
        .http_only(options.token_http_only)
        .secure(options.secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build();

    // Page scripts render the profile from this one
    let user_cookie = Cookie::build((USER_COOKIE, encoded_user))
        .path("/")
        .http_only(false)
        .secure(options.secure)
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build();

    [token_cookie, user_cookie]
}

/// Expire both session cookies
pub fn clear() -> [Cookie<'static>; 2] {
    [TOKEN_COOKIE, USER_COOKIE].map(|name| {
        Cookie::build((name, ""))
            .path("/")
            .same_site(SameSite::Lax)
            .max_age(time::Duration::ZERO)
            .expires(time::OffsetDateTime::UNIX_EPOCH)
            .build()
    })
}

/// Check the role list for the admin role.
///
/// Roles live at `userRoles` in the cookie shape and at `user.roles` when the
/// payload is the upstream login shape. Entries are role names or objects with
/// a `name`.
pub fn has_admin_role(payload: &Value) -> bool {
    let roles = payload
        .get("userRoles")
        .or_else(|| payload.get("user").and_then(|u| u.get("roles")));

    role_names(roles).any(|name| name == ADMIN_ROLE)
}

pub(crate) fn role_names(roles: Option<&Value>) -> impl Iterator<Item = &str> {
    roles
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|role| match role {
            Value::String(name) => Some(name.as_str()),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str),
            _ => None,
        })
}

/// Build the cookie payload from an upstream login response, dropping
/// credential-like fields from the user object.
pub fn cookie_payload(user: &Value, user_roles: &Value) -> Value {
    let mut user = user.clone();
    if let Some(obj) = user.as_object_mut() {
        for key in REDACTED_USER_KEYS {
            obj.remove(*key);
        }
    }

    serde_json::json!({
        "user": user,
        "userRoles": user_roles,
    })
}

/// Appends one `Set-Cookie` header per cookie
pub struct SetCookies(pub Vec<Cookie<'static>>);

impl IntoResponseParts for SetCookies {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        for cookie in self.0 {
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => tracing::warn!(cookie = cookie.name(), "Skipping unencodable cookie: {}", e),
            }
        }
        Ok(res)
    }
}

/// Logout responder: clear the session and send the browser to `target`.
///
/// Idempotent, it does not care whether a session existed.
pub fn logout_redirect(target: &str) -> Response {
    (SetCookies(clear().to_vec()), Redirect::to(target)).into_response()
}

/// Only same-site relative paths are accepted as post-logout destinations
pub fn is_safe_redirect(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}
