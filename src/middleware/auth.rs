//! Session extraction
//!
//! Reads the bearer token and the session cookies from inbound requests.

use axum::http::HeaderMap;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::models::Session;
use crate::services::session::{self, TOKEN_COOKIE, USER_COOKIE};

/// Read a cookie value from all `Cookie` headers
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all("cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name).then_some(value)
        })
}

/// Decode the session from the `token` and `user` cookies
pub fn session_from_headers(headers: &HeaderMap) -> Option<Session> {
    session::decode(
        cookie_value(headers, TOKEN_COOKIE),
        cookie_value(headers, USER_COOKIE),
    )
}

/// Resolve the bearer token: `token` cookie first, then `Authorization: Bearer`
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = cookie_value(headers, TOKEN_COOKIE).filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
        .filter(|t| !t.is_empty())
}
