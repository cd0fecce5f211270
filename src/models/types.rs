//! Data types for the SignDesk Gateway
//!
//! Defines the browser session and the request/response bodies the gateway
//! owns itself. Forwarded payloads stay as `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::services::session::{has_admin_role, role_names};

/// Browser session decoded from the `token` and `user` cookies
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Upstream bearer token
    pub token: String,
    /// Decoded user cookie, `{ user: {...}, userRoles: [...] }`
    pub payload: Value,
}

impl Session {
    /// The profile object, or the whole payload for flat cookie shapes
    pub fn user(&self) -> &Value {
        self.payload.get("user").unwrap_or(&self.payload)
    }

    /// Upstream user id as a string (ids arrive as numbers or strings)
    pub fn user_id(&self) -> Option<String> {
        match self.user().get("id")? {
            Value::String(id) if !id.is_empty() => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    pub fn roles(&self) -> Vec<String> {
        let roles = self
            .payload
            .get("userRoles")
            .or_else(|| self.user().get("roles"));
        role_names(roles).map(str::to_string).collect()
    }

    pub fn is_admin(&self) -> bool {
        has_admin_role(&self.payload)
    }
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Logout query parameters
#[derive(Debug, Default, Deserialize)]
pub struct LogoutQuery {
    pub locale: Option<String>,
    pub redirect: Option<String>,
}

/// Session info response (current user projection)
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: Value,
    #[serde(rename = "userRoles")]
    pub user_roles: Vec<String>,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub upstream: String,
}

/// Document group metadata joined onto tracking list items
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMeta {
    pub name: Value,
    pub description: Value,
}

impl GroupMeta {
    /// Read `name`/`description`, accepting the `groupName`/`groupDescription`
    /// spelling some upstream responses use
    pub fn from_payload(payload: &Value) -> Self {
        let pick = |primary: &str, secondary: &str| {
            payload
                .get(primary)
                .or_else(|| payload.get(secondary))
                .cloned()
                .unwrap_or(Value::Null)
        };

        Self {
            name: pick("name", "groupName"),
            description: pick("description", "groupDescription"),
        }
    }
}
