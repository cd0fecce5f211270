//! Middleware module for the SignDesk Gateway
//!
//! Contains session extraction helpers and the page session guard.

pub mod auth;
pub mod guard;

pub use auth::{bearer_token, cookie_value, session_from_headers};
pub use guard::{evaluate, resolve_locale, session_guard, GuardDecision};
