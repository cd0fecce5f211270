//! Request handlers
//!
//! - `auth`: login, logout and the session projection
//! - `catalog`: declarative forwarding operations
//! - `documents`: upload-and-send and the enriched tracking list

pub mod auth;
pub mod catalog;
pub mod documents;
