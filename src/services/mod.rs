//! Services module
//!
//! Session cookies, the upstream client and the forwarding pipeline.

pub mod forwarder;
pub mod session;
pub mod tracking;
pub mod upstream;

pub use forwarder::{forward, Operation};
pub use upstream::{UpstreamBody, UpstreamClient, UpstreamMethod, UpstreamRequest, UpstreamResponse};
