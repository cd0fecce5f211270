//! Data types shared by handlers and services

mod types;

pub use types::*;
