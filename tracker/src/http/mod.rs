//! Resource manager HTTP client

pub mod client;
pub mod deployments;
pub mod poll;
