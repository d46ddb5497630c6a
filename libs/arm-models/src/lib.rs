//! Resource manager deployment models
//!
//! Serde wire types for the deployments and deployment operations endpoints.

pub mod models;

pub use models::*;
