//! Deployment tracker library
//!
//! Polls resource manager template deployments, expands nested deployments
//! and reports every operation as it appears or changes state.

pub mod app;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod storage;
pub mod track;
pub mod utils;
