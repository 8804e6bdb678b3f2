//! PTZ Controller Module
//!
//! Per-device target position (h/v/z controls) and absolute moves

pub mod service;
pub mod types;

pub use service::PtzService;
pub use types::*;
