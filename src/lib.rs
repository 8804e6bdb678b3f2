//! Imou Control Library
//!
//! Control surface for Imou cloud cameras through the vendor Open API
//!
//! ## Architecture (8 Components)
//!
//! 1. ImouApi - request signing, token cache, single-retry API client
//! 2. ApiUsageTracker - monthly Open API call metering
//! 3. JsonStore - small JSON documents on disk
//! 4. DeviceRegistry - known cameras (discovered or registered)
//! 5. PtzService - per-device h/v/z targets and absolute moves
//! 6. PresetService - named PTZ presets
//! 7. WebAPI - REST command façade
//! 8. AppState - configuration and component wiring
//!
//! ## Design Principles
//!
//! - Every vendor call goes through one signed transport path
//! - Only the expired-token code triggers a refresh, and only one retry

pub mod device_registry;
pub mod error;
pub mod imou_api;
pub mod models;
pub mod preset_store;
pub mod ptz_controller;
pub mod state;
pub mod storage;
pub mod usage_tracker;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
