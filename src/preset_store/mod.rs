//! PresetStore - named PTZ presets per device
//!
//! ## Responsibilities
//!
//! - Define presets from explicit coordinates or the device's current target
//! - Recall presets (moves the camera through the PTZ controller)
//! - Persist presets across restarts via JsonStore

mod service;
mod types;

pub use service::PresetService;
pub use types::*;
