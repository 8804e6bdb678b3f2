//! Preset type definitions

use crate::ptz_controller::PtzPosition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// device_id -> preset name -> position
pub type PresetMap = BTreeMap<String, BTreeMap<String, PtzPosition>>;

/// Named PTZ preset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    pub name: String,
    #[serde(flatten)]
    pub position: PtzPosition,
}

/// Define preset request
#[derive(Debug, Clone, Deserialize)]
pub struct DefinePresetRequest {
    pub h: f64,
    pub v: f64,
    #[serde(default)]
    pub z: f64,
}

impl DefinePresetRequest {
    pub fn position(&self) -> PtzPosition {
        PtzPosition::new(self.h, self.v, self.z)
    }
}
