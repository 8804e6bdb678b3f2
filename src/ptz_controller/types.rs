//! PTZ Controller type definitions

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Axis range accepted by the position controls
pub const AXIS_MIN: f64 = -1.0;
pub const AXIS_MAX: f64 = 1.0;
/// Control steps per unit (0.01 resolution)
const STEPS_PER_UNIT: f64 = 100.0;

/// PTZ axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PtzAxis {
    /// Horizontal (pan)
    #[serde(rename = "h")]
    Horizontal,
    /// Vertical (tilt)
    #[serde(rename = "v")]
    Vertical,
    #[serde(rename = "z")]
    Zoom,
}

impl FromStr for PtzAxis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "h" | "horizontal" => Ok(Self::Horizontal),
            "v" | "vertical" => Ok(Self::Vertical),
            "z" | "zoom" => Ok(Self::Zoom),
            other => Err(Error::Validation(format!("Unknown PTZ axis: {}", other))),
        }
    }
}

/// Clamp to [-1, 1] and snap to the control step
pub fn clamp_axis(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    let clamped = value.clamp(AXIS_MIN, AXIS_MAX);
    (clamped * STEPS_PER_UNIT).round() / STEPS_PER_UNIT
}

/// Absolute PTZ position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PtzPosition {
    pub h: f64,
    pub v: f64,
    #[serde(default)]
    pub z: f64,
}

impl PtzPosition {
    pub fn new(h: f64, v: f64, z: f64) -> Self {
        Self { h, v, z }
    }

    /// Copy with every axis clamped to the control range
    pub fn clamped(&self) -> Self {
        Self {
            h: clamp_axis(self.h),
            v: clamp_axis(self.v),
            z: clamp_axis(self.z),
        }
    }

    pub fn get(&self, axis: PtzAxis) -> f64 {
        match axis {
            PtzAxis::Horizontal => self.h,
            PtzAxis::Vertical => self.v,
            PtzAxis::Zoom => self.z,
        }
    }

    pub fn set(&mut self, axis: PtzAxis, value: f64) {
        match axis {
            PtzAxis::Horizontal => self.h = value,
            PtzAxis::Vertical => self.v = value,
            PtzAxis::Zoom => self.z = value,
        }
    }
}

/// Set position request
#[derive(Debug, Clone, Deserialize)]
pub struct SetPositionRequest {
    pub h: f64,
    pub v: f64,
    #[serde(default)]
    pub z: f64,
}

/// Set axis request
#[derive(Debug, Clone, Deserialize)]
pub struct SetAxisRequest {
    pub value: f64,
}

/// PTZ operation result
#[derive(Debug, Clone, Serialize)]
pub struct PtzResponse {
    pub ok: bool,
    pub position: PtzPosition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PtzResponse {
    pub fn success(position: PtzPosition) -> Self {
        Self {
            ok: true,
            position,
            message: None,
        }
    }

    pub fn success_with_message(position: PtzPosition, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            position,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_axis() {
        assert_eq!(clamp_axis(1.7), 1.0);
        assert_eq!(clamp_axis(-3.0), -1.0);
        assert!((clamp_axis(0.123) - 0.12).abs() < 1e-9);
        assert!((clamp_axis(-0.456) - -0.46).abs() < 1e-9);
        assert_eq!(clamp_axis(f64::NAN), 0.0);
    }

    #[test]
    fn test_axis_from_str() {
        assert_eq!("h".parse::<PtzAxis>().unwrap(), PtzAxis::Horizontal);
        assert_eq!("Vertical".parse::<PtzAxis>().unwrap(), PtzAxis::Vertical);
        assert_eq!("z".parse::<PtzAxis>().unwrap(), PtzAxis::Zoom);
        assert!("x".parse::<PtzAxis>().is_err());
    }

    #[test]
    fn test_position_get_set() {
        let mut pos = PtzPosition::default();
        pos.set(PtzAxis::Vertical, 0.5);
        assert_eq!(pos.get(PtzAxis::Vertical), 0.5);
        assert_eq!(pos.get(PtzAxis::Horizontal), 0.0);
    }
}
