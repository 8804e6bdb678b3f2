//! PTZ Controller Service
//!
//! Holds the per-device target position and sends it to the camera through
//! the Open API client.

use super::types::*;
use crate::device_registry::DeviceRegistry;
use crate::error::Result;
use crate::imou_api::ApiClient;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// PTZ controller service
pub struct PtzService {
    api: Arc<ApiClient>,
    registry: Arc<DeviceRegistry>,
    /// device_id -> target position
    targets: RwLock<HashMap<String, PtzPosition>>,
}

impl PtzService {
    pub fn new(api: Arc<ApiClient>, registry: Arc<DeviceRegistry>) -> Self {
        Self {
            api,
            registry,
            targets: RwLock::new(HashMap::new()),
        }
    }

    /// Current target for a device (origin if never set)
    pub async fn position(&self, device_id: &str) -> Result<PtzPosition> {
        self.registry.require(device_id).await?;
        Ok(self.target(device_id).await)
    }

    /// Update one axis of the target without moving the camera
    pub async fn set_axis(&self, device_id: &str, axis: PtzAxis, value: f64) -> Result<PtzPosition> {
        self.registry.require(device_id).await?;

        let mut targets = self.targets.write().await;
        let target = targets.entry(device_id.to_string()).or_default();
        target.set(axis, clamp_axis(value));
        Ok(*target)
    }

    /// Move the camera to its current target
    pub async fn move_to_target(&self, device_id: &str) -> Result<PtzResponse> {
        self.registry.require(device_id).await?;
        let target = self.target(device_id).await;

        tracing::info!(
            device_id = %device_id,
            h = target.h,
            v = target.v,
            z = target.z,
            "Moving camera to target"
        );

        self.api
            .set_position(device_id, target.h, target.v, target.z)
            .await?;
        Ok(PtzResponse::success(target))
    }

    /// Absolute positioning command
    ///
    /// Values reach the vendor unchanged; the stored target is the clamped copy.
    pub async fn set_position(&self, device_id: &str, h: f64, v: f64, z: f64) -> Result<PtzResponse> {
        self.registry.require(device_id).await?;

        tracing::info!(device_id = %device_id, h = h, v = v, z = z, "Executing set_position");

        self.api.set_position(device_id, h, v, z).await?;

        let position = PtzPosition::new(h, v, z).clamped();
        self.targets
            .write()
            .await
            .insert(device_id.to_string(), position);
        Ok(PtzResponse::success(position))
    }

    async fn target(&self, device_id: &str) -> PtzPosition {
        self.targets
            .read()
            .await
            .get(device_id)
            .copied()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device_registry::Device;
    use crate::error::Error;
    use crate::imou_api::testing::ScriptedTransport;
    use crate::imou_api::{endpoints, Credentials, ImouApi};
    use serde_json::json;

    async fn service(transport: Arc<ScriptedTransport>) -> PtzService {
        let api = ImouApi::new(Credentials::new("a", "s", "http://host"), transport, None);
        let registry = Arc::new(DeviceRegistry::new());
        registry
            .register(Device {
                device_id: "cam1".into(),
                name: Some("Porch".into()),
                model: None,
            })
            .await
            .unwrap();
        PtzService::new(api.client, registry)
    }

    #[tokio::test]
    async fn test_set_axis_clamps_and_moves() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_token("tok", 3600);
        transport.push_json(json!({"result": {"code": "0"}}));
        let ptz = service(transport.clone()).await;

        ptz.set_axis("cam1", PtzAxis::Horizontal, 1.5).await.unwrap();
        let pos = ptz.set_axis("cam1", PtzAxis::Vertical, -0.25).await.unwrap();
        assert_eq!(pos, PtzPosition::new(1.0, -0.25, 0.0));

        let resp = ptz.move_to_target("cam1").await.unwrap();
        assert!(resp.ok);

        let sent = &transport.requests_to(endpoints::CONTROL_LOCATION_PTZ)[0].body["params"];
        assert_eq!(sent["h"], json!(1.0));
        assert_eq!(sent["v"], json!(-0.25));
    }

    #[tokio::test]
    async fn test_set_position_forwards_unclamped_values() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_token("tok", 3600);
        transport.push_json(json!({"result": {"code": "0"}}));
        let ptz = service(transport.clone()).await;

        let resp = ptz.set_position("cam1", 2.5, 0.3, 0.0).await.unwrap();
        assert_eq!(resp.position, PtzPosition::new(1.0, 0.3, 0.0));

        let sent = &transport.requests_to(endpoints::CONTROL_LOCATION_PTZ)[0].body["params"];
        assert_eq!(sent["h"], json!(2.5));
        assert_eq!(ptz.position("cam1").await.unwrap().h, 1.0);
    }

    #[tokio::test]
    async fn test_failed_move_keeps_target_and_surfaces_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_token("tok", 3600);
        transport.push_json(json!({"result": {"code": "DV1007", "msg": "offline"}}));
        let ptz = service(transport).await;

        let err = ptz.set_position("cam1", 0.5, 0.5, 0.0).await.unwrap_err();
        assert_eq!(err.api_code(), Some("DV1007"));
        assert_eq!(ptz.position("cam1").await.unwrap(), PtzPosition::default());
    }

    #[tokio::test]
    async fn test_unknown_device_is_not_found() {
        let transport = Arc::new(ScriptedTransport::new());
        let ptz = service(transport.clone()).await;
        assert!(matches!(
            ptz.set_axis("nope", PtzAxis::Zoom, 0.1).await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert!(matches!(
            ptz.move_to_target("nope").await.unwrap_err(),
            Error::NotFound(_)
        ));
        assert_eq!(transport.request_count(), 0);
    }
}
