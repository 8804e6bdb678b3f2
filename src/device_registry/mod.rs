//! DeviceRegistry - known cameras for the account
//!
//! ## Responsibilities
//!
//! - Seed from the Open API device list (best-effort discovery)
//! - Runtime registration of additional devices
//! - Broadcast a notification for every newly added device

use crate::error::{Error, Result};
use crate::imou_api::{ApiClient, DeviceRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

/// Registered device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub device_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Device {
    /// Name shown to users
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "Imou Camera".to_string())
    }
}

impl From<DeviceRecord> for Device {
    fn from(record: DeviceRecord) -> Self {
        Self {
            device_id: record.device_id,
            name: record.name,
            model: record.model,
        }
    }
}

/// Registry change notification
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Added(Device),
}

/// Device registry
pub struct DeviceRegistry {
    devices: RwLock<BTreeMap<String, Device>>,
    tx: broadcast::Sender<DeviceEvent>,
}

impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegistry {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self {
            devices: RwLock::new(BTreeMap::new()),
            tx,
        }
    }

    /// Add or update a device; returns true when it was not known before
    pub async fn register(&self, device: Device) -> Result<bool> {
        let device_id = device.device_id.trim().to_string();
        if device_id.is_empty() {
            return Err(Error::Validation("device_id is required".to_string()));
        }
        let device = Device { device_id: device_id.clone(), ..device };

        let added = {
            let mut devices = self.devices.write().await;
            devices.insert(device_id.clone(), device.clone()).is_none()
        };

        if added {
            info!(device_id = %device_id, name = %device.display_name(), "Device registered");
            // No subscribers is fine
            let _ = self.tx.send(DeviceEvent::Added(device));
        }
        Ok(added)
    }

    /// Register every device reported by the Open API; returns the number added
    pub async fn discover(&self, api: &ApiClient) -> usize {
        let mut added = 0;
        for record in api.list_devices().await {
            if self.contains(&record.device_id).await {
                continue;
            }
            if let Ok(true) = self.register(Device::from(record)).await {
                added += 1;
            }
        }
        info!(added = added, "Device discovery finished");
        added
    }

    pub async fn get(&self, device_id: &str) -> Option<Device> {
        self.devices.read().await.get(device_id).cloned()
    }

    pub async fn contains(&self, device_id: &str) -> bool {
        self.devices.read().await.contains_key(device_id)
    }

    /// Existing device or `NotFound`
    pub async fn require(&self, device_id: &str) -> Result<Device> {
        self.get(device_id)
            .await
            .ok_or_else(|| Error::NotFound(format!("Device {} not found", device_id)))
    }

    pub async fn list(&self) -> Vec<Device> {
        self.devices.read().await.values().cloned().collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imou_api::testing::ScriptedTransport;
    use crate::imou_api::{Credentials, ImouApi};
    use serde_json::json;
    use std::sync::Arc;

    fn device(id: &str) -> Device {
        Device {
            device_id: id.to_string(),
            name: None,
            model: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_notify() {
        let registry = DeviceRegistry::new();
        let mut rx = registry.subscribe();

        assert!(registry.register(device("cam1")).await.unwrap());
        assert_eq!(rx.recv().await.unwrap(), DeviceEvent::Added(device("cam1")));

        // Update keeps a single entry and does not notify
        let renamed = Device {
            name: Some("Porch".into()),
            ..device("cam1")
        };
        assert!(!registry.register(renamed).await.unwrap());
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.list().await.len(), 1);
        assert_eq!(registry.get("cam1").await.unwrap().display_name(), "Porch");
    }

    #[tokio::test]
    async fn test_register_requires_device_id() {
        let registry = DeviceRegistry::new();
        assert!(matches!(
            registry.register(device("  ")).await.unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            registry.require("missing").await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_discover_adds_unknown_devices() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_token("tok", 3600);
        transport.push_json(json!({
            "result": {"code": "0", "data": {"deviceList": [
                {"deviceId": "cam1", "deviceName": "Garage"},
                {"deviceId": "cam2"}
            ]}}
        }));
        let api = ImouApi::new(Credentials::new("a", "s", "http://host"), transport, None);

        let registry = DeviceRegistry::new();
        registry.register(device("cam1")).await.unwrap();
        assert_eq!(registry.discover(&api.client).await, 1);
        assert_eq!(registry.list().await.len(), 2);
        // Already-registered entry is left untouched
        assert_eq!(registry.get("cam1").await.unwrap().name, None);
    }

    #[tokio::test]
    async fn test_discover_failure_adds_nothing() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_error("connection refused");
        let api = ImouApi::new(Credentials::new("a", "s", "http://host"), transport, None);

        let registry = DeviceRegistry::new();
        assert_eq!(registry.discover(&api.client).await, 0);
        assert!(registry.list().await.is_empty());
    }
}
