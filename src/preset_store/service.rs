//! Preset service

use super::types::{Preset, PresetMap};
use crate::device_registry::DeviceRegistry;
use crate::error::{Error, Result};
use crate::ptz_controller::{PtzPosition, PtzResponse, PtzService};
use crate::storage::{keys, JsonStore};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Preset service
pub struct PresetService {
    store: JsonStore,
    ptz: Arc<PtzService>,
    registry: Arc<DeviceRegistry>,
    presets: RwLock<PresetMap>,
}

impl PresetService {
    pub fn new(store: JsonStore, ptz: Arc<PtzService>, registry: Arc<DeviceRegistry>) -> Self {
        Self {
            store,
            ptz,
            registry,
            presets: RwLock::new(PresetMap::new()),
        }
    }

    /// Restore persisted presets
    pub async fn load(&self) {
        match self.store.load(keys::PRESETS).await {
            Ok(Some(value)) => match serde_json::from_value::<PresetMap>(value) {
                Ok(map) => {
                    let count: usize = map.values().map(|m| m.len()).sum();
                    info!(presets = count, "Presets restored");
                    *self.presets.write().await = map;
                }
                Err(e) => warn!(error = %e, "Stored presets are malformed, ignoring"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load presets"),
        }
    }

    /// Store a preset with explicit coordinates
    pub async fn define_preset(
        &self,
        device_id: &str,
        name: &str,
        position: PtzPosition,
    ) -> Result<Preset> {
        self.registry.require(device_id).await?;
        let name = normalize_name(name)?;
        self.insert(device_id, name, position.clamped()).await
    }

    /// Store the device's current target under `name`
    pub async fn save_preset(&self, device_id: &str, name: &str) -> Result<Preset> {
        let name = normalize_name(name)?;
        let position = self.ptz.position(device_id).await?;
        self.insert(device_id, name, position).await
    }

    /// Move the camera to a stored preset
    pub async fn call_preset(&self, device_id: &str, name: &str) -> Result<PtzResponse> {
        let name = normalize_name(name)?;
        let position = self.get(device_id, &name).await?.position;

        info!(device_id = %device_id, preset = %name, "Calling preset");
        let response = self
            .ptz
            .set_position(device_id, position.h, position.v, position.z)
            .await?;
        Ok(PtzResponse::success_with_message(
            response.position,
            format!("Moved to preset {}", name),
        ))
    }

    pub async fn get(&self, device_id: &str, name: &str) -> Result<Preset> {
        self.presets
            .read()
            .await
            .get(device_id)
            .and_then(|m| m.get(name))
            .map(|position| Preset {
                name: name.to_string(),
                position: *position,
            })
            .ok_or_else(|| {
                Error::NotFound(format!("Preset {} not found for device {}", name, device_id))
            })
    }

    /// Presets of a device, ordered by name
    pub async fn list_presets(&self, device_id: &str) -> Vec<Preset> {
        self.presets
            .read()
            .await
            .get(device_id)
            .map(|m| {
                m.iter()
                    .map(|(name, position)| Preset {
                        name: name.clone(),
                        position: *position,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn delete_preset(&self, device_id: &str, name: &str) -> Result<()> {
        let name = normalize_name(name)?;
        // Held through the save so files land in mutation order
        let mut presets = self.presets.write().await;
        let removed = presets
            .get_mut(device_id)
            .and_then(|m| m.remove(&name))
            .is_some();
        if !removed {
            return Err(Error::NotFound(format!(
                "Preset {} not found for device {}",
                name, device_id
            )));
        }
        if presets.get(device_id).map(|m| m.is_empty()).unwrap_or(false) {
            presets.remove(device_id);
        }

        info!(device_id = %device_id, preset = %name, "Preset deleted");
        self.persist(&presets).await;
        Ok(())
    }

    async fn insert(&self, device_id: &str, name: String, position: PtzPosition) -> Result<Preset> {
        let mut presets = self.presets.write().await;
        presets
            .entry(device_id.to_string())
            .or_default()
            .insert(name.clone(), position);

        info!(
            device_id = %device_id,
            preset = %name,
            h = position.h,
            v = position.v,
            z = position.z,
            "Preset stored"
        );
        self.persist(&presets).await;
        Ok(Preset { name, position })
    }

    async fn persist(&self, presets: &PresetMap) {
        let result = match serde_json::to_value(presets) {
            Ok(value) => self.store.save(keys::PRESETS, &value).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist presets");
        }
    }
}

fn normalize_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation("preset name is required".to_string()));
    }
    Ok(trimmed.to_string())
}
