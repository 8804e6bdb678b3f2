//! Imou Open API client
//!
//! Every authenticated call goes through `call_with_retry`: one attempt with
//! the current token, and on `TK1002` exactly one more attempt with a freshly
//! fetched token and a freshly signed envelope.

use super::http::OpenApiHttp;
use super::token_manager::TokenManager;
use super::types::{endpoints, DeviceRecord, OpenApiResponse, SUCCESS_CODE, TOKEN_EXPIRED_CODE};
use crate::error::{Error, Result};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Device list query defaults
const DEVICE_LIST_BIND_ID: &str = "-1";
const DEVICE_LIST_LIMIT: u32 = 128;
const DEVICE_LIST_TYPE: &str = "bindAndShare";

/// Open API client for one account
pub struct ApiClient {
    http: Arc<OpenApiHttp>,
    tokens: Arc<TokenManager>,
    retry_on_expired_token: bool,
}

impl ApiClient {
    pub fn new(http: Arc<OpenApiHttp>, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            tokens,
            retry_on_expired_token: true,
        }
    }

    /// Disable the refresh-and-retry path on `TK1002`
    pub fn without_token_retry(mut self) -> Self {
        self.retry_on_expired_token = false;
        self
    }

    pub fn token_manager(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Call an endpoint, refreshing the token and retrying once on `TK1002`
    pub async fn call_with_retry(
        &self,
        endpoint: &str,
        params: &Map<String, Value>,
        include_token: bool,
    ) -> Result<OpenApiResponse> {
        let token = if include_token {
            Some(self.tokens.get_token().await?)
        } else {
            None
        };

        let response = self.do_call(endpoint, params, token.as_deref()).await?;
        let code = response.code_or_success();
        if code == SUCCESS_CODE || !include_token {
            return Ok(response);
        }

        let (code, response) = if code == TOKEN_EXPIRED_CODE && self.retry_on_expired_token {
            info!(target: "imou_api", endpoint = %endpoint, "Token rejected, refreshing and retrying once");
            let new_token = self.tokens.refresh_token().await?;
            let retried = self.do_call(endpoint, params, Some(&new_token)).await?;
            let retried_code = retried.code_or_success();
            if retried_code == SUCCESS_CODE {
                return Ok(retried);
            }
            (retried_code, retried)
        } else {
            (code, response)
        };

        let message = response.msg();
        warn!(
            target: "imou_api",
            endpoint = %endpoint,
            code = %code,
            msg = %message,
            "Open API call failed"
        );
        Err(Error::Api {
            endpoint: endpoint.to_string(),
            code,
            message,
        })
    }

    /// Absolute PTZ positioning
    ///
    /// Values are forwarded as given; the vendor validates ranges.
    pub async fn set_position(&self, device_id: &str, h: f64, v: f64, z: f64) -> Result<bool> {
        let params = object(json!({
            "deviceId": device_id,
            "channelId": "0",
            "h": h,
            "v": v,
            "z": z,
        }));

        debug!(target: "imou_api", device_id = %device_id, h = h, v = v, z = z, "Setting PTZ position");
        self.call_with_retry(endpoints::CONTROL_LOCATION_PTZ, &params, true)
            .await?;
        Ok(true)
    }

    /// List devices bound to or shared with the account
    ///
    /// Best-effort: failures are logged and yield an empty list.
    pub async fn list_devices(&self) -> Vec<DeviceRecord> {
        let params = object(json!({
            "bindId": DEVICE_LIST_BIND_ID,
            "limit": DEVICE_LIST_LIMIT,
            "type": DEVICE_LIST_TYPE,
            "needApInfo": "false",
        }));

        match self
            .call_with_retry(endpoints::DEVICE_LIST, &params, true)
            .await
        {
            Ok(response) => {
                let devices = extract_devices(&response);
                info!(target: "imou_api", count = devices.len(), "Device list fetched");
                devices
            }
            Err(e) => {
                warn!(target: "imou_api", error = %e, "Failed to list devices");
                Vec::new()
            }
        }
    }

    async fn do_call(
        &self,
        endpoint: &str,
        params: &Map<String, Value>,
        token: Option<&str>,
    ) -> Result<OpenApiResponse> {
        let mut params = params.clone();
        if let Some(token) = token {
            params.insert("token".to_string(), Value::String(token.to_string()));
        }
        let (response, _time) = self.http.post(endpoint, params).await?;
        Ok(response)
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Pull device records out of the known response shapes
///
/// Looks at `result.data.deviceList`, then `result.devices`, then `result.list`.
fn extract_devices(response: &OpenApiResponse) -> Vec<DeviceRecord> {
    let Some(result) = response.result() else {
        return Vec::new();
    };

    let list = response
        .data()
        .and_then(|d| d.get("deviceList"))
        .and_then(Value::as_array)
        .or_else(|| result.get("devices").and_then(Value::as_array))
        .or_else(|| result.get("list").and_then(Value::as_array));

    let Some(list) = list else {
        return Vec::new();
    };

    list.iter()
        .filter_map(|entry| match serde_json::from_value::<DeviceRecord>(entry.clone()) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(target: "imou_api", error = %e, "Skipping unparseable device entry");
                None
            }
        })
        .collect()
}
