//! Imou Open API type definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open API endpoints (relative to the configured base URL)
pub mod endpoints {
    pub const ACCESS_TOKEN: &str = "/openapi/accessToken";
    pub const CONTROL_LOCATION_PTZ: &str = "/openapi/controlLocationPTZ";
    pub const DEVICE_LIST: &str = "/openapi/device/list";
}

/// Result code for a successful call
pub const SUCCESS_CODE: &str = "0";

/// Result code for an invalid or expired access token
pub const TOKEN_EXPIRED_CODE: &str = "TK1002";

/// Seconds subtracted from the vendor-reported token lifetime
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 30;

/// Lifetime assumed when the token response omits `expireTime`
pub const DEFAULT_TOKEN_EXPIRE_SECS: i64 = 3600;

/// Account credentials
#[derive(Clone)]
pub struct Credentials {
    pub app_id: String,
    pub app_secret: String,
    pub base_url: String,
}

impl Credentials {
    pub fn new(
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Full URL for an endpoint path
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.app_id)
            .field("app_secret", &mask_secret(&self.app_secret))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Show only a short prefix of a secret for logs
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "***".to_string()
    } else {
        format!("{}***", prefix)
    }
}

/// Signed authentication envelope ("system" block)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedSystem {
    pub ver: String,
    #[serde(rename = "appId")]
    pub app_id: String,
    pub sign: String,
    pub time: i64,
    pub nonce: String,
}

/// Request body sent to every endpoint
#[derive(Debug, Clone, Serialize)]
pub struct OpenApiRequest {
    pub system: SignedSystem,
    pub id: String,
    pub params: Map<String, Value>,
}

/// Decoded response envelope
///
/// Kept as raw JSON: the vendor is loose about field types and shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenApiResponse {
    raw: Value,
}

impl OpenApiResponse {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Empty envelope (empty response body)
    pub fn empty() -> Self {
        Self {
            raw: Value::Object(Map::new()),
        }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn into_raw(self) -> Value {
        self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.as_object().map(|o| o.is_empty()).unwrap_or(false)
    }

    /// `result` object, if present
    pub fn result(&self) -> Option<&Map<String, Value>> {
        self.raw.get("result").and_then(Value::as_object)
    }

    /// `result.code` as a string, numeric codes included
    pub fn code(&self) -> Option<String> {
        match self.result()?.get("code")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// `result.code`, defaulting to success when absent
    pub fn code_or_success(&self) -> String {
        self.code().unwrap_or_else(|| SUCCESS_CODE.to_string())
    }

    pub fn msg(&self) -> String {
        self.result()
            .and_then(|r| r.get("msg"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// `result.data`, if it is an object
    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.result()?.get("data").and_then(Value::as_object)
    }
}

/// Device record returned by the device list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "deviceId")]
    pub device_id: String,
    #[serde(default, alias = "deviceName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, alias = "deviceModel", skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Remaining vendor fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "***");
        assert_eq!(mask_secret("at_0123456789abcdef"), "at_0***");
        let creds = Credentials::new("id", "supersecretvalue", "http://h");
        assert!(!format!("{:?}", creds).contains("supersecretvalue"));
    }

    #[test]
    fn test_credentials_trim_base_url() {
        let creds = Credentials::new("id", "secret", "https://openapi.example.com//");
        assert_eq!(creds.base_url, "https://openapi.example.com");
        assert_eq!(
            creds.url(endpoints::ACCESS_TOKEN),
            "https://openapi.example.com/openapi/accessToken"
        );
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = Credentials::new("id", "topsecret", "https://x");
        let text = format!("{:?}", creds);
        assert!(!text.contains("topsecret"));
    }

    #[test]
    fn test_response_code_accessors() {
        let resp = OpenApiResponse::new(json!({"result": {"code": 0, "msg": "ok"}}));
        assert_eq!(resp.code().as_deref(), Some("0"));
        assert_eq!(resp.msg(), "ok");

        let resp = OpenApiResponse::new(json!({"result": {"code": "TK1002"}}));
        assert_eq!(resp.code_or_success(), "TK1002");
        assert_eq!(resp.msg(), "");

        let resp = OpenApiResponse::empty();
        assert!(resp.is_empty());
        assert!(resp.code().is_none());
        assert_eq!(resp.code_or_success(), SUCCESS_CODE);
    }

    #[test]
    fn test_device_record_aliases() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "deviceId": "ABC123",
            "deviceName": "Garage",
            "deviceModel": "IPC-S42FP",
            "status": "online",
            "channels": [{"channelId": "0"}]
        }))
        .unwrap();
        assert_eq!(record.device_id, "ABC123");
        assert_eq!(record.name.as_deref(), Some("Garage"));
        assert_eq!(record.model.as_deref(), Some("IPC-S42FP"));
        assert!(record.extra.contains_key("channels"));
    }
}
