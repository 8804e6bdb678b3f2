//! Signed request round trip shared by the token manager and the API client

use super::signer;
use super::transport::Transport;
use super::types::{Credentials, OpenApiRequest, OpenApiResponse};
use crate::error::{Error, Result};
use crate::usage_tracker::ApiUsageTracker;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Signed POST + envelope decoding against one account
pub struct OpenApiHttp {
    credentials: Arc<Credentials>,
    transport: Arc<dyn Transport>,
    usage: Option<Arc<ApiUsageTracker>>,
}

impl OpenApiHttp {
    pub fn new(credentials: Arc<Credentials>, transport: Arc<dyn Transport>) -> Self {
        Self {
            credentials,
            transport,
            usage: None,
        }
    }

    /// Count every vendor response in the given tracker
    pub fn with_usage(mut self, usage: Arc<ApiUsageTracker>) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Perform one signed attempt
    ///
    /// A fresh `system` block and request id are generated on every call.
    /// Returns the decoded envelope and the timestamp embedded in the request.
    pub async fn post(
        &self,
        endpoint: &str,
        params: Map<String, Value>,
    ) -> Result<(OpenApiResponse, i64)> {
        let (system, time, _nonce) =
            signer::make_system(&self.credentials.app_id, &self.credentials.app_secret);
        let request = OpenApiRequest {
            system,
            id: Uuid::new_v4().to_string(),
            params,
        };
        let body = serde_json::to_value(&request)?;
        let url = self.credentials.url(endpoint);

        debug!(target: "imou_api", endpoint = %endpoint, request_id = %request.id, "Sending Open API request");

        let response = self.transport.post_json(&url, &body).await?;

        if let Some(usage) = &self.usage {
            usage.note_call(response.date.as_deref()).await;
        }

        if !response.is_success() {
            warn!(
                target: "imou_api",
                endpoint = %endpoint,
                status = response.status,
                "Open API returned non-success HTTP status"
            );
            return Err(Error::Transport(format!(
                "{} returned HTTP {}: {}",
                endpoint,
                response.status,
                truncate(&response.body, 200)
            )));
        }

        let decoded = decode_body(endpoint, &response.body)?;
        Ok((decoded, time))
    }
}

/// Decode a response body; an empty body is an empty envelope
pub(crate) fn decode_body(endpoint: &str, body: &str) -> Result<OpenApiResponse> {
    if body.trim().is_empty() {
        return Ok(OpenApiResponse::empty());
    }
    let value: Value = serde_json::from_str(body).map_err(|e| {
        Error::Decode(format!(
            "{} returned invalid JSON ({}): {}",
            endpoint,
            e,
            truncate(body, 200)
        ))
    })?;
    if !value.is_object() {
        return Err(Error::Decode(format!(
            "{} returned a non-object JSON body",
            endpoint
        )));
    }
    Ok(OpenApiResponse::new(value))
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imou_api::testing::ScriptedTransport;
    use crate::imou_api::types::endpoints;
    use crate::imou_api::TransportResponse;
    use serde_json::json;

    fn http(transport: Arc<ScriptedTransport>) -> OpenApiHttp {
        OpenApiHttp::new(
            Arc::new(Credentials::new("app", "secret", "http://host/")),
            transport,
        )
    }

    #[test]
    fn test_decode_empty_body() {
        let resp = decode_body("/x", "").unwrap();
        assert!(resp.is_empty());
        let resp = decode_body("/x", "  \n").unwrap();
        assert!(resp.is_empty());
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode_body("/x", "<html>oops</html>").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        let err = decode_body("/x", "[1,2]").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ãããã", 2), "ãã");
    }

    #[tokio::test]
    async fn test_post_builds_signed_payload() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(json!({"result": {"code": "0"}}));
        let http = http(transport.clone());

        let mut params = Map::new();
        params.insert("deviceId".into(), json!("dev"));
        let (resp, time) = http.post(endpoints::DEVICE_LIST, params).await.unwrap();
        assert_eq!(resp.code().as_deref(), Some("0"));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "http://host/openapi/device/list");
        let body = &requests[0].body;
        assert_eq!(body["system"]["ver"], "1.0");
        assert_eq!(body["system"]["appId"], "app");
        assert_eq!(body["system"]["time"], json!(time));
        assert_eq!(body["params"]["deviceId"], "dev");
        assert!(Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_post_non_success_status_is_transport_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push(TransportResponse {
            status: 502,
            date: None,
            body: "bad gateway".into(),
        });
        let err = http(transport).post("/x", Map::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transport(msg) if msg.contains("502")));
    }
}
