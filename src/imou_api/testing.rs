//! Scripted transport for unit tests

use super::transport::{Transport, TransportResponse};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Recorded request
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Value,
}

enum Scripted {
    Response(TransportResponse),
    Error(String),
}

/// Replays queued responses in order and records every request
#[derive(Default)]
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep before answering, so concurrent callers overlap
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn push(&self, response: TransportResponse) {
        self.queue.lock().unwrap().push_back(Scripted::Response(response));
    }

    pub fn push_json(&self, body: Value) {
        self.push(TransportResponse::ok(body.to_string()));
    }

    pub fn push_error(&self, message: &str) {
        self.queue
            .lock()
            .unwrap()
            .push_back(Scripted::Error(message.to_string()));
    }

    /// Queue a successful token response
    pub fn push_token(&self, token: &str, expire_time: i64) {
        self.push_json(serde_json::json!({
            "result": {
                "code": "0",
                "msg": "ok",
                "data": {"accessToken": token, "expireTime": expire_time}
            }
        }));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(endpoint))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            body: body.clone(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Response(resp)) => Ok(resp),
            Some(Scripted::Error(msg)) => Err(Error::Transport(msg)),
            None => Err(Error::Transport(format!("no scripted response for {}", url))),
        }
    }
}
