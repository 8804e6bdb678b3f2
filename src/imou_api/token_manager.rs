//! Access token lifecycle
//!
//! Fetches the account access token from `/openapi/accessToken`, caches it
//! until `expireTime - 30s`, and refreshes it on demand. Fetches are
//! serialised by `fetch_lock`; a waiter re-checks the cache after acquiring
//! it, so concurrent callers never issue overlapping fetches.

use super::http::OpenApiHttp;
use super::types::{
    endpoints, mask_secret, DEFAULT_TOKEN_EXPIRE_SECS, SUCCESS_CODE, TOKEN_EXPIRY_MARGIN_SECS,
};
use crate::error::{Error, Result};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Cached token state
#[derive(Debug, Clone, Default)]
struct CachedToken {
    token: Option<String>,
    /// Epoch seconds
    expires_at: i64,
}

impl CachedToken {
    fn valid_at(&self, now: i64) -> Option<&str> {
        match &self.token {
            Some(token) if now < self.expires_at => Some(token),
            _ => None,
        }
    }
}

/// Token manager for one account
pub struct TokenManager {
    http: Arc<OpenApiHttp>,
    cache: RwLock<CachedToken>,
    fetch_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(http: Arc<OpenApiHttp>) -> Self {
        Self {
            http,
            cache: RwLock::new(CachedToken::default()),
            fetch_lock: Mutex::new(()),
        }
    }

    /// Get a valid token (from cache or a new fetch)
    pub async fn get_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _guard = self.fetch_lock.lock().await;

        // Another caller may have fetched while we waited
        if let Some(token) = self.cached_token().await {
            debug!(target: "imou_api", "Token fetched by concurrent caller, reusing");
            return Ok(token);
        }

        self.fetch_and_store().await
    }

    /// Fetch a new token unconditionally
    pub async fn refresh_token(&self) -> Result<String> {
        let _guard = self.fetch_lock.lock().await;
        info!(target: "imou_api", "Forcing access token refresh");
        self.fetch_and_store().await
    }

    /// Drop the cached token; the next `get_token` fetches
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = CachedToken::default();
        debug!(target: "imou_api", "Access token invalidated");
    }

    /// Expiry of the cached token (epoch seconds), if any
    pub async fn expires_at(&self) -> Option<i64> {
        let cache = self.cache.read().await;
        cache.token.as_ref().map(|_| cache.expires_at)
    }

    async fn cached_token(&self) -> Option<String> {
        let cache = self.cache.read().await;
        cache.valid_at(Utc::now().timestamp()).map(str::to_string)
    }

    /// Caller must hold `fetch_lock`
    async fn fetch_and_store(&self) -> Result<String> {
        let (token, expires_at) = self.fetch_new_token().await?;
        let mut cache = self.cache.write().await;
        cache.token = Some(token.clone());
        cache.expires_at = expires_at;
        Ok(token)
    }

    async fn fetch_new_token(&self) -> Result<(String, i64)> {
        let (response, requested_at) = self
            .http
            .post(endpoints::ACCESS_TOKEN, Map::new())
            .await?;

        let code = response.code().unwrap_or_default();
        if code != SUCCESS_CODE {
            let msg = response.msg();
            return Err(Error::Auth(format!(
                "Failed to obtain access token (code={}): {}",
                code,
                if msg.is_empty() { "error" } else { msg.as_str() }
            )));
        }

        let data = response.data();
        let token = data
            .and_then(|d| d.get("accessToken").or_else(|| d.get("token")))
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Auth("Access token missing from response".to_string()))?;

        let expire_secs = data
            .and_then(|d| d.get("expireTime"))
            .and_then(parse_seconds)
            .unwrap_or(DEFAULT_TOKEN_EXPIRE_SECS);
        let expires_at = requested_at
            .saturating_add(expire_secs)
            .saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);

        info!(
            target: "imou_api",
            token = %mask_secret(token),
            expire_secs = expire_secs,
            expires_at = expires_at,
            "Access token obtained"
        );

        Ok((token.to_string(), expires_at))
    }
}

/// `expireTime` arrives as a number or a numeric string
fn parse_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
