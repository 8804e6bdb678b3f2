//! Imou Open API access core
//!
//! ## Responsibilities
//!
//! - Request signing (`system` block: time, nonce, md5 sign)
//! - Access token lifecycle (fetch, cache with 30s margin, refresh, invalidate)
//! - Signed, tokened calls with a single refresh-and-retry on `TK1002`
//! - Domain operations: absolute PTZ positioning, device listing
//!
//! ## Layering
//!
//! `ApiClient` → `TokenManager` → `OpenApiHttp` → `Transport`.
//! One instance of each per account; the token cache is never global.

pub mod client;
pub mod http;
pub mod signer;
pub mod token_manager;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ApiClient;
pub use http::OpenApiHttp;
pub use signer::make_system;
pub use token_manager::TokenManager;
pub use transport::{ReqwestTransport, Transport, TransportResponse, DEFAULT_REQUEST_TIMEOUT};
pub use types::*;

use crate::usage_tracker::ApiUsageTracker;
use std::sync::Arc;

/// Wired client stack for one account
pub struct ImouApi {
    pub client: Arc<ApiClient>,
    pub tokens: Arc<TokenManager>,
}

impl ImouApi {
    /// Build the client stack over a shared transport
    pub fn new(
        credentials: Credentials,
        transport: Arc<dyn Transport>,
        usage: Option<Arc<ApiUsageTracker>>,
    ) -> Self {
        let mut http = OpenApiHttp::new(Arc::new(credentials), transport);
        if let Some(usage) = usage {
            http = http.with_usage(usage);
        }
        let http = Arc::new(http);
        let tokens = Arc::new(TokenManager::new(http.clone()));
        let client = Arc::new(ApiClient::new(http, tokens.clone()));
        Self { client, tokens }
    }
}
