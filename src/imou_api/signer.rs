//! Request signer
//!
//! Builds the `system` block attached to every Open API request:
//! `sign = md5("time:{time},nonce:{nonce},appSecret:{secret}")` in lowercase hex.

use super::types::SignedSystem;
use chrono::Utc;
use md5::{Digest, Md5};
use uuid::Uuid;

/// Envelope version expected by the Open API
pub const SYSTEM_VERSION: &str = "1.0";

/// Signature for a given timestamp and nonce
pub fn sign(time: i64, nonce: &str, app_secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(format!("time:{},nonce:{},appSecret:{}", time, nonce, app_secret).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Build a fresh signed envelope
///
/// Returns the envelope together with the embedded timestamp and nonce, so
/// callers can compute expiries relative to the moment of signing.
pub fn make_system(app_id: &str, app_secret: &str) -> (SignedSystem, i64, String) {
    let time = Utc::now().timestamp();
    let nonce = Uuid::new_v4().to_string();
    let system = SignedSystem {
        ver: SYSTEM_VERSION.to_string(),
        app_id: app_id.to_string(),
        sign: sign(time, &nonce, app_secret),
        time,
        nonce: nonce.clone(),
    };
    (system, time, nonce)
}
