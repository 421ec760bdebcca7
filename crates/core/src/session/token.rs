//! Access token expiry checks
//!
//! Tokens are three dot-separated segments; the middle one is base64 JSON
//! carrying an `exp` claim in Unix seconds. Nothing here verifies signatures.
//! Anything that cannot be read is reported as expired.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ExpiryClaim {
    exp: Option<f64>,
}

/// Read the `exp` claim of a token, if it has a readable one
pub fn expiry(token: &str) -> Option<f64> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        debug!(segments = parts.len(), "Token is not three segments");
        return None;
    }

    let payload = decode_segment(parts[1])?;
    let claim: ExpiryClaim = serde_json::from_slice(&payload).ok()?;
    claim.exp
}

/// Whether the token is expired (or unreadable) at the given Unix time
pub fn is_expired_at(token: &str, now: f64) -> bool {
    match expiry(token) {
        Some(exp) => exp < now,
        None => true,
    }
}

/// Whether the token is expired (or unreadable) right now
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, now_secs())
}

fn now_secs() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    let trimmed = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD.decode(segment))
        .ok()
}
