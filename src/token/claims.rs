//! Token claim decoding.
//!
//! Claims are read, never verified: the middle segment of a
//! `header.payload.signature` token is base64 JSON carrying `exp`.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(default)]
    exp: Option<f64>,
}

/// When a token stops being usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenExpiry {
    /// Unix seconds
    At(u64),
    /// Claims carry no `exp`
    Never,
}

/// Reads the expiry claim. `None` when the token cannot be decoded.
pub fn parse_expiry(token: &str) -> Option<TokenExpiry> {
    let mut segments = token.split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return None;
    };

    let payload = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;

    Some(match claims.exp {
        Some(exp) if exp.is_finite() => TokenExpiry::At(exp.max(0.0) as u64),
        Some(_) => return None,
        None => TokenExpiry::Never,
    })
}

/// True when the token must be replaced.
///
/// Undecodable tokens count as expired.
pub fn is_expired(token: &str, now_secs: u64) -> bool {
    match parse_expiry(token) {
        Some(TokenExpiry::At(exp)) => exp < now_secs,
        Some(TokenExpiry::Never) => false,
        None => true,
    }
}
