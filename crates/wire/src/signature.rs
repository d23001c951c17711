// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Webhook HMAC-SHA256 verification, using a constant-time compare.
//!
//! `hmac::Mac::verify_slice` is constant-time by construction, so this
//! satisfies the requirement without hand-rolling a comparison.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature header is not valid hex")]
    InvalidHex,
    #[error("signature does not match")]
    Mismatch,
}

/// Verify `signature_hex` (as supplied in the webhook's HMAC header) is the
/// HMAC-SHA256 of `body` keyed by `secret`.
///
/// On mismatch, the caller drops the event silently aside from a log line
/// (the `SignatureError` case) — this function only reports the
/// yes/no verdict, it does not log.
pub fn verify_signature(secret: &[u8], body: &[u8], signature_hex: &str) -> Result<(), SignatureError> {
    let provided = hex_decode(signature_hex).ok_or(SignatureError::InvalidHex)?;
    // `Hmac::new_from_slice` only errors on a zero-length key, which a
    // configured webhook secret never is in practice; treat that case as a
    // mismatch rather than unwinding.
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return Err(SignatureError::Mismatch);
    };
    mac.update(body);
    mac.verify_slice(&provided).map_err(|_| SignatureError::Mismatch)
}

fn hex_decode(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok()).collect()
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;
