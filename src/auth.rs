//! Signed bearer tokens for the admin surface.
//!
//! A token is `"{expiry}.{signature}"` where the signature is the hex
//! SHA-256 digest of the shared secret and the expiry timestamp. Tokens
//! are stateless: any process holding the secret can verify them, nothing
//! is stored server-side.

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Issue a token valid for `ttl_secs`, returning it with its expiry
/// (unix seconds).
pub fn issue_token(secret: &str, ttl_secs: i64) -> (String, i64) {
    let expires_at = Utc::now().timestamp() + ttl_secs;
    (format!("{expires_at}.{}", sign(secret, expires_at)), expires_at)
}

pub fn sign(secret: &str, expires_at: i64) -> String {
    let digest = Sha256::digest(format!("{secret}.{expires_at}"));
    hex::encode(digest)
}

/// Check shape, expiry and signature.
pub fn verify_token(secret: &str, token: &str) -> bool {
    let Some((expiry_raw, signature)) = token.split_once('.') else {
        return false;
    };
    let Ok(expires_at) = expiry_raw.parse::<i64>() else {
        return false;
    };
    if expires_at <= Utc::now().timestamp() {
        return false;
    }
    signature == sign(secret, expires_at)
}
