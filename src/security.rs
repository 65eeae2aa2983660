use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

// =============================================================================
// Session Tokens
// =============================================================================

/// A freshly issued bearer token and the id it wraps
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub session_id: String,
    pub token: String,
}

/// Issue a new session token of the form `<session_id>.<hmac_hex>`
///
/// The session id is a random UUID; the HMAC lets the server reject forged
/// tokens before touching the database.
pub fn issue_token(secret: &str) -> IssuedToken {
    let session_id = Uuid::new_v4().simple().to_string();
    let token = format!("{}.{}", session_id, sign_hmac(&session_id, secret));
    IssuedToken { session_id, token }
}

/// Split a token and verify its signature, returning the session id
pub fn verify_token<'a>(token: &'a str, secret: &str) -> Option<&'a str> {
    let (session_id, signature) = token.split_once('.')?;
    if session_id.is_empty() || !verify_hmac(session_id, signature, secret) {
        tracing::warn!("Rejected session token with invalid signature");
        return None;
    }
    Some(session_id)
}

/// Storage key for a session: `SHA256(session_id + secret)`
///
/// Only this hash is persisted, so a leaked database does not yield usable tokens.
pub fn hash_session_id(session_id: &str, secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(session_id.as_bytes());
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

// =============================================================================
// HMAC
// =============================================================================

/// Hex-encoded HMAC-SHA256 of `data`
pub fn sign_hmac(data: &str, secret: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => unreachable!("HMAC accepts keys of any size"),
    };
    mac.update(data.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify HMAC-SHA256 signature
///
/// # Arguments
/// * `data` - The data that was signed
/// * `signature` - The hex-encoded HMAC signature
/// * `secret` - The shared secret key (from environment)
pub fn verify_hmac(data: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            tracing::error!("Failed to create HMAC instance");
            return false;
        }
    };

    mac.update(data.as_bytes());

    let sig_bytes = match hex::decode(signature) {
        Ok(bytes) => bytes,
        Err(_) => {
            tracing::warn!("Invalid hex signature format");
            return false;
        }
    };

    // Constant-time comparison
    mac.verify_slice(&sig_bytes).is_ok()
}
