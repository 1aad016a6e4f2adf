//! Token signing primitives.
//!
//! The platform verifies tokens with HMAC-SHA1 keyed by the partner secret.
//! SHA-1 is dictated by the token format, hence ring's legacy algorithm.

use crate::config::MAX_NONCE;
use rand::Rng;
use ring::hmac;
use tracing::instrument;

/// Sign `data` with HMAC-SHA1 keyed by `secret`, returning lowercase hex.
///
/// Both inputs are used as their UTF-8 bytes. Deterministic and infallible.
#[instrument(skip_all)]
pub fn sign_string(data: &str, secret: &str) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret.as_bytes());
    let tag = hmac::sign(&key, data.as_bytes());
    hex::encode(tag.as_ref())
}

/// Check a hex signature produced by [`sign_string`] in constant time.
///
/// Returns `false` for malformed hex as well as for mismatches.
pub fn verify_signature(data: &str, secret: &str, signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex) else {
        return false;
    };
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, secret.as_bytes());
    hmac::verify(&key, data.as_bytes(), &signature).is_ok()
}

/// Generate a token nonce, uniform over `0..=999_999`.
pub fn generate_nonce() -> u32 {
    rand::thread_rng().gen_range(0..=MAX_NONCE)
}
