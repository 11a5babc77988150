use std::future::Future;

use tracing::{debug, warn};

// For signature verification
use hex::decode as hex_decode;
use hmac::{Hmac, Mac};
use sha1::Sha1;
type HmacSha1 = Hmac<Sha1>;

/// Helper function for verifying GitHub webhook signature.
///
/// With no secret configured every payload is accepted. Otherwise the
/// `X-Hub-Signature` header must read `sha1=<hex digest>` and match an
/// HMAC-SHA1 of the raw body keyed with the secret. Anything else fails closed.
pub fn verify_github_signature(
    secret: Option<&str>,
    payload: &[u8],
    signature_header: Option<&str>,
) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    let Some(signature_header) = signature_header else {
        warn!("Signature header missing while a webhook secret is configured");
        return false;
    };

    let Some((algorithm, hex_digest)) = signature_header.split_once('=') else {
        warn!("Unparseable signature header");
        return false;
    };
    if algorithm != "sha1" {
        warn!("Unsupported signature algorithm '{}'", algorithm);
        return false;
    }

    let git_signature = match hex_decode(hex_digest) {
        Ok(bytes) => bytes,
        Err(_) => {
            warn!("Signature digest is not valid hex");
            return false;
        }
    };

    let mut mac = match HmacSha1::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload);

    // verify_slice compares in constant time
    mac.verify_slice(&git_signature).is_ok()
}

/// Hex encoded `sha1=` signature for `payload`, as GitHub would send it.
pub fn sign_payload(secret: &str, payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    Some(format!("sha1={}", hex::encode(mac.finalize().into_bytes())))
}

/// Bounded retry: pick a candidate with `select`, keep it if `healthy` says so.
///
/// Each attempt makes a fresh, independent selection. Returns `None` once
/// `max_attempts` candidates have been rejected.
pub async fn select_healthy<T, S, H, Fut>(
    max_attempts: usize,
    mut select: S,
    mut healthy: H,
) -> Option<T>
where
    T: Clone,
    S: FnMut() -> T,
    H: FnMut(T) -> Fut,
    Fut: Future<Output = bool>,
{
    for attempt in 1..=max_attempts {
        let candidate = select();
        if healthy(candidate.clone()).await {
            debug!("Healthy candidate found on attempt {}", attempt);
            return Some(candidate);
        }
        debug!("Attempt {}/{} rejected", attempt, max_attempts);
    }
    None
}
