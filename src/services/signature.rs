use hmac::{Hmac, Mac};
use sha2::Sha256;

pub const SIGNATURE_HEADER: &str = "x-retell-signature";

/// Signatures older (or newer) than this are refused.
const MAX_SKEW_MS: u64 = 5 * 60 * 1000;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("missing signature")]
    Missing,
    #[error("malformed signature")]
    Malformed,
    #[error("signature expired")]
    Expired,
    #[error("invalid signature")]
    Mismatch,
}

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, body: &[u8], timestamp_ms: i64) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    mac.update(timestamp_ms.to_string().as_bytes());
    Some(mac)
}

/// Header value in the agent platform's `v=<unix-ms>,d=<hex digest>` form.
pub fn sign(secret: &str, body: &[u8], timestamp_ms: i64) -> String {
    let digest = mac_for(secret, body, timestamp_ms)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("v={timestamp_ms},d={digest}")
}

pub fn verify_signature(
    secret: &str,
    body: &[u8],
    header: Option<&str>,
    now_ms: i64,
) -> Result<(), SignatureError> {
    let header = header
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or(SignatureError::Missing)?;

    let (timestamp_ms, digest) = parse_header(header).ok_or(SignatureError::Malformed)?;
    let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;

    if now_ms.abs_diff(timestamp_ms) > MAX_SKEW_MS {
        return Err(SignatureError::Expired);
    }

    let mac = mac_for(secret, body, timestamp_ms).ok_or(SignatureError::Mismatch)?;
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

fn parse_header(header: &str) -> Option<(i64, &str)> {
    let mut timestamp = None;
    let mut digest = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("v", v)) => timestamp = v.parse::<i64>().ok(),
            Some(("d", d)) => digest = Some(d),
            _ => {}
        }
    }
    Some((timestamp?, digest.filter(|d| !d.is_empty())?))
}
