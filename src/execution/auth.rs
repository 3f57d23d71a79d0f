//! Request signing for the exchange REST API

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::errors::{Result, ScalperError};
use crate::config::types::SignatureEncoding;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 of `payload` keyed with the raw API secret
///
/// # Arguments
/// * `secret` - API secret (used as raw bytes)
/// * `payload` - Exact query string / body being sent
/// * `encoding` - Wire encoding of the digest
pub fn sign_payload(secret: &str, payload: &str, encoding: SignatureEncoding) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ScalperError::Authentication(format!("Failed to create HMAC: {}", e)))?;
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();

    Ok(match encoding {
        SignatureEncoding::Hex => hex::encode(digest),
        SignatureEncoding::Base64 => BASE64.encode(digest),
    })
}

/// Build `params&recvWindow=..&timestamp=..&signature=..`
///
/// Parameters are emitted in the given order; the signature covers everything
/// before it.
pub fn signed_query(
    params: &[(&str, String)],
    recv_window_ms: u64,
    timestamp_ms: i64,
    secret: &str,
    encoding: SignatureEncoding,
) -> Result<String> {
    let mut query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    if !query.is_empty() {
        query.push('&');
    }
    query.push_str(&format!("recvWindow={}&timestamp={}", recv_window_ms, timestamp_ms));

    let signature = sign_payload(secret, &query, encoding)?;
    let signature = match encoding {
        SignatureEncoding::Hex => signature,
        // base64 may contain '+', '/' and '='
        SignatureEncoding::Base64 => {
            url::form_urlencoded::byte_serialize(signature.as_bytes()).collect::<String>()
        }
    };
    Ok(format!("{}&signature={}", query, signature))
}
