use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha1::Sha1;
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;
type HmacSha1 = Hmac<Sha1>;

/// Field that carries the computed signature inside a payload. Always
/// excluded from the data the signature is computed over.
pub const SIGNATURE_FIELD: &str = "sign";

/// Prefix some providers put in front of the hex webhook signature header.
pub const WEBHOOK_SIGNATURE_PREFIX: &str = "sha256=";

/// Build the canonical string for a payload map.
///
/// The `sign` field and null values are dropped, remaining keys are sorted
/// bytewise ascending, and each field renders as `key=value` where booleans
/// become the literals `true`/`false` and arrays/objects are JSON-encoded.
/// Pairs are joined with `&`. The result is independent of the map's
/// insertion order.
pub fn canonical_string(data: &Map<String, Value>) -> String {
    let mut keys: Vec<&str> = data
        .keys()
        .map(String::as_str)
        .filter(|k| *k != SIGNATURE_FIELD)
        .collect();
    keys.sort_unstable();

    let mut parts = Vec::with_capacity(keys.len());
    for key in keys {
        let rendered = match &data[key] {
            Value::Null => continue,
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            value @ (Value::Array(_) | Value::Object(_)) => value.to_string(),
        };
        parts.push(format!("{}={}", key, rendered));
    }

    parts.join("&")
}

/// Sign a payload map: base64-encoded HMAC-SHA256 over the canonical string.
pub fn generate(data: &Map<String, Value>, secret: &str) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| Error::Validation("invalid HMAC key".to_string()))?;
    mac.update(canonical_string(data).as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Verify a payload map signature. Returns false on any failure, never errors.
pub fn verify(data: &Map<String, Value>, signature: &str, secret: &str) -> bool {
    match generate(data, secret) {
        Ok(expected) => constant_time_eq(expected.as_bytes(), signature.as_bytes()),
        Err(_) => false,
    }
}

/// Verify an inbound webhook signature header against the raw request body.
///
/// The body is signed verbatim (no canonicalization): the expected value is
/// the hex HMAC-SHA256 of the body. A leading `sha256=` on the header is
/// stripped if present; absence of the prefix is not an error.
pub fn verify_webhook_signature(payload: &str, signature: &str, secret: &str) -> bool {
    let signature = signature
        .strip_prefix(WEBHOOK_SIGNATURE_PREFIX)
        .unwrap_or(signature);

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    constant_time_eq(expected.as_bytes(), signature.as_bytes())
}

/// Sign an OAuth-style request: base64-encoded HMAC-SHA1 over the RFC 3986
/// base string.
///
/// This is a distinct algorithm from [`generate`]: parameters are sorted and
/// percent-encoded into a query string, the base string is
/// `UPPER(method)&enc(url)&enc(params)`, and the signing key is
/// `enc(consumer_secret)&enc(token_secret-or-empty)`.
pub fn generate_oauth_signature(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    consumer_secret: &str,
    token_secret: Option<&str>,
) -> Result<String> {
    let mut sorted: Vec<(&str, &str)> = params.to_vec();
    sorted.sort_unstable();

    let param_string = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        urlencoding::encode(url),
        urlencoding::encode(&param_string)
    );

    let signing_key = format!(
        "{}&{}",
        urlencoding::encode(consumer_secret),
        urlencoding::encode(token_secret.unwrap_or(""))
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|_| Error::Validation("invalid HMAC key".to_string()))?;
    mac.update(base_string.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// Verify an OAuth-style request signature. Returns false on any failure.
pub fn verify_oauth_signature(
    method: &str,
    url: &str,
    params: &[(&str, &str)],
    signature: &str,
    consumer_secret: &str,
    token_secret: Option<&str>,
) -> bool {
    match generate_oauth_signature(method, url, params, consumer_secret, token_secret) {
        Ok(expected) => constant_time_eq(expected.as_bytes(), signature.as_bytes()),
        Err(_) => false,
    }
}

/// Constant-time byte comparison. The running time does not depend on where
/// the inputs first differ.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
