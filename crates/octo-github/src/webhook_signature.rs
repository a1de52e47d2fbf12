use hmac::{Hmac, Mac};
use sha2::Sha256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
/// Enumerates supported `WebhookSignatureError` values.
pub enum WebhookSignatureError {
    #[error("signature must use sha256=<hex> format")]
    UnsupportedFormat,
    #[error("signature digest is not valid hex: {0}")]
    InvalidHex(String),
    #[error("webhook secret must not be empty")]
    EmptySecret,
    #[error("signature verification failed")]
    Mismatch,
}

/// Verifies an `x-hub-signature-256` header against the raw delivery body.
pub fn verify_sha256_hmac_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
) -> Result<(), WebhookSignatureError> {
    let digest_hex = signature_header
        .trim()
        .strip_prefix("sha256=")
        .ok_or(WebhookSignatureError::UnsupportedFormat)?;
    let signature_bytes = decode_hex(digest_hex)?;
    let mut mac = new_mac(secret)?;
    mac.update(payload);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| WebhookSignatureError::Mismatch)
}

/// Produces the `sha256=<hex>` header value GitHub would send for `payload`.
pub fn sign_sha256_hmac(payload: &[u8], secret: &str) -> Result<String, WebhookSignatureError> {
    let mut mac = new_mac(secret)?;
    mac.update(payload);
    let digest = mac.finalize().into_bytes();
    let hex = digest
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>();
    Ok(format!("sha256={hex}"))
}

fn new_mac(secret: &str) -> Result<Hmac<Sha256>, WebhookSignatureError> {
    if secret.is_empty() {
        return Err(WebhookSignatureError::EmptySecret);
    }
    Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| WebhookSignatureError::EmptySecret)
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, WebhookSignatureError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.is_ascii() || trimmed.len() % 2 != 0 {
        return Err(WebhookSignatureError::InvalidHex(trimmed.to_string()));
    }
    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    let mut index = 0usize;
    while index < trimmed.len() {
        let next = index.saturating_add(2);
        let chunk = &trimmed[index..next];
        let byte = u8::from_str_radix(chunk, 16)
            .map_err(|_| WebhookSignatureError::InvalidHex(chunk.to_string()))?;
        bytes.push(byte);
        index = next;
    }
    Ok(bytes)
}
