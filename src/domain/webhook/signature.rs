//! Webhook signature verification.
//!
//! The provider sends `intuit-signature: base64(HMAC-SHA256(raw body, verifier token))`.
//! The HMAC is computed over the exact request body bytes and compared in
//! constant time.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::domain::foundation::IntegrationError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "intuit-signature";

/// Verifier bound to the shared webhook verifier token.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: SecretString,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Checks `signature_header` against the body.
    ///
    /// # Errors
    ///
    /// `IntegrationError::Signature` when the header is missing, not base64,
    /// or does not match.
    pub fn verify(&self, payload: &[u8], signature_header: Option<&str>) -> Result<(), IntegrationError> {
        verify(payload, signature_header, self.secret.expose_secret())
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

/// Computes the raw HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Result<Vec<u8>, IntegrationError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| IntegrationError::signature(format!("invalid key: {}", e)))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Hex HMAC of the body compared against the base64-decoded header as hex.
pub fn verify(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: &str,
) -> Result<(), IntegrationError> {
    let header = signature_header
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| IntegrationError::signature("missing signature header"))?;

    let provided = STANDARD
        .decode(header)
        .map(hex::encode)
        .map_err(|_| IntegrationError::signature("signature is not valid base64"))?;

    let expected = hex::encode(compute_signature(payload, secret.as_bytes())?);

    if !constant_time_compare(expected.as_bytes(), provided.as_bytes()) {
        tracing::warn!(payload_len = payload.len(), "Invalid webhook signature");
        return Err(IntegrationError::signature("signature mismatch"));
    }

    Ok(())
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Builds the header value the provider would send for `payload`.
#[cfg(test)]
pub fn sign_for_test(payload: &[u8], secret: &str) -> String {
    STANDARD.encode(compute_signature(payload, secret.as_bytes()).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &str = "verifier-token-123";
    const BODY: &[u8] = br#"{"eventNotifications":[{"realmId":"1","dataChangeEvent":{"entities":[]}}]}"#;

    #[test]
    fn accepts_correct_signature() {
        let header = sign_for_test(BODY, SECRET);
        assert!(verify(BODY, Some(&header), SECRET).is_ok());
    }

    #[test]
    fn rejects_missing_header() {
        let err = verify(BODY, None, SECRET).unwrap_err();
        assert!(matches!(err, IntegrationError::Signature(_)));

        assert!(verify(BODY, Some("  "), SECRET).is_err());
    }

    #[test]
    fn rejects_non_base64_header() {
        let err = verify(BODY, Some("***not base64***"), SECRET).unwrap_err();
        assert!(err.to_string().contains("base64"));
    }

    #[test]
    fn rejects_signature_for_other_secret() {
        let header = sign_for_test(BODY, "other-secret");
        assert!(verify(BODY, Some(&header), SECRET).is_err());
    }

    #[test]
    fn verifier_struct_delegates() {
        let verifier = WebhookVerifier::new(SECRET);
        let header = sign_for_test(BODY, SECRET);
        assert!(verifier.verify(BODY, Some(&header)).is_ok());
        assert!(verifier.verify(b"tampered", Some(&header)).is_err());
        assert!(!format!("{:?}", verifier).contains(SECRET));
    }

    proptest! {
        #[test]
        fn any_single_byte_body_mutation_is_rejected(index in 0usize..BODY.len(), delta in 1u8..=255) {
            let header = sign_for_test(BODY, SECRET);
            let mut tampered = BODY.to_vec();
            tampered[index] = tampered[index].wrapping_add(delta);
            prop_assert!(verify(&tampered, Some(&header), SECRET).is_err());
        }

        #[test]
        fn any_single_byte_secret_mutation_is_rejected(index in 0usize..SECRET.len(), replacement in proptest::char::range('a', 'z')) {
            let header = sign_for_test(BODY, SECRET);
            let mut secret: Vec<char> = SECRET.chars().collect();
            prop_assume!(secret[index] != replacement);
            secret[index] = replacement;
            let secret: String = secret.into_iter().collect();
            prop_assert!(verify(BODY, Some(&header), &secret).is_err());
        }
    }
}
