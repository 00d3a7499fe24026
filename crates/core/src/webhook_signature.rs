//! Verification of signed provider webhooks.
//!
//! The provider signs each callback with HMAC-SHA256 over
//! `"{timestamp}.{raw_body}"` using the decoded bytes of a `whsec_<base64>`
//! secret. The signature header carries one or more space-separated
//! candidates of the form `v1,<base64 digest>`; a callback is authentic if
//! any candidate matches.
//!
//! Without a configured secret the verifier runs in relaxed mode and accepts
//! every callback. That mode exists for local development only and is
//! reported as a security gap by callers.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::types::Timestamp;

/// Header carrying the space-separated signature candidates.
pub const SIGNATURE_HEADER: &str = "webhook-signature";

/// Header carrying the unix timestamp (seconds) that was signed.
pub const TIMESTAMP_HEADER: &str = "webhook-timestamp";

/// Default tolerated clock skew between signing and receipt.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("webhook secret is not valid base64 key material")]
    InvalidSecret,

    #[error("signature header is missing or has no candidates")]
    MissingSignature,

    #[error("timestamp header is missing or not an integer")]
    InvalidTimestamp,

    #[error("timestamp is outside the tolerated window")]
    StaleTimestamp,

    #[error("no signature candidate matches")]
    Mismatch,
}

/// Decoded webhook signing key.
#[derive(Clone)]
pub struct WebhookSecret {
    key: Vec<u8>,
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(<redacted>)")
    }
}

impl WebhookSecret {
    /// Parse a `whsec_<base64>` secret. A bare base64 string is accepted too.
    pub fn parse(raw: &str) -> Result<Self, SignatureError> {
        let raw = raw.trim();
        let encoded = raw.split_once('_').map_or(raw, |(_, key)| key);
        let key = BASE64
            .decode(encoded)
            .map_err(|_| SignatureError::InvalidSecret)?;
        if key.is_empty() {
            return Err(SignatureError::InvalidSecret);
        }
        Ok(Self { key })
    }

    pub fn from_bytes(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    fn mac(&self, timestamp: &str, body: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body.as_bytes());
        mac
    }

    /// Compute the base64 signature for `timestamp` and `body`.
    pub fn sign(&self, timestamp: &str, body: &str) -> String {
        BASE64.encode(self.mac(timestamp, body).finalize().into_bytes())
    }
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The signature matched the configured secret.
    Verified,
    /// No secret is configured; the callback was accepted unchecked.
    Skipped,
}

/// Verifies callback signatures against an optional secret.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    secret: Option<WebhookSecret>,
    tolerance_secs: Option<i64>,
}

impl SignatureVerifier {
    /// `tolerance_secs = None` disables the timestamp freshness check.
    pub fn new(secret: Option<WebhookSecret>, tolerance_secs: Option<i64>) -> Self {
        Self {
            secret,
            tolerance_secs,
        }
    }

    /// Verifier that accepts every callback.
    pub fn relaxed() -> Self {
        Self::new(None, None)
    }

    pub fn is_enforcing(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(
        &self,
        body: &str,
        signature_header: &str,
        timestamp_header: &str,
        now: Timestamp,
    ) -> Result<Verification, SignatureError> {
        let Some(secret) = &self.secret else {
            return Ok(Verification::Skipped);
        };

        let timestamp = timestamp_header.trim();
        let signed_at: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp)?;
        if let Some(tolerance) = self.tolerance_secs {
            if (now.timestamp() - signed_at).abs() > tolerance {
                return Err(SignatureError::StaleTimestamp);
            }
        }

        let candidates: Vec<&str> = signature_header
            .split(' ')
            .filter_map(|part| part.split_once(',').map(|(_, sig)| sig))
            .filter(|sig| !sig.is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(SignatureError::MissingSignature);
        }

        let mac = secret.mac(timestamp, body);
        let matched = candidates.into_iter().any(|candidate| {
            BASE64
                .decode(candidate)
                .is_ok_and(|digest| mac.clone().verify_slice(&digest).is_ok())
        });

        if matched {
            Ok(Verification::Verified)
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const BODY: &str = r#"{"id":"abc123","status":"succeeded","output":["https://cdn/img.png"]}"#;

    fn secret() -> WebhookSecret {
        WebhookSecret::parse(&format!("whsec_{}", BASE64.encode(b"super-secret-key"))).unwrap()
    }

    fn now() -> Timestamp {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn verifier() -> SignatureVerifier {
        SignatureVerifier::new(Some(secret()), Some(DEFAULT_TOLERANCE_SECS))
    }

    fn header_for(body: &str, ts: &str) -> String {
        format!("v1,{}", secret().sign(ts, body))
    }

    #[test]
    fn valid_signature_is_verified() {
        let ts = "1700000000";
        let result = verifier().verify(BODY, &header_for(BODY, ts), ts, now());
        assert_eq!(result, Ok(Verification::Verified));
    }

    #[test]
    fn any_matching_candidate_is_accepted() {
        let ts = "1700000000";
        let header = format!("v1,AAAA v1,{}", secret().sign(ts, BODY));
        assert_eq!(
            verifier().verify(BODY, &header, ts, now()),
            Ok(Verification::Verified)
        );
    }

    #[test]
    fn tampered_body_with_stale_signature_is_rejected() {
        let ts = "1700000000";
        let header = header_for(BODY, ts);
        let tampered = BODY.replace("img.png", "evil.png");
        assert_eq!(
            verifier().verify(&tampered, &header, ts, now()),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let ts = "1700000000";
        let other = WebhookSecret::from_bytes(b"another-key".to_vec());
        let header = format!("v1,{}", other.sign(ts, BODY));
        assert_eq!(
            verifier().verify(BODY, &header, ts, now()),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn header_without_candidates_is_rejected() {
        let ts = "1700000000";
        assert_eq!(
            verifier().verify(BODY, "", ts, now()),
            Err(SignatureError::MissingSignature)
        );
        assert_eq!(
            verifier().verify(BODY, "garbage", ts, now()),
            Err(SignatureError::MissingSignature)
        );
    }

    #[test]
    fn malformed_timestamp_is_rejected() {
        let header = header_for(BODY, "yesterday");
        assert_eq!(
            verifier().verify(BODY, &header, "yesterday", now()),
            Err(SignatureError::InvalidTimestamp)
        );
    }

    #[test]
    fn old_timestamp_is_rejected() {
        let ts = "1699990000";
        assert_eq!(
            verifier().verify(BODY, &header_for(BODY, ts), ts, now()),
            Err(SignatureError::StaleTimestamp)
        );
    }

    #[test]
    fn tolerance_can_be_disabled() {
        let ts = "1600000000";
        let v = SignatureVerifier::new(Some(secret()), None);
        assert_eq!(
            v.verify(BODY, &header_for(BODY, ts), ts, now()),
            Ok(Verification::Verified)
        );
    }

    #[test]
    fn relaxed_mode_accepts_anything() {
        let v = SignatureVerifier::relaxed();
        assert!(!v.is_enforcing());
        assert_eq!(
            v.verify(BODY, "", "", now()),
            Ok(Verification::Skipped)
        );
    }

    #[test]
    fn secret_requires_base64_key_material() {
        assert_eq!(
            WebhookSecret::parse("whsec_!!!").unwrap_err(),
            SignatureError::InvalidSecret
        );
        assert_eq!(
            WebhookSecret::parse("whsec_").unwrap_err(),
            SignatureError::InvalidSecret
        );
    }

    #[test]
    fn secret_debug_is_redacted() {
        assert_eq!(format!("{:?}", secret()), "WebhookSecret(<redacted>)");
    }
}
