//! Signed media token: a short-lived capability bound to one viewer and one
//! lecture.
//!
//! Token format: `base64url(claims_json) "." base64url(hmac_sha256(secret,
//! claims_json))`. The claims carry the lecture, the viewer, and a unix
//! expiry timestamp; verification checks the MAC in constant time before it
//! ever looks at the contents, then checks expiry against the clock. The
//! token is opaque to clients -- validity is only ever established here, at
//! use time.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use aula_core::{LectureId, UserId};

type HmacSha256 = Hmac<Sha256>;

/// Claims embedded in a signed media token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaClaims {
    pub lecture_id: LectureId,
    pub viewer_id: UserId,
    /// Expiry as unix seconds.
    pub exp: i64,
}

/// Why a token failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Malformed, or the signature does not match.
    Invalid,
    /// Well-formed and authentic, but past its expiry.
    Expired,
}

/// HMAC-SHA256 signer/verifier for media tokens.
pub struct MediaTokenSigner {
    secret: Vec<u8>,
}

impl MediaTokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign claims into an opaque URL-safe token.
    pub fn sign(&self, claims: &MediaClaims) -> String {
        let payload = serde_json::to_vec(claims).expect("claims serialize to JSON");
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(&payload);
        let tag = mac.finalize().into_bytes();

        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(&payload),
            URL_SAFE_NO_PAD.encode(tag)
        )
    }

    /// Verify a token and return its claims.
    ///
    /// The MAC is checked (in constant time) before expiry, so a forged
    /// token is always `Invalid` even when it also carries a stale expiry.
    pub fn verify(&self, token: &str) -> Result<MediaClaims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify against an explicit clock (unix seconds).
    pub fn verify_at(&self, token: &str, now: i64) -> Result<MediaClaims, TokenError> {
        let (payload_b64, tag_b64) = token.split_once('.').ok_or(TokenError::Invalid)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| TokenError::Invalid)?;
        let tag = URL_SAFE_NO_PAD
            .decode(tag_b64)
            .map_err(|_| TokenError::Invalid)?;

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts any key length");
        mac.update(&payload);
        mac.verify_slice(&tag).map_err(|_| TokenError::Invalid)?;

        let claims: MediaClaims =
            serde_json::from_slice(&payload).map_err(|_| TokenError::Invalid)?;

        if claims.exp < now {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

/// Generate a random hex signing secret (32 bytes).
pub fn generate_secret() -> String {
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}
