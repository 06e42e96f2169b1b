//! Bearer token issuance and verification.
//!
//! Tokens are self-contained HS256 JWTs carrying `{sub, iat, exp}`.
//! There is no server-side session table; logout works by comparing a
//! token's `iat` against the user's persisted `issued_at` watermark.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the token subject.
    pub sub: String,

    /// Issuance time, unix seconds.
    pub iat: i64,

    /// Expiration time, unix seconds.
    pub exp: i64,
}

impl Claims {
    /// Session cutover check: the token survives an `issued_at`
    /// watermark when the user has none yet, or when the token was
    /// issued at or after it. `>=` (not `>`) is required so that the
    /// token minted during the same second as its own cutover stamp
    /// remains valid.
    #[must_use]
    pub fn outlives(&self, issued_at_watermark: Option<i64>) -> bool {
        issued_at_watermark.is_none_or(|watermark| self.iat >= watermark)
    }
}

/// Why a token failed verification. Callers must not let the
/// distinction reach the client; both cases surface as the same 401.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or has a bad signature")]
    Malformed,

    #[error("token has expired")]
    Expired,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl TokenCodec {
    #[must_use]
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: ttl_days * 24 * 60 * 60,
        }
    }

    /// Sign a token for `subject` issued at `iat`.
    pub fn issue(&self, subject: &str, iat: i64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp: iat + self.ttl_seconds,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Malformed)
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })
    }

    #[must_use]
    pub fn now() -> i64 {
        Utc::now().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> TokenCodec {
        TokenCodec::new("test-secret", 7)
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let codec = codec();
        let iat = TokenCodec::now();

        let token = codec.issue("alice", iat).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iat, iat);
        assert_eq!(claims.exp, iat + 7 * 24 * 60 * 60);
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let codec = codec();
        let iat = TokenCodec::now() - 8 * 24 * 60 * 60;

        let token = codec.issue("alice", iat).unwrap();
        assert!(matches!(codec.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn garbage_and_tampered_tokens_are_malformed() {
        let codec = codec();

        assert!(matches!(
            codec.verify("not.a.jwt"),
            Err(TokenError::Malformed)
        ));

        // Signed with a different secret.
        let other = TokenCodec::new("other-secret", 7);
        let token = other.issue("alice", TokenCodec::now()).unwrap();
        assert!(matches!(codec.verify(&token), Err(TokenError::Malformed)));
    }

    #[test]
    fn cutover_uses_inclusive_comparison() {
        let claims = Claims {
            sub: "alice".to_string(),
            iat: 1_000,
            exp: 2_000,
        };

        assert!(claims.outlives(None));
        assert!(claims.outlives(Some(999)));
        // Token minted in the same tick as the cutover stays valid.
        assert!(claims.outlives(Some(1_000)));
        assert!(!claims.outlives(Some(1_001)));
    }
}
