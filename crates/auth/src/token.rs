//! Signed session tokens.
//!
//! JWT-shaped: `base64url(header).base64url(claims).base64url(sig)` with an
//! HMAC-SHA256 signature over the first two segments. Validation is a pure
//! gate — it returns `None` for anything malformed, forged, or expired, and
//! deliberately does not say which.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use supportdesk_core::user::{SessionClaims, User};
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Fixed session lifetime: one hour.
pub const TOKEN_TTL_SECS: i64 = 3600;

const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Issues and validates session tokens against a process-wide signing key.
pub struct SessionSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl SessionSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
            ttl: Duration::seconds(TOKEN_TTL_SECS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length.
        HmacSha256::new_from_slice(&self.key).expect("HMAC accepts any key length")
    }

    /// Issue a signed token for `user`, expiring `ttl` from now.
    pub fn issue(&self, user: &User) -> String {
        let claims = SessionClaims {
            email: user.email.clone(),
            sub: user.id,
            exp: (Utc::now() + self.ttl).timestamp(),
        };
        // SessionClaims serialization cannot fail: plain strings and ints.
        let payload = serde_json::to_string(&claims).unwrap_or_default();

        let head = URL_SAFE_NO_PAD.encode(HEADER);
        let body = URL_SAFE_NO_PAD.encode(payload);
        let signing_input = format!("{head}.{body}");

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        format!("{signing_input}.{sig}")
    }

    /// Validate a presented token. `None` if absent, malformed,
    /// signature-invalid, or expired — no detail about which.
    pub fn validate(&self, token: &str) -> Option<SessionClaims> {
        let mut parts = token.split('.');
        let head = parts.next()?;
        let body = parts.next()?;
        let sig = parts.next()?;
        if parts.next().is_some() {
            return None;
        }

        let sig_bytes = URL_SAFE_NO_PAD.decode(sig).ok()?;
        let mut mac = self.mac();
        mac.update(format!("{head}.{body}").as_bytes());
        if mac.verify_slice(&sig_bytes).is_err() {
            debug!("Token signature verification failed");
            return None;
        }

        let payload = URL_SAFE_NO_PAD.decode(body).ok()?;
        let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
        if claims.is_expired(Utc::now()) {
            debug!("Token expired");
            return None;
        }
        Some(claims)
    }

    /// Extract a bearer token from an `Authorization` header value and
    /// validate it.
    pub fn validate_bearer(&self, header: &str) -> Option<SessionClaims> {
        self.validate(header.strip_prefix("Bearer ")?)
    }
}
