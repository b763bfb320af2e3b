//! User and session types.
//!
//! `User` records are owned exclusively by the auth crate's directory; the
//! credential never crosses the API boundary — `UserSummary` is the only
//! outward projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user.
///
/// Invariant: no two live users share an email (exact, case-sensitive match).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub credential: String,
}

impl User {
    pub fn new(email: impl Into<String>, credential: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            credential: credential.into(),
        }
    }
}

/// Read-only projection of a user, safe to list over the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Claims embedded in a signed session token.
///
/// Never persisted — fully reconstructible from the token itself. A token is
/// valid iff its signature verifies against the process-wide signing key and
/// `now < exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub email: String,
    /// The user id.
    pub sub: Uuid,
    /// Expiry as a unix timestamp (seconds).
    pub exp: i64,
}

impl SessionClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}
