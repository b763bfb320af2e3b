//! In-memory user directory.
//!
//! Thread-safe via `std::sync::RwLock` (non-async, held briefly, never
//! across an await point). Registration performs its uniqueness check and
//! insert under one write guard, so concurrent registrations racing on the
//! same email cannot both succeed.

use std::collections::HashMap;
use std::sync::RwLock;

use supportdesk_core::error::AuthError;
use supportdesk_core::user::{User, UserSummary};
use tracing::info;
use uuid::Uuid;

#[derive(Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<Uuid, User>>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a user. Email comparison is exact and case-sensitive.
    pub fn register(&self, email: &str, credential: &str) -> Result<Uuid, AuthError> {
        if email.is_empty() || credential.is_empty() {
            return Err(AuthError::InvalidInput);
        }

        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        if users.values().any(|u| u.email == email) {
            return Err(AuthError::DuplicateUser);
        }

        let user = User::new(email, credential);
        let id = user.id;
        users.insert(id, user);
        info!(user_id = %id, "User registered");
        Ok(id)
    }

    /// Match email and credential exactly; return the live user record.
    pub fn authenticate(&self, email: &str, credential: &str) -> Result<User, AuthError> {
        if email.is_empty() || credential.is_empty() {
            return Err(AuthError::InvalidInput);
        }

        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        users
            .values()
            .find(|u| u.email == email && u.credential == credential)
            .cloned()
            .ok_or(AuthError::InvalidCredentials)
    }

    /// Read-only projection for listing; excludes credentials.
    pub fn list(&self) -> Vec<UserSummary> {
        let users = self.users.read().unwrap_or_else(|e| e.into_inner());
        let mut summaries: Vec<UserSummary> = users.values().map(UserSummary::from).collect();
        // HashMap iteration order is arbitrary; keep listings deterministic.
        summaries.sort_by(|a, b| a.email.cmp(&b.email));
        summaries
    }

    /// Remove a user. Missing ids are an error for the caller to report,
    /// not a fault — deletion is idempotent-safe to retry.
    pub fn delete(&self, id: Uuid) -> Result<(), AuthError> {
        let mut users = self.users.write().unwrap_or_else(|e| e.into_inner());
        match users.remove(&id) {
            Some(user) => {
                info!(user_id = %id, email = %user.email, "User deleted");
                Ok(())
            }
            None => Err(AuthError::UserNotFound(id)),
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn register_and_authenticate() {
        let dir = UserDirectory::new();
        let id = dir.register("a@x.com", "p").unwrap();
        let user = dir.authenticate("a@x.com", "p").unwrap();
        assert_eq!(user.id, id);
    }

    #[test]
    fn empty_fields_rejected() {
        let dir = UserDirectory::new();
        assert_eq!(dir.register("", "p"), Err(AuthError::InvalidInput));
        assert_eq!(dir.register("a@x.com", ""), Err(AuthError::InvalidInput));
        assert!(matches!(
            dir.authenticate("", "p"),
            Err(AuthError::InvalidInput)
        ));
    }

    #[test]
    fn duplicate_email_rejected_case_sensitively() {
        let dir = UserDirectory::new();
        dir.register("a@x.com", "p").unwrap();
        assert_eq!(dir.register("a@x.com", "q"), Err(AuthError::DuplicateUser));
        // Emails compare byte-for-byte; case is significant.
        assert!(dir.register("A@x.com", "p").is_ok());
    }

    #[test]
    fn wrong_credential_rejected() {
        let dir = UserDirectory::new();
        dir.register("a@x.com", "p").unwrap();
        assert!(matches!(
            dir.authenticate("a@x.com", "wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            dir.authenticate("b@x.com", "p"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn list_excludes_credentials_and_sorts() {
        let dir = UserDirectory::new();
        dir.register("b@x.com", "p").unwrap();
        dir.register("a@x.com", "p").unwrap();
        let listed = dir.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].email, "a@x.com");
    }

    #[test]
    fn delete_missing_user_is_not_found() {
        let dir = UserDirectory::new();
        assert!(matches!(
            dir.delete(Uuid::new_v4()),
            Err(AuthError::UserNotFound(_))
        ));
    }

    #[test]
    fn delete_then_reregister_same_email() {
        let dir = UserDirectory::new();
        let id = dir.register("a@x.com", "p").unwrap();
        dir.delete(id).unwrap();
        assert!(dir.register("a@x.com", "p").is_ok());
    }

    #[test]
    fn concurrent_registrations_race_yields_one_winner() {
        let dir = Arc::new(UserDirectory::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let dir = dir.clone();
            handles.push(std::thread::spawn(move || {
                dir.register("race@x.com", "p").is_ok()
            }));
        }
        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(dir.len(), 1);
    }
}
