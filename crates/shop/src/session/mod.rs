//! Session gate.
//!
//! The gate answers "may the current holder enter protected flows?" from the
//! bearer token kept in storage. It never authenticates anyone itself; the
//! token is issued by the auth backend and only stored, read, and discarded
//! here.
//!
//! # State Machine
//!
//! ```text
//! NoToken --store_token--> Valid --expired / undecodable on check--> NoToken
//! ```
//!
//! There is no retained "expired" state: a check that finds an expired or
//! malformed token clears it, and every later check reports unauthenticated
//! until a new token is stored.

mod claims;
mod route;

pub use claims::{TokenClaims, TokenError, decode_claims};
pub use route::{Route, RouteDecision};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::storage::{KeyValueStore, StorageError, keys};

/// Token-backed session gate.
#[derive(Clone)]
pub struct SessionGate {
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for SessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGate")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl SessionGate {
    /// Create a gate reading its token from `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Store a freshly issued token, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be written to storage.
    pub fn store_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.save(keys::TOKEN, token)?;
        tracing::debug!("Stored session token");
        Ok(())
    }

    /// The raw stored token, without any validity check.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.raw_token().map(SecretString::from)
    }

    /// Discard the stored token.
    pub fn logout(&self) {
        self.discard();
        tracing::info!("Logged out");
    }

    /// Whether a token is present and its `exp` claim is in the future.
    ///
    /// An expired or undecodable token is discarded as a side effect.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// [`Self::is_authenticated`] evaluated at `now`.
    #[must_use]
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        let Some(token) = self.raw_token() else {
            return false;
        };

        match decode_claims(&token) {
            Ok(claims) if claims.is_valid_at(now) => true,
            Ok(claims) => {
                tracing::info!(exp = claims.exp, "Session token expired");
                self.discard();
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Invalid session token format");
                self.discard();
                false
            }
        }
    }

    /// Claims of the stored token, if present and decodable.
    ///
    /// Expiry is not checked and nothing is discarded.
    #[must_use]
    pub fn current_user(&self) -> Option<TokenClaims> {
        let token = self.raw_token()?;
        match decode_claims(&token) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!(error = %e, "Failed to decode session token");
                None
            }
        }
    }

    /// The token to send as a bearer credential, only if the session is valid.
    #[must_use]
    pub fn bearer(&self) -> Option<SecretString> {
        if self.is_authenticated() {
            self.token()
        } else {
            None
        }
    }

    /// Decide whether `route` may be entered now.
    #[must_use]
    pub fn enter(&self, route: Route) -> RouteDecision {
        self.enter_at(route, Utc::now())
    }

    /// [`Self::enter`] evaluated at `now`.
    #[must_use]
    pub fn enter_at(&self, route: Route, now: DateTime<Utc>) -> RouteDecision {
        if !route.requires_auth() || self.is_authenticated_at(now) {
            RouteDecision::Allow
        } else {
            tracing::debug!(route = route.path(), "Redirecting to login");
            RouteDecision::RedirectToLogin
        }
    }

    fn raw_token(&self) -> Option<String> {
        match self.storage.load(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session token");
                None
            }
        }
    }

    fn discard(&self) {
        if let Err(e) = self.storage.clear(keys::TOKEN) {
            tracing::warn!(error = %e, "Failed to clear session token");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;
    use serde_json::json;

    use super::claims::tests::token_with;
    use super::*;
    use crate::storage::MemoryStore;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn gate() -> (SessionGate, MemoryStore) {
        let storage = MemoryStore::new();
        (SessionGate::new(Arc::new(storage.clone())), storage)
    }

    #[test]
    fn test_no_token_is_unauthenticated() {
        let (gate, _) = gate();
        assert!(!gate.is_authenticated_at(at(0)));
        assert!(gate.current_user().is_none());
        assert!(gate.token().is_none());
    }

    #[test]
    fn test_unexpired_token_is_authenticated() {
        let (gate, _) = gate();
        gate.store_token(&token_with(&json!({ "id": "u1", "exp": 2_000 })))
            .unwrap();

        assert!(gate.is_authenticated_at(at(1_000)));
        assert!(gate.is_authenticated_at(at(1_999)));
        assert_eq!(
            gate.current_user().and_then(|c| c.user_id()).as_deref(),
            Some("u1")
        );
    }

    #[test]
    fn test_expired_token_is_discarded() {
        let (gate, storage) = gate();
        gate.store_token(&token_with(&json!({ "exp": 1_000 })))
            .unwrap();

        // Decodable but expired: still visible to current_user before a check.
        assert!(gate.current_user().is_some());

        assert!(!gate.is_authenticated_at(at(1_000)));
        assert!(storage.load(keys::TOKEN).unwrap().is_none());
        assert!(gate.current_user().is_none());

        // Stays unauthenticated even if the clock were rewound.
        assert!(!gate.is_authenticated_at(at(0)));
    }

    #[test]
    fn test_malformed_token_is_discarded() {
        let (gate, storage) = gate();
        gate.store_token("not-a-token").unwrap();

        assert!(gate.current_user().is_none());
        assert!(storage.load(keys::TOKEN).unwrap().is_some());

        assert!(!gate.is_authenticated_at(at(0)));
        assert!(storage.load(keys::TOKEN).unwrap().is_none());
    }

    #[test]
    fn test_new_token_after_invalidation() {
        let (gate, _) = gate();
        gate.store_token("garbage").unwrap();
        assert!(!gate.is_authenticated_at(at(10)));

        gate.store_token(&token_with(&json!({ "exp": 100 }))).unwrap();
        assert!(gate.is_authenticated_at(at(10)));
    }

    #[test]
    fn test_logout_clears_token() {
        let (gate, _) = gate();
        gate.store_token(&token_with(&json!({ "exp": 100 }))).unwrap();
        gate.logout();
        assert!(gate.token().is_none());
        assert!(!gate.is_authenticated_at(at(10)));
    }

    #[test]
    fn test_token_exposes_raw_value() {
        let (gate, _) = gate();
        let token = token_with(&json!({ "exp": 100 }));
        gate.store_token(&token).unwrap();
        assert_eq!(gate.token().unwrap().expose_secret(), token);
    }

    #[test]
    fn test_enter_protected_route() {
        let (gate, _) = gate();
        assert_eq!(
            gate.enter_at(Route::Checkout, at(10)),
            RouteDecision::RedirectToLogin
        );
        assert_eq!(gate.enter_at(Route::Cart, at(10)), RouteDecision::Allow);

        gate.store_token(&token_with(&json!({ "exp": 100 }))).unwrap();
        assert_eq!(gate.enter_at(Route::Checkout, at(10)), RouteDecision::Allow);
        assert_eq!(
            gate.enter_at(Route::Dashboard, at(100)),
            RouteDecision::RedirectToLogin
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let (gate, _) = gate();
        gate.store_token("secret.token.value").unwrap();
        assert!(!format!("{gate:?}").contains("secret.token.value"));
    }
}
