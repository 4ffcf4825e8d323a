use crate::{error::StoreError, storage::StoreState};
use std::sync::Arc;

/// Local store key holding the bearer token.
pub const TOKEN_KEY: &str = "token";
/// Local store key holding the (raw, possibly quoted) role string.
pub const ROLE_KEY: &str = "role";

/// Session
///
/// The viewer's ambient credentials as they sit in the local store. The role is
/// kept raw; only the guard's taxonomy decides what it means.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub role: Option<String>,
}

impl Session {
    pub fn new(token: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            role: Some(role.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The token to send as `Authorization: Bearer`, if a non-blank one is stored.
    pub fn bearer(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer().is_some()
    }
}

/// SessionProvider
///
/// Injectable access to the ambient session, so the guard and the resolver can
/// be exercised without a real browser store.
pub trait SessionProvider: Send + Sync {
    fn get(&self) -> Session;

    fn set(&self, session: Session) -> Result<(), StoreError>;

    fn clear(&self);
}

/// StoredSession
///
/// `SessionProvider` over a `KeyValueStore`, using the `token` and `role` keys.
pub struct StoredSession {
    store: StoreState,
}

impl StoredSession {
    pub fn new(store: StoreState) -> Self {
        Self { store }
    }
}

impl SessionProvider for StoredSession {
    fn get(&self) -> Session {
        Session {
            token: self.store.get(TOKEN_KEY),
            role: self.store.get(ROLE_KEY),
        }
    }

    /// Writes the token, then the role, as two separate store operations.
    /// A failure on the second write leaves the new token in place.
    fn set(&self, session: Session) -> Result<(), StoreError> {
        match session.token {
            Some(token) => self.store.set(TOKEN_KEY, token)?,
            None => self.store.remove(TOKEN_KEY),
        }
        match session.role {
            Some(role) => self.store.set(ROLE_KEY, role)?,
            None => self.store.remove(ROLE_KEY),
        }
        Ok(())
    }

    fn clear(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(ROLE_KEY);
    }
}

/// SessionState
///
/// The concrete type used to share session access across the client.
pub type SessionState = Arc<dyn SessionProvider>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore};

    #[test]
    fn set_get_clear_round_trip_through_store() {
        let store: StoreState = Arc::new(MemoryStore::new());
        let sessions = StoredSession::new(store.clone());

        sessions
            .set(Session::new("t1", "\"ROLE_STUDENT\""))
            .unwrap();
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("t1"));
        assert_eq!(sessions.get().role.as_deref(), Some("\"ROLE_STUDENT\""));

        sessions.clear();
        assert_eq!(sessions.get(), Session::anonymous());
    }

    #[test]
    fn blank_token_is_not_a_bearer() {
        let session = Session {
            token: Some("   ".to_string()),
            role: None,
        };
        assert_eq!(session.bearer(), None);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn role_write_failure_keeps_token() {
        // Room for the token entry but not for the role entry.
        let store: StoreState = Arc::new(MemoryStore::with_quota(12));
        let sessions = StoredSession::new(store.clone());

        let result = sessions.set(Session::new("abcdef", "ROLE_EMPLOYER"));
        assert!(matches!(result, Err(StoreError::QuotaExceeded { .. })));
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("abcdef"));
        assert_eq!(store.get(ROLE_KEY), None);
    }
}
