//! # Credential Store
//!
//! The signed-in identity and its bearer token.
//!
//! Token storage belongs to the host application; the client only needs
//! `get`/`set`/`clear`. [`InMemoryCredentialStore`] covers tests and the
//! command-line storefront.

use std::sync::RwLock;

use harvest_core::{AuthResponse, User};

/// Bearer token plus the identity it was issued for.
#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub token: String,
    pub user: User,
}

impl Credential {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Credential {
            token: token.into(),
            user,
        }
    }

    /// Extracts a credential from a successful sign-in or sign-up.
    ///
    /// Returns `None` for rejected responses or when either the token or the
    /// user is missing.
    pub fn from_auth_response(response: &AuthResponse) -> Option<Self> {
        if !response.success {
            return None;
        }
        Some(Credential {
            token: response.token.clone()?,
            user: response.user.clone()?,
        })
    }
}

/// Opaque storage for the current credential.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Credential);
    fn clear(&self);

    /// Current bearer token, if signed in.
    fn token(&self) -> Option<String> {
        self.get().map(|credential| credential.token)
    }
}

/// Process-local credential store.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    current: RwLock<Option<Credential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, credential: Credential) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credential);
    }

    fn clear(&self) {
        *self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_core::UserType;

    fn customer() -> User {
        User {
            user_id: 1,
            name: "Test Customer".to_string(),
            email: "customer@test.com".to_string(),
            user_type: UserType::Customer,
        }
    }

    #[test]
    fn test_store_set_get_clear() {
        let store = InMemoryCredentialStore::new();
        assert!(store.get().is_none());

        store.set(Credential::new("tok", customer()));
        assert_eq!(store.token().as_deref(), Some("tok"));

        store.clear();
        assert!(store.token().is_none());
    }

    #[test]
    fn test_from_auth_response() {
        let granted = AuthResponse::granted("tok".to_string(), customer());
        let credential = Credential::from_auth_response(&granted).unwrap();
        assert_eq!(credential.user.email, "customer@test.com");

        let denied = AuthResponse::denied("Invalid email or password");
        assert!(Credential::from_auth_response(&denied).is_none());
    }
}
