//! Bridge to the authentication collaborator.
//!
//! Login, signup and credential persistence live elsewhere. The only contract
//! with the store is the current bearer credential, published through a
//! [`tokio::sync::watch`] channel: [`AuthHandle`] is the publishing side,
//! [`SessionWatch`] is what a store reads before every operation.

use std::{fmt, sync::Arc};

use tokio::sync::watch;

/// Bearer credential of the signed-in user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    user_id: String,
    token: String,
}

impl Credential {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }

    /// Identity the store scopes its cache by.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user_id", &self.user_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct AuthHandle {
    tx: Arc<watch::Sender<Option<Credential>>>,
}

impl Default for AuthHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn with_credential(credential: Credential) -> Self {
        let handle = Self::new();
        handle.sign_in(credential);
        handle
    }

    pub fn sign_in(&self, credential: Credential) {
        tracing::debug!(user_id = credential.user_id(), "credential published");
        self.tx.send_replace(Some(credential));
    }

    pub fn sign_out(&self) {
        tracing::debug!("credential cleared");
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<Credential> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> SessionWatch {
        SessionWatch {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the credential channel.
#[derive(Clone, Debug)]
pub struct SessionWatch {
    rx: watch::Receiver<Option<Credential>>,
}

impl SessionWatch {
    pub fn current(&self) -> Option<Credential> {
        self.rx.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watchers_see_sign_in_and_sign_out() {
        let auth = AuthHandle::new();
        let session = auth.subscribe();
        assert!(session.current().is_none());

        auth.sign_in(Credential::new("alice", "t-alice"));
        assert_eq!(
            session.current().map(|c| c.user_id().to_string()),
            Some("alice".to_string())
        );

        auth.sign_out();
        assert!(session.current().is_none());
    }

    #[test]
    fn debug_output_hides_the_token() {
        let credential = Credential::new("alice", "super-secret");
        let printed = format!("{credential:?}");
        assert!(printed.contains("alice"));
        assert!(!printed.contains("super-secret"));
    }
}
