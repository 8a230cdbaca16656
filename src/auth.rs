//! Token Authentication
//!
//! When authorization is enabled, every `/api/v1/keys` request must carry
//! `Authorization: Token <token>`. Tokens are obtained from `/api/v1/login`
//! with one of the configured users' credentials.
//!
//! The token registry has its own lock and never touches the store engine.

use crate::config::User;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

/// Set of tokens issued since startup.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    tokens: RwLock<HashSet<String>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `token` as valid. Registering the same token twice is a no-op.
    pub fn register(&self, token: impl Into<String>) {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(token.into());
    }

    /// Returns true if `token` was registered.
    pub fn is_valid_token(&self, token: &str) -> bool {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Checks credentials against the configured users and issues tokens.
#[derive(Debug)]
pub struct Authenticator {
    users: Vec<User>,
    secret_key: String,
    registry: TokenRegistry,
}

impl Authenticator {
    pub fn new(users: Vec<User>, secret_key: impl Into<String>) -> Self {
        Self {
            users,
            secret_key: secret_key.into(),
            registry: TokenRegistry::new(),
        }
    }

    /// Issues a token for a known user, or `None` for bad credentials.
    ///
    /// The token is the hex SHA-256 of login, secret key and password, so
    /// the same user always receives the same token.
    pub fn login(&self, login: &str, password: &str) -> Option<String> {
        let user = self
            .users
            .iter()
            .find(|u| u.login == login && u.password == password);

        let Some(user) = user else {
            debug!(login, "Rejected login");
            return None;
        };

        let token = issue_token(&user.login, &self.secret_key, &user.password);
        self.registry.register(token.clone());
        info!(login, "User logged in");
        Some(token)
    }

    /// Returns true if `token` was issued by [`login`](Self::login).
    pub fn is_valid_token(&self, token: &str) -> bool {
        self.registry.is_valid_token(token)
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }
}

fn issue_token(login: &str, secret_key: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(login.as_bytes());
    hasher.update(secret_key.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}
