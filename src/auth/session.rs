// Session context: role-scoped credentials over a key-value store

use anyhow::{Context, Result};
use std::fmt;
use std::sync::Arc;

use super::credentials::Credential;
use super::store::{KeyValueStore, MemoryStore};
use super::types::{Role, UserProfile, LEGACY_REFRESH_TOKEN_KEY, LEGACY_TOKEN_KEY, LEGACY_USER_KEY};

/// Where the token attached to a request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// The token of the role the request is scoped to
    Role(Role),

    /// First stored role in preference order, for an unscoped request
    Fallback(Role),

    /// The legacy unscoped key
    Legacy,
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Role(role) => write!(f, "{}", role.token_key()),
            TokenSource::Fallback(role) => write!(f, "{} (fallback)", role.token_key()),
            TokenSource::Legacy => write!(f, "{} (default fallback)", LEGACY_TOKEN_KEY),
        }
    }
}

/// Credentials for every role, shared by the HTTP client and the services
pub struct Session {
    store: Arc<dyn KeyValueStore>,
}

impl Session {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Session that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Non-empty value stored under `key`
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.store.get(key)?.filter(|v| !v.is_empty()))
    }

    /// Access token of a role
    pub fn token(&self, role: Role) -> Result<Option<String>> {
        self.read(&role.token_key())
    }

    /// Full credential of a role
    pub fn credential(&self, role: Role) -> Result<Option<Credential>> {
        let Some(access_token) = self.token(role)? else {
            return Ok(None);
        };

        let refresh_token = self.read(&role.refresh_token_key())?;
        let user = match self.read(&role.user_key())? {
            Some(json) => match serde_json::from_str::<UserProfile>(&json) {
                Ok(user) => Some(user),
                Err(e) => {
                    tracing::warn!(role = %role, error = %e, "Ignoring unreadable cached profile");
                    None
                }
            },
            None => None,
        };

        Ok(Some(Credential {
            access_token,
            refresh_token,
            user,
        }))
    }

    /// Save the credential of a role, replacing any previous one
    pub fn store_credential(&self, role: Role, credential: &Credential) -> Result<()> {
        self.store
            .set(&role.token_key(), &credential.access_token)?;

        match &credential.refresh_token {
            Some(refresh) => self.store.set(&role.refresh_token_key(), refresh)?,
            None => self.store.remove(&role.refresh_token_key())?,
        }

        match &credential.user {
            Some(user) => {
                let json = serde_json::to_string(user).context("Failed to serialize user profile")?;
                self.store.set(&role.user_key(), &json)?;
            }
            None => self.store.remove(&role.user_key())?,
        }

        tracing::info!(role = %role, "Stored credential");
        Ok(())
    }

    pub fn legacy_token(&self) -> Result<Option<String>> {
        self.read(LEGACY_TOKEN_KEY)
    }

    pub fn set_legacy_token(&self, token: &str) -> Result<()> {
        self.store.set(LEGACY_TOKEN_KEY, token)
    }

    /// Pick the token to attach to a request.
    ///
    /// With a target role only that role's token qualifies; another role's token
    /// would be rejected by the server's access control anyway. Without a target
    /// the roles are tried in preference order, then the legacy key.
    pub fn select_token(&self, target: Option<Role>) -> Result<Option<(TokenSource, String)>> {
        if let Some(role) = target {
            return Ok(self.token(role)?.map(|t| (TokenSource::Role(role), t)));
        }

        for role in Role::ALL {
            if let Some(token) = self.token(role)? {
                return Ok(Some((TokenSource::Fallback(role), token)));
            }
        }

        Ok(self.legacy_token()?.map(|t| (TokenSource::Legacy, t)))
    }

    /// Roles that currently hold a token
    pub fn active_roles(&self) -> Result<Vec<Role>> {
        let mut roles = Vec::new();
        for role in Role::ALL {
            if self.token(role)?.is_some() {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    /// Explicit logout of one role; other roles stay signed in
    pub fn logout(&self, role: Role) -> Result<()> {
        self.store.remove(&role.token_key())?;
        self.store.remove(&role.refresh_token_key())?;
        self.store.remove(&role.user_key())?;
        tracing::info!(role = %role, "Logged out");
        Ok(())
    }

    /// Remove every credential: all roles and the legacy keys.
    /// Every key is attempted even if an earlier removal fails; the first failure is returned.
    pub fn clear_all(&self) -> Result<()> {
        let mut keys: Vec<String> = [LEGACY_TOKEN_KEY, LEGACY_REFRESH_TOKEN_KEY, LEGACY_USER_KEY]
            .iter()
            .map(|k| k.to_string())
            .collect();
        for role in Role::ALL {
            keys.push(role.token_key());
            keys.push(role.refresh_token_key());
            keys.push(role.user_key());
        }

        let mut first_error = None;
        for key in &keys {
            if let Err(e) = self.store.remove(key) {
                tracing::error!(key = %key, error = %e, "Failed to remove stored credential");
                if first_error.is_none() {
                    first_error = Some(e.context(format!("Failed to remove {}", key)));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::debug!("Cleared all stored credentials");
                Ok(())
            }
        }
    }

    /// Which tokens are present, for diagnostics
    pub(crate) fn token_presence(&self) -> Vec<(String, bool)> {
        let mut presence: Vec<(String, bool)> = Role::ALL
            .into_iter()
            .map(|role| (role.token_key(), matches!(self.token(role), Ok(Some(_)))))
            .collect();
        presence.push((
            LEGACY_TOKEN_KEY.to_string(),
            matches!(self.legacy_token(), Ok(Some(_))),
        ));
        presence
    }

    /// Underlying store
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }
}
