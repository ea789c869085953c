// Per-role credential record

use std::fmt;

use super::types::{AuthResponse, Role, UserProfile};

/// Credential stored for a single role
#[derive(Clone, PartialEq)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            user: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_user(mut self, user: UserProfile) -> Self {
        self.user = Some(user);
        self
    }

    /// Build the credential a successful login or registration produces,
    /// together with the role it must be stored under
    pub fn from_auth_response(response: &AuthResponse) -> (Role, Self) {
        let credential = Self {
            access_token: response.token.clone(),
            refresh_token: response.refresh_token.clone(),
            user: Some(response.profile()),
        };
        (response.role, credential)
    }
}

// Tokens never end up in logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &format_args!("<{} chars>", self.access_token.len()))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .finish()
    }
}
