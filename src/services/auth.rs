// Login, registration and logout

use std::sync::Arc;

use crate::auth::{AuthResponse, Credential, LoginRequest, RegisterRequest, Role};
use crate::error::Result;
use crate::http_client::{ApiRequest, ClinicHttpClient};

pub struct AuthService {
    client: Arc<ClinicHttpClient>,
}

impl AuthService {
    pub fn new(client: Arc<ClinicHttpClient>) -> Self {
        Self { client }
    }

    /// Log in and store the credential under the role the server returns.
    /// Sessions of other roles are left in place.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;

        let response: AuthResponse = self
            .client
            .send_json(ApiRequest::post("/auth/login").json(body))
            .await?;

        self.remember(&response)?;
        tracing::info!(role = %response.role, username = %response.username, "Login successful");
        Ok(response)
    }

    /// Register a new account; the server logs it in straight away
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse> {
        let body = serde_json::to_value(request)?;

        let response: AuthResponse = self
            .client
            .send_json(ApiRequest::post("/auth/register").json(body))
            .await?;

        self.remember(&response)?;
        tracing::info!(role = %response.role, username = %response.username, "Registration successful");
        Ok(response)
    }

    fn remember(&self, response: &AuthResponse) -> Result<()> {
        let (role, credential) = Credential::from_auth_response(response);
        self.client.session().store_credential(role, &credential)?;
        Ok(())
    }

    /// Log out a single role
    pub fn logout(&self, role: Role) -> Result<()> {
        self.client.session().logout(role)?;
        Ok(())
    }

    /// Log out every role
    pub fn logout_all(&self) -> Result<()> {
        self.client.session().clear_all()?;
        Ok(())
    }
}
