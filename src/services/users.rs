// Admin user management (`/admin/users`)

use std::sync::Arc;

use crate::auth::Role;
use crate::error::Result;
use crate::http_client::{ApiRequest, ClinicHttpClient};
use crate::models::{ChangePasswordRequest, CreateUserRequest, UpdateUserRequest, User};

pub struct UserService {
    client: Arc<ClinicHttpClient>,
}

impl UserService {
    pub fn new(client: Arc<ClinicHttpClient>) -> Self {
        Self { client }
    }

    fn request(&self, request: ApiRequest) -> ApiRequest {
        request.role(Role::Admin)
    }

    /// All users, optionally filtered server-side by a search term
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<User>> {
        let mut request = ApiRequest::get("/admin/users");
        if let Some(term) = search.filter(|s| !s.is_empty()) {
            request = request.query("search", term);
        }
        self.client.send_json(self.request(request)).await
    }

    pub async fn search(&self, term: &str) -> Result<Vec<User>> {
        self.list(Some(term)).await
    }

    pub async fn get(&self, id: i64) -> Result<User> {
        self.client
            .send_json(self.request(ApiRequest::get(format!("/admin/users/{}", id))))
            .await
    }

    pub async fn create(&self, user: &CreateUserRequest) -> Result<User> {
        let body = serde_json::to_value(user)?;
        let created: User = self
            .client
            .send_json(self.request(ApiRequest::post("/admin/users").json(body)))
            .await?;
        tracing::info!(id = created.id, username = %created.username, "User created");
        Ok(created)
    }

    pub async fn update(&self, id: i64, user: &UpdateUserRequest) -> Result<User> {
        let body = serde_json::to_value(user)?;
        self.client
            .send_json(self.request(ApiRequest::put(format!("/admin/users/{}", id)).json(body)))
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client
            .send_empty(self.request(ApiRequest::delete(format!("/admin/users/{}", id))))
            .await?;
        tracing::info!(id = id, "User deleted");
        Ok(())
    }

    /// Enable a disabled account or disable an enabled one
    pub async fn toggle_status(&self, id: i64) -> Result<User> {
        self.client
            .send_json(self.request(ApiRequest::patch(format!(
                "/admin/users/{}/toggle-status",
                id
            ))))
            .await
    }

    /// Set a new password for a user. The response body is passed through as-is.
    pub async fn change_password(&self, id: i64, new_password: &str) -> Result<serde_json::Value> {
        let body = serde_json::to_value(ChangePasswordRequest {
            new_password: new_password.to_string(),
        })?;
        let response = self
            .client
            .dispatch(self.request(
                ApiRequest::patch(format!("/admin/users/{}/change-password", id)).json(body),
            ))
            .await?;

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text)))
    }
}
