use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{Role, RoleScope, Session};
use crate::error::ApiError;

/// Login entry point the user is sent to after a forced logout
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Invoked after a forced logout has cleared the session
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_path: &str);
}

/// Default redirect: nothing to navigate in a terminal, so just log it
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        tracing::warn!(login_path = %login_path, "Session ended, redirecting to login");
    }
}

/// A single outbound API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub scope: RoleScope,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            scope: RoleScope::Infer,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Declare the role explicitly instead of inferring it from the path
    pub fn role(mut self, role: Role) -> Self {
        self.scope = RoleScope::Role(role);
        self
    }

    /// Mark the call as not belonging to any role
    pub fn shared(mut self) -> Self {
        self.scope = RoleScope::Shared;
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP client for the clinic API with role-scoped authentication
pub struct ClinicHttpClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// API root, without trailing slash
    base_url: String,

    /// Credentials for every role
    session: Arc<Session>,

    /// Called after a forced logout
    redirect: Arc<dyn LoginRedirect>,

    login_path: String,
}

impl ClinicHttpClient {
    /// Create a new HTTP client
    pub fn new(
        base_url: &str,
        session: Arc<Session>,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .user_agent(concat!("clinic-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            redirect: Arc::new(LogRedirect),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        })
    }

    /// Replace the hook run after a forced logout
    pub fn with_login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    /// Build the outbound request with at most one bearer token attached
    pub fn build_request(&self, request: &ApiRequest) -> Result<Request, ApiError> {
        let url = join_url(&self.base_url, &request.path);
        let mut builder = self
            .client
            .request(request.method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let role = request.scope.resolve(&request.path);
        match self.session.select_token(role)? {
            Some((source, token)) => {
                tracing::debug!(
                    method = %request.method,
                    path = %request.path,
                    role = role.map(|r| r.as_str()).unwrap_or("none"),
                    token_source = %source,
                    token_length = token.len(),
                    "Attaching bearer token"
                );
                builder = builder.bearer_auth(token);
            }
            None => match role {
                Some(role) => {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        required_role = %role,
                        available = ?self.session.token_presence(),
                        "No token for required role, sending request without credentials"
                    );
                }
                None => {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        "No stored token, sending request without credentials"
                    );
                }
            },
        }

        Ok(builder.build()?)
    }

    /// Send a request and apply session handling to the response.
    /// No retries: every failure is returned to the caller.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let req = self.build_request(&request)?;
        let url = req.url().clone();

        tracing::debug!(method = %request.method, url = %url, "Sending HTTP request");

        let response = match self.client.execute(req).await {
            Ok(response) => response,
            Err(e) => {
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection_failed"
                } else if e.is_request() {
                    "request_error"
                } else if e.is_body() {
                    "body_error"
                } else {
                    "unknown"
                };

                tracing::error!(
                    error_kind = error_kind,
                    error = %e,
                    url = %url,
                    "HTTP request error"
                );
                return Err(ApiError::Http(e));
            }
        };

        tracing::debug!(status = %response.status(), "Received HTTP response");
        self.handle_response(response).await
    }

    /// Map a response to success or an error, forcing a logout on session failures
    pub async fn handle_response(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().clone();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    status = status.as_u16(),
                    url = %url,
                    error = %e,
                    "Failed to read error response body"
                );
                String::new()
            }
        };
        let message = error_message(status, &body);

        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::warn!(url = %url, "Received 401, clearing credentials");
                self.force_logout();
                Err(ApiError::Unauthorized(message))
            }
            StatusCode::FORBIDDEN if indicates_expiry(&body) => {
                tracing::warn!(url = %url, "Token expired, clearing credentials");
                self.force_logout();
                Err(ApiError::SessionExpired(message))
            }
            StatusCode::FORBIDDEN => {
                tracing::warn!(url = %url, response_body = %body, "Permission denied");
                Err(ApiError::Forbidden(message))
            }
            _ => {
                tracing::error!(
                    status = status.as_u16(),
                    url = %url,
                    response_body = %body,
                    "HTTP request failed with error response"
                );
                Err(ApiError::Api {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Clear every stored credential and send the user to the login entry point.
    /// Storage failures are logged; the redirect always runs.
    fn force_logout(&self) {
        if let Err(e) = self.session.clear_all() {
            tracing::error!(error = %e, "Could not clear every stored credential during logout");
        }
        self.redirect.redirect_to_login(&self.login_path);
    }

    /// Dispatch and decode a JSON response body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let response = self.dispatch(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Dispatch and discard the response body
    pub async fn send_empty(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.dispatch(request).await?;
        Ok(())
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }
}

/// Join the API root and a request path with exactly one slash between them
fn join_url(base_url: &str, path: &str) -> String {
    if path.is_empty() {
        return base_url.to_string();
    }
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Whether a 403 body reports an expired token rather than a permission problem
pub fn indicates_expiry(body: &str) -> bool {
    body.to_lowercase().contains("expired")
}

/// Human-readable message for an error response:
/// the JSON `message` (or `error`) field, else the raw body, else the status reason
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for field in ["message", "error"] {
            if let Some(msg) = json.get(field).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}
