// Authentication types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unscoped token key kept for sessions created before per-role storage
pub const LEGACY_TOKEN_KEY: &str = "token";
pub const LEGACY_REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const LEGACY_USER_KEY: &str = "user";

/// Account role on the clinic API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    /// Preference order used when a request is not scoped to any role
    pub const ALL: [Role; 3] = [Role::Admin, Role::Doctor, Role::Patient];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Doctor => "DOCTOR",
            Role::Patient => "PATIENT",
        }
    }

    /// Path segment that marks an endpoint as belonging to this role
    pub fn path_segment(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/",
            Role::Doctor => "/doctor/",
            Role::Patient => "/patient/",
        }
    }

    /// Derive the role from a request path.
    /// Segments are checked in preference order, so `/admin/doctor/1` is an admin path.
    pub fn from_path(path: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| path.contains(role.path_segment()))
    }

    pub fn token_key(&self) -> String {
        format!("token_{}", self.as_str())
    }

    pub fn refresh_token_key(&self) -> String {
        format!("refreshToken_{}", self.as_str())
    }

    pub fn user_key(&self) -> String {
        format!("user_{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role \"{0}\" (expected ADMIN, DOCTOR or PATIENT)")]
pub struct ParseRoleError(pub String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "DOCTOR" => Ok(Role::Doctor),
            "PATIENT" => Ok(Role::Patient),
            _ => Err(ParseRoleError(s.to_string())),
        }
    }
}

/// Which credential a request is allowed to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleScope {
    /// Derive the role from the request path
    #[default]
    Infer,

    /// Caller declared the role; only that role's credential may be attached
    Role(Role),

    /// Not tied to a role (shared endpoints such as login)
    Shared,
}

impl RoleScope {
    /// Resolve the scope for a concrete path
    pub fn resolve(&self, path: &str) -> Option<Role> {
        match self {
            RoleScope::Infer => Role::from_path(path),
            RoleScope::Role(role) => Some(*role),
            RoleScope::Shared => None,
        }
    }
}

/// Cached profile of the logged-in account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// `POST /auth/login` request
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/register` request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
}

/// Response of login and register
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub role: Role,
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl AuthResponse {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            full_name: self.full_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_role_from_path() {
        assert_eq!(Role::from_path("/admin/users"), Some(Role::Admin));
        assert_eq!(Role::from_path("/admin/users/3/toggle-status"), Some(Role::Admin));
        assert_eq!(Role::from_path("/doctor/appointments"), Some(Role::Doctor));
        assert_eq!(Role::from_path("/patient/bookings"), Some(Role::Patient));
        assert_eq!(Role::from_path("/auth/login"), None);
        assert_eq!(Role::from_path(""), None);
    }

    #[test]
    fn test_role_from_path_requires_full_segment() {
        // No trailing slash, so not a role segment
        assert_eq!(Role::from_path("/admin"), None);
        assert_eq!(Role::from_path("/administrators/list"), None);
    }

    #[test]
    fn test_role_from_path_prefers_admin() {
        assert_eq!(Role::from_path("/admin/feedbacks/doctor/7"), Some(Role::Admin));
        assert_eq!(Role::from_path("/doctor/patients/1/patient/x"), Some(Role::Doctor));
    }

    #[test]
    fn test_storage_keys() {
        assert_eq!(Role::Admin.token_key(), "token_ADMIN");
        assert_eq!(Role::Doctor.refresh_token_key(), "refreshToken_DOCTOR");
        assert_eq!(Role::Patient.user_key(), "user_PATIENT");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" Doctor ".parse::<Role>(), Ok(Role::Doctor));
        assert_eq!("PATIENT".parse::<Role>(), Ok(Role::Patient));
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_uppercase() {
        assert_eq!(serde_json::to_string(&Role::Doctor).unwrap(), "\"DOCTOR\"");
        let role: Role = serde_json::from_str("\"PATIENT\"").unwrap();
        assert_eq!(role, Role::Patient);
    }

    #[test]
    fn test_scope_resolution() {
        assert_eq!(RoleScope::Infer.resolve("/admin/users"), Some(Role::Admin));
        assert_eq!(
            RoleScope::Role(Role::Doctor).resolve("/admin/users"),
            Some(Role::Doctor)
        );
        assert_eq!(RoleScope::Shared.resolve("/admin/users"), None);
    }

    #[test]
    fn test_auth_response_deserialize() {
        let body = r#"{
            "token": "abc",
            "refreshToken": "def",
            "role": "DOCTOR",
            "id": 12,
            "username": "house",
            "email": "house@clinic.test",
            "fullName": "Gregory House"
        }"#;
        let resp: AuthResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.role, Role::Doctor);
        assert_eq!(resp.refresh_token.as_deref(), Some("def"));
        assert_eq!(resp.profile().full_name.as_deref(), Some("Gregory House"));
    }

    #[test]
    fn test_auth_response_without_optional_fields() {
        let body = r#"{"token":"t","role":"ADMIN","id":1,"username":"root","email":"r@x"}"#;
        let resp: AuthResponse = serde_json::from_str(body).unwrap();
        assert!(resp.refresh_token.is_none());
        assert!(resp.full_name.is_none());
    }

    proptest! {
        #[test]
        fn prop_role_segment_fixes_role(
            prefix in "[a-z0-9-]{0,8}",
            suffix in "[a-z0-9/-]{0,16}",
            idx in 0usize..3,
        ) {
            prop_assume!(Role::ALL.iter().all(|r| !r.as_str().eq_ignore_ascii_case(&prefix)));
            let role = Role::ALL[idx];
            let path = format!("/{prefix}{}{suffix}", role.path_segment());
            // A suffix may contain another segment; only later roles can lose to it
            let derived = Role::from_path(&path);
            prop_assert!(derived.is_some());
            prop_assert!(derived.unwrap() <= role);
            if !suffix.contains('/') {
                prop_assert_eq!(derived, Some(role));
            }
        }

        #[test]
        fn prop_paths_without_segments_have_no_role(path in "[a-z0-9-]{0,12}(/[a-z0-9-]{1,8}){0,4}") {
            prop_assume!(!path.contains("/admin/") && !path.contains("/doctor/") && !path.contains("/patient/"));
            prop_assert_eq!(Role::from_path(&path), None);
        }
    }
}
