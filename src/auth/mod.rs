// Authentication module
// Role-scoped credentials, their storage, and the session context the client reads from

mod credentials;
mod session;
mod store;
mod types;

pub use credentials::Credential;
pub use session::{Session, TokenSource};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::{
    AuthResponse, LoginRequest, ParseRoleError, RegisterRequest, Role, RoleScope, UserProfile,
    LEGACY_REFRESH_TOKEN_KEY, LEGACY_TOKEN_KEY, LEGACY_USER_KEY,
};
