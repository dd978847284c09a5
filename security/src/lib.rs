// security/src/lib.rs
//! Authentication and authorization for NeoCare: Argon2 password hashing,
//! HS256 session tokens, the role access policy and the per-request context.

pub mod auth;
pub mod context;
pub mod errors;
pub mod portal;
pub mod roles;

pub use auth::{create_user, hash_password, login, verify_password, Claims, IssuedToken, JwtKeys, LoginResponse, TokenKind};
pub use context::{Principal, RequestContext};
pub use errors::{AuthError, AuthResult};
pub use portal::{portal_login, PortalLogin, PortalSession};
pub use roles::{AccessPolicy, AccessRule, Permission};
