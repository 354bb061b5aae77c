//! Authentication module for Notekeeper
//!
//! - Password hashing with bcrypt
//! - JWT access and refresh tokens with single-use refresh rotation
//! - Session guard resolving the caller of a request
//! - Account flows (register, login, profile)

mod guard;
mod jwt;
mod password;
mod service;
mod tokens;

pub use guard::SessionGuard;
pub use jwt::{
    generate_access_token, generate_refresh_token, verify_token, Claims, JwtError, TokenType,
};
pub use password::{PasswordError, PasswordHasher};
pub use service::AuthService;
pub use tokens::{TokenError, TokenService};
