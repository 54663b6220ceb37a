//! Authentication and authorization for Connector
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing with Argon2
//! - Caller resolution and ownership checks

pub mod access;
pub mod jwt;
pub mod password;

pub use access::{authenticate, require_owned, Caller};
pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenValidationResult};
pub use password::{hash_password, verify_password, MIN_PASSWORD_LEN};
