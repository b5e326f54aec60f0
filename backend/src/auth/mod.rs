//! Credentials: password hashes and bearer tokens.

pub mod jwt;
pub mod password;

pub use jwt::{bearer_token, Claims, JwtManager};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
