//! `safeaid-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it knows how to
//! hash and check passwords, mint and verify tokens, and decide whether a role
//! may pass a gate. Looking users up is the caller's job.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod password;
pub mod roles;
pub mod user;

pub use authorize::{authorize, policy, AuthzError, RoleGate};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use jwt::{Hs256Jwt, IssuedToken, JwtValidator, TokenError, TokenIssuer};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordError};
pub use roles::Role;
pub use user::{NewUser, RegisterUser, User, UserView};
