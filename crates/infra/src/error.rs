use thiserror::Error;

use safeaid_auth::{PasswordError, TokenError};
use safeaid_core::DomainError;
use safeaid_crypto::CipherError;

use crate::store::StoreError;

/// Error returned by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("field encryption failed: {0}")]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("email and password are required")]
    MissingCredentials,

    /// Unknown email, wrong password and inactive account all look the same.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email is already registered")]
    DuplicateCredential,

    /// A valid token whose account no longer exists or is inactive.
    #[error("account is not active")]
    InactiveAccount,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("background task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for ServiceError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServiceError::Join(err.to_string())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
