//! HS256 bearer tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use safeaid_core::UserId;

use crate::{validate_claims, JwtClaims, Role, TokenValidationError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is malformed or has a bad signature: {0}")]
    Invalid(String),

    #[error("token has expired")]
    Expired,

    #[error(transparent)]
    Claims(#[from] TokenValidationError),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// A freshly signed token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: JwtClaims,
}

/// Verifies bearer tokens.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError>;
}

/// Mints bearer tokens.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;
}

/// Shared-secret HS256 implementation of both halves.
#[derive(Clone)]
pub struct Hs256Jwt {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl Hs256Jwt {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }
}

impl core::fmt::Debug for Hs256Jwt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Jwt").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenIssuer for Hs256Jwt {
    fn issue(&self, user_id: UserId, role: Role, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let claims = JwtClaims::new(user_id, role, now, self.ttl);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(IssuedToken { token, claims })
    }
}

impl JwtValidator for Hs256Jwt {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<JwtClaims>(token, &self.decoding, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        })?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt(secret: &str) -> Hs256Jwt {
        Hs256Jwt::new(secret, Duration::days(7))
    }

    #[test]
    fn issued_token_validates_to_same_identity() {
        let jwt = jwt("test-secret");
        let user = UserId::new();
        let now = Utc::now();

        let issued = jwt.issue(user, Role::Admin, now).unwrap();
        let claims = jwt.validate(&issued.token, now).unwrap();

        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, Duration::days(7).num_seconds());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = Utc::now();
        let issued = jwt("secret1").issue(UserId::new(), Role::Trainer, now).unwrap();
        let err = jwt("secret2").validate(&issued.token, now).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        let err = jwt("s").validate("not.a.token", Utc::now()).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = jwt("s");
        let long_ago = Utc::now() - Duration::days(30);
        let issued = jwt.issue(UserId::new(), Role::FieldAgent, long_ago).unwrap();
        let err = jwt.validate(&issued.token, Utc::now()).unwrap_err();
        assert_eq!(err, TokenError::Expired);
    }

    #[test]
    fn explicit_clock_past_expiry_is_rejected() {
        let jwt = jwt("s");
        let now = Utc::now();
        let issued = jwt.issue(UserId::new(), Role::FieldAgent, now).unwrap();
        let err = jwt.validate(&issued.token, now + Duration::days(8)).unwrap_err();
        assert_eq!(err, TokenError::Claims(TokenValidationError::Expired));
    }
}
