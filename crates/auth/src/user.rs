//! User accounts.
//!
//! `User` is the stored form and carries the password hash; it is never sent
//! over the wire. `UserView` is the sanitized projection every API response
//! uses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use safeaid_core::{DomainError, DomainResult, Email, Entity, FieldError, UserId};

use crate::password::validate_password_strength;
use crate::Role;

/// Stored user account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl User {
    /// Build the stored record for a validated registration.
    pub fn create(new: NewUser, password_hash: String, created_by: Option<UserId>, now: DateTime<Utc>) -> Self {
        Self {
            id: UserId::new(),
            username: new.username,
            email: new.email,
            password_hash,
            role: new.role,
            is_active: new.is_active,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Only active accounts may authenticate.
    pub fn can_authenticate(&self) -> bool {
        self.is_active
    }

    pub fn set_active(&mut self, is_active: bool, now: DateTime<Utc>) {
        self.is_active = is_active;
        self.updated_at = now;
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.to_string(),
            role: self.role,
            is_active: self.is_active,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Sanitized user: everything except credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for UserView {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Raw registration payload, as received.
///
/// Every field is optional so that missing and malformed fields are reported
/// together, one entry per field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// A validated registration, password still in plaintext (hash before storing).
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: Email,
    pub password: String,
    pub role: Role,
    pub is_active: bool,
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("is_active", &self.is_active)
            .finish_non_exhaustive()
    }
}

impl TryFrom<RegisterUser> for NewUser {
    type Error = DomainError;

    fn try_from(raw: RegisterUser) -> DomainResult<Self> {
        let mut errors = Vec::new();

        let username = raw.username.as_deref().map(str::trim).unwrap_or_default();
        if username.is_empty() {
            errors.push(FieldError::new("username", "username is required"));
        }

        let email = match raw.email.as_deref().map(Email::parse) {
            Some(Ok(email)) => Some(email),
            Some(Err(_)) => {
                errors.push(FieldError::new("email", "email is not valid"));
                None
            }
            None => {
                errors.push(FieldError::new("email", "email is required"));
                None
            }
        };

        let password = raw.password.unwrap_or_default();
        if let Err(DomainError::Validation(msg)) = validate_password_strength(&password) {
            errors.push(FieldError::new("password", msg));
        }

        let role = match raw.role.as_deref() {
            None => Some(Role::default()),
            Some(r) => match r.parse::<Role>() {
                Ok(role) => Some(role),
                Err(_) => {
                    errors.push(FieldError::new(
                        "role",
                        "role must be one of admin, field_agent, medical_staff, trainer",
                    ));
                    None
                }
            },
        };

        let is_active = match raw.status.as_deref().map(str::trim) {
            None | Some("active") => Some(true),
            Some("deActive") | Some("inactive") => Some(false),
            Some(_) => {
                errors.push(FieldError::new("status", "status must be 'active' or 'deActive'"));
                None
            }
        };

        DomainError::check_fields(errors)?;

        match (email, role, is_active) {
            (Some(email), Some(role), Some(is_active)) => Ok(NewUser {
                username: username.to_string(),
                email,
                password,
                role,
                is_active,
            }),
            _ => Err(DomainError::validation("registration payload is incomplete")),
        }
    }
}
