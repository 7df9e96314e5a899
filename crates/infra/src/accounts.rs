//! Account service: registration, login, token authentication and user admin.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use safeaid_auth::{
    hash_password, verify_password, JwtValidator, NewUser, PasswordError, RegisterUser, Role, TokenIssuer, User,
    UserView,
};
use safeaid_core::{Email, UserId};

use crate::error::{ServiceError, ServiceResult};
use crate::store::{DocumentStore, StoreError};

/// Successful login: a bearer token plus the sanitized account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserView,
    pub expires_at: DateTime<Utc>,
}

/// Credentials for the first admin account, created at startup when missing.
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Argon2 hash of a throwaway password, computed on first use.
fn decoy_hash() -> Result<&'static str, PasswordError> {
    static DECOY: OnceLock<String> = OnceLock::new();
    if let Some(hash) = DECOY.get() {
        return Ok(hash);
    }
    let hash = hash_password("safeaid-decoy-password")?;
    Ok(DECOY.get_or_init(|| hash))
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn DocumentStore<User>>,
    issuer: Arc<dyn TokenIssuer>,
    validator: Arc<dyn JwtValidator>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn DocumentStore<User>>,
        issuer: Arc<dyn TokenIssuer>,
        validator: Arc<dyn JwtValidator>,
    ) -> Self {
        Self {
            users,
            issuer,
            validator,
        }
    }

    /// Create an account on behalf of `created_by` (an admin).
    #[instrument(skip(self, raw), err)]
    pub async fn register(&self, raw: RegisterUser, created_by: Option<UserId>, now: DateTime<Utc>) -> ServiceResult<UserView> {
        let new = NewUser::try_from(raw)?;

        if self.users.find_by_unique_key(new.email.as_str()).await?.is_some() {
            return Err(ServiceError::DuplicateCredential);
        }

        let password = new.password.clone();
        let hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;
        let user = User::create(new, hash, created_by, now);

        let user = match self.users.insert(user).await {
            Ok(user) => user,
            // Lost a race with a concurrent registration of the same email.
            Err(StoreError::Duplicate { .. }) => return Err(ServiceError::DuplicateCredential),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user.view())
    }

    /// Exchange credentials for a token.
    ///
    /// Every failure after the presence check is `InvalidCredentials`.
    #[instrument(skip_all, err)]
    pub async fn login(&self, email: Option<&str>, password: Option<&str>, now: DateTime<Utc>) -> ServiceResult<LoginOutcome> {
        let (email, password) = match (email.map(str::trim), password) {
            (Some(e), Some(p)) if !e.is_empty() && !p.is_empty() => (e, p.to_string()),
            _ => return Err(ServiceError::MissingCredentials),
        };

        let user = match Email::parse(email) {
            Ok(email) => self.users.find_by_unique_key(email.as_str()).await?,
            Err(_) => None,
        };

        // Unknown emails are checked against a decoy hash so every attempt
        // costs one Argon2 verification.
        let stored = user.as_ref().map(|u| u.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || match stored {
            Some(stored) => verify_password(&password, &stored),
            None => verify_password(&password, decoy_hash()?).map(|_| false),
        })
        .await??;

        let Some(user) = user.filter(|u| matches && u.can_authenticate()) else {
            warn!("login rejected");
            return Err(ServiceError::InvalidCredentials);
        };

        let issued = self.issuer.issue(user.id, user.role, now)?;
        let expires_at = issued.claims.expires_at().unwrap_or(now);

        info!(user_id = %user.id, "login succeeded");
        Ok(LoginOutcome {
            token: issued.token,
            user: user.view(),
            expires_at,
        })
    }

    /// Resolve a bearer token to a live, active account.
    ///
    /// The role is taken from the stored account, not the token, so role changes
    /// and deactivation apply to tokens already issued.
    pub async fn authenticate(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<User> {
        let claims = self.validator.validate(token, now)?;
        match self.users.get(claims.sub).await? {
            Some(user) if user.can_authenticate() => Ok(user),
            _ => Err(ServiceError::InactiveAccount),
        }
    }

    pub async fn get_user(&self, id: UserId) -> ServiceResult<UserView> {
        self.users
            .get(id)
            .await?
            .map(|u| u.view())
            .ok_or(ServiceError::NotFound("user"))
    }

    pub async fn list_users(&self) -> ServiceResult<Vec<UserView>> {
        Ok(self.users.list().await?.iter().map(User::view).collect())
    }

    #[instrument(skip(self), err)]
    pub async fn set_status(&self, actor: UserId, id: UserId, is_active: bool, now: DateTime<Utc>) -> ServiceResult<UserView> {
        if actor == id && !is_active {
            return Err(ServiceError::Conflict("you cannot deactivate your own account".to_string()));
        }

        let mut user = self.users.get(id).await?.ok_or(ServiceError::NotFound("user"))?;
        user.set_active(is_active, now);
        if !self.users.replace(user.clone()).await? {
            return Err(ServiceError::NotFound("user"));
        }

        info!(user_id = %id, is_active, "user status updated");
        Ok(user.view())
    }

    #[instrument(skip(self), err)]
    pub async fn delete_user(&self, actor: UserId, id: UserId) -> ServiceResult<()> {
        if actor == id {
            return Err(ServiceError::Conflict("you cannot delete your own account".to_string()));
        }
        if !self.users.delete(id).await? {
            return Err(ServiceError::NotFound("user"));
        }
        info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Create the first admin while the user collection is still empty.
    ///
    /// Returns `None` when any account already exists.
    pub async fn bootstrap_admin(&self, admin: BootstrapAdmin, now: DateTime<Utc>) -> ServiceResult<Option<UserView>> {
        if !self.users.list().await?.is_empty() {
            return Ok(None);
        }

        let raw = RegisterUser {
            username: Some(admin.username),
            email: Some(admin.email),
            password: Some(admin.password),
            role: Some(Role::Admin.as_str().to_string()),
            status: None,
        };

        match self.register(raw, None, now).await {
            Ok(view) => {
                info!(user_id = %view.id, "bootstrap admin created");
                Ok(Some(view))
            }
            Err(ServiceError::DuplicateCredential) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
