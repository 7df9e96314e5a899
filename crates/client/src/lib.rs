//! `safeaid-client`
//!
//! **Responsibility:** client-side state for SafeAid front ends.
//!
//! This crate provides:
//! - a persisted session (token + signed-in user)
//! - a REST client covering every API endpoint
//! - resource caches for beneficiaries, training modules and users
//!
//! [`SafeAid`] owns all of it. It is built once at startup from the persisted
//! session and passed to whatever needs it; there is no global state. The API
//! remains the authority: caches are refetched after each mutation.

pub mod api;
pub mod cache;
pub mod error;
pub mod session;

use chrono::Utc;
use tracing::{info, warn};

use safeaid_auth::{RegisterUser, Role, UserView};
use safeaid_beneficiaries::{Beneficiary, BeneficiaryInput};
use safeaid_core::{BeneficiaryId, TrainingModuleId, UserId};
use safeaid_training::{TrainingInput, TrainingModule, SUGGESTED_CATEGORIES};

pub use api::{ApiClient, LoginResponse};
pub use cache::ResourceCache;
pub use error::{ClientError, ClientResult};
pub use session::{Session, SessionStore};

/// Application context.
#[derive(Debug)]
pub struct SafeAid {
    api: ApiClient,
    sessions: SessionStore,
    session: Option<Session>,
    /// Whether the training cache includes inactive modules.
    include_inactive_training: bool,
    pub beneficiaries: ResourceCache<Beneficiary>,
    pub training: ResourceCache<TrainingModule>,
    pub users: ResourceCache<UserView>,
}

impl SafeAid {
    /// Build the context, restoring any persisted session.
    pub fn new(base_url: impl Into<String>, sessions: SessionStore) -> ClientResult<Self> {
        let session = sessions.load()?;
        let mut api = ApiClient::new(base_url);
        api.set_token(session.as_ref().map(|s| s.token.clone()));

        if let Some(s) = &session {
            info!(user_id = %s.user.id, "restored session");
        }

        Ok(Self {
            api,
            sessions,
            session,
            include_inactive_training: false,
            beneficiaries: ResourceCache::new(),
            training: ResourceCache::new(),
            users: ResourceCache::new(),
        })
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_user(&self) -> Option<&UserView> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn role(&self) -> Option<Role> {
        self.current_user().map(|u| u.role)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// Show inactive modules in the training cache (trainer/admin views).
    pub fn set_include_inactive_training(&mut self, include: bool) {
        self.include_inactive_training = include;
    }

    // -------------------------
    // Session
    // -------------------------

    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<&UserView> {
        let LoginResponse { token, user } = self.api.login(email, password).await?;

        let session = Session { token, user };
        self.sessions.save(&session)?;
        self.api.set_token(Some(session.token.clone()));
        info!(user_id = %session.user.id, role = %session.user.role, "signed in");

        Ok(&self.session.insert(session).user)
    }

    /// Forget the session, locally and on disk, and drop cached data.
    pub fn logout(&mut self) -> ClientResult<()> {
        self.session = None;
        self.api.set_token(None);
        self.beneficiaries.clear();
        self.training.clear();
        self.users.clear();
        self.sessions.clear()
    }

    /// Re-read the signed-in user from the server.
    pub async fn refresh_me(&mut self) -> ClientResult<&UserView> {
        let api = self.api.clone();
        let user = self.guard(api.me()).await?;
        let session = self.session.as_mut().ok_or(ClientError::NotAuthenticated)?;
        session.user = user;
        self.sessions.save(session)?;
        Ok(&session.user)
    }

    /// Await an authenticated call; a 401 ends the session.
    async fn guard<T>(&mut self, call: impl Future<Output = ClientResult<T>>) -> ClientResult<T> {
        if self.session.is_none() {
            return Err(ClientError::NotAuthenticated);
        }

        match call.await {
            Err(e) if e.is_unauthorized() => {
                warn!("session rejected by server; signing out");
                self.logout()?;
                Err(e)
            }
            other => other,
        }
    }

    // -------------------------
    // Beneficiaries
    // -------------------------

    pub async fn refresh_beneficiaries(&mut self) -> ClientResult<&[Beneficiary]> {
        let api = self.api.clone();
        let items = self.guard(api.list_beneficiaries()).await?;
        self.beneficiaries.replace(items, Utc::now());
        Ok(self.beneficiaries.all())
    }

    pub async fn beneficiary(&mut self, id: BeneficiaryId) -> ClientResult<Beneficiary> {
        let api = self.api.clone();
        self.guard(api.get_beneficiary(id)).await
    }

    pub async fn create_beneficiary(&mut self, input: BeneficiaryInput) -> ClientResult<Beneficiary> {
        let api = self.api.clone();
        let created = self.guard(api.create_beneficiary(&input)).await?;
        self.refresh_beneficiaries().await?;
        Ok(created)
    }

    pub async fn update_beneficiary(&mut self, id: BeneficiaryId, input: BeneficiaryInput) -> ClientResult<Beneficiary> {
        let api = self.api.clone();
        let updated = self.guard(api.update_beneficiary(id, &input)).await?;
        self.refresh_beneficiaries().await?;
        Ok(updated)
    }

    pub async fn delete_beneficiary(&mut self, id: BeneficiaryId) -> ClientResult<()> {
        let api = self.api.clone();
        self.guard(api.delete_beneficiary(id)).await?;
        self.refresh_beneficiaries().await?;
        Ok(())
    }

    // -------------------------
    // Training
    // -------------------------

    pub async fn refresh_training(&mut self) -> ClientResult<&[TrainingModule]> {
        let include_inactive = self.include_inactive_training;
        let api = self.api.clone();
        let items = self.guard(api.list_training(include_inactive, None)).await?;
        self.training.replace(items, Utc::now());
        Ok(self.training.all())
    }

    pub async fn training_module(&mut self, id: TrainingModuleId) -> ClientResult<TrainingModule> {
        let api = self.api.clone();
        self.guard(api.get_training(id)).await
    }

    pub async fn create_training(&mut self, input: TrainingInput) -> ClientResult<TrainingModule> {
        check_category(input.category.as_deref())?;
        let api = self.api.clone();
        let created = self.guard(api.create_training(&input)).await?;
        self.refresh_training().await?;
        Ok(created)
    }

    pub async fn update_training(&mut self, id: TrainingModuleId, input: TrainingInput) -> ClientResult<TrainingModule> {
        if input.category.is_some() {
            check_category(input.category.as_deref())?;
        }
        let api = self.api.clone();
        let updated = self.guard(api.update_training(id, &input)).await?;
        self.refresh_training().await?;
        Ok(updated)
    }

    pub async fn delete_training(&mut self, id: TrainingModuleId) -> ClientResult<()> {
        let api = self.api.clone();
        self.guard(api.delete_training(id)).await?;
        self.refresh_training().await?;
        Ok(())
    }

    // -------------------------
    // Users
    // -------------------------

    pub async fn refresh_users(&mut self) -> ClientResult<&[UserView]> {
        let api = self.api.clone();
        let items = self.guard(api.list_users()).await?;
        self.users.replace(items, Utc::now());
        Ok(self.users.all())
    }

    pub async fn register_user(&mut self, user: RegisterUser) -> ClientResult<UserView> {
        let api = self.api.clone();
        let created = self.guard(api.register(&user)).await?;
        self.refresh_users().await?;
        Ok(created)
    }

    pub async fn set_user_status(&mut self, id: UserId, is_active: bool) -> ClientResult<UserView> {
        let api = self.api.clone();
        let user = self.guard(api.set_user_status(id, is_active)).await?;
        self.refresh_users().await?;
        Ok(user)
    }

    pub async fn delete_user(&mut self, id: UserId) -> ClientResult<()> {
        let api = self.api.clone();
        self.guard(api.delete_user(id)).await?;
        self.refresh_users().await?;
        Ok(())
    }
}

/// Categories are a closed list on the client.
fn check_category(category: Option<&str>) -> ClientResult<()> {
    match category.map(str::trim) {
        Some(c) if SUGGESTED_CATEGORIES.contains(&c) => Ok(()),
        _ => Err(ClientError::Invalid(format!(
            "category must be one of {}",
            SUGGESTED_CATEGORIES.join(", ")
        ))),
    }
}
