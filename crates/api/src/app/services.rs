//! Service wiring: stores, cipher, token signer and the application services.

use std::sync::Arc;

use safeaid_auth::{Hs256Jwt, User};
use safeaid_beneficiaries::StoredBeneficiary;
use safeaid_crypto::FieldCipher;
use safeaid_infra::{
    AccountService, BeneficiaryService, DocumentStore, InMemoryDocumentStore, TrainingService,
};
use safeaid_training::TrainingModule;

use crate::config::Settings;

/// The three document collections the API works against.
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn DocumentStore<User>>,
    pub beneficiaries: Arc<dyn DocumentStore<StoredBeneficiary>>,
    pub training: Arc<dyn DocumentStore<TrainingModule>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryDocumentStore::<User>::new()),
            beneficiaries: Arc::new(InMemoryDocumentStore::<StoredBeneficiary>::new()),
            training: Arc::new(InMemoryDocumentStore::<TrainingModule>::new()),
        }
    }

    #[cfg(feature = "postgres")]
    pub async fn postgres(database_url: &str) -> anyhow::Result<Self> {
        use safeaid_infra::store::{postgres::ensure_schema, PgDocumentStore};

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        ensure_schema(&pool).await?;

        Ok(Self {
            users: Arc::new(PgDocumentStore::<User>::new(pool.clone())),
            beneficiaries: Arc::new(PgDocumentStore::<StoredBeneficiary>::new(pool.clone())),
            training: Arc::new(PgDocumentStore::<TrainingModule>::new(pool)),
        })
    }

    /// Postgres when `DATABASE_URL` is set and the feature is enabled, else in-memory.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        #[cfg(feature = "postgres")]
        if let Some(url) = settings.database_url.as_deref() {
            tracing::info!("using postgres document store");
            return Self::postgres(url).await;
        }

        if settings.database_url.is_some() {
            tracing::warn!("DATABASE_URL is set but the postgres feature is disabled; using in-memory store");
        }
        Ok(Self::in_memory())
    }
}

#[derive(Clone)]
pub struct AppServices {
    pub accounts: AccountService,
    pub beneficiaries: BeneficiaryService,
    pub training: TrainingService,
}

impl AppServices {
    pub fn new(settings: &Settings, stores: Stores) -> anyhow::Result<Self> {
        let jwt = Arc::new(Hs256Jwt::new(settings.jwt_secret.as_bytes(), settings.token_ttl));
        let cipher = Arc::new(FieldCipher::from_secret(settings.field_encryption_key.as_bytes())?);

        Ok(Self {
            accounts: AccountService::new(stores.users, jwt.clone(), jwt),
            beneficiaries: BeneficiaryService::new(stores.beneficiaries, cipher),
            training: TrainingService::new(stores.training),
        })
    }
}
