//! Beneficiary service.
//!
//! Sensitive fields are encrypted before they reach the store and decrypted
//! before they leave this service; callers only ever see plaintext.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, instrument};

use safeaid_beneficiaries::{Beneficiary, BeneficiaryDetails, BeneficiaryInput, BeneficiaryPatch, StoredBeneficiary};
use safeaid_core::{BeneficiaryId, UserId};
use safeaid_crypto::FieldCipher;

use crate::error::{ServiceError, ServiceResult};
use crate::store::DocumentStore;

#[derive(Clone)]
pub struct BeneficiaryService {
    store: Arc<dyn DocumentStore<StoredBeneficiary>>,
    cipher: Arc<FieldCipher>,
}

impl BeneficiaryService {
    pub fn new(store: Arc<dyn DocumentStore<StoredBeneficiary>>, cipher: Arc<FieldCipher>) -> Self {
        Self { store, cipher }
    }

    fn open(&self, stored: &StoredBeneficiary) -> ServiceResult<Beneficiary> {
        stored.open(&self.cipher).map_err(|e| {
            error!(beneficiary_id = %stored.id, error = %e, "stored beneficiary could not be decrypted");
            ServiceError::from(e)
        })
    }

    #[instrument(skip(self, input), err)]
    pub async fn create(&self, input: BeneficiaryInput, created_by: UserId, now: DateTime<Utc>) -> ServiceResult<Beneficiary> {
        let details = BeneficiaryDetails::try_from(input)?;
        let stored = StoredBeneficiary::seal(details, created_by, now, &self.cipher)?;
        let stored = self.store.insert(stored).await?;

        info!(beneficiary_id = %stored.id, "beneficiary created");
        self.open(&stored)
    }

    pub async fn list(&self) -> ServiceResult<Vec<Beneficiary>> {
        self.store.list().await?.iter().map(|b| self.open(b)).collect()
    }

    pub async fn get(&self, id: BeneficiaryId) -> ServiceResult<Beneficiary> {
        let stored = self.store.get(id).await?.ok_or(ServiceError::NotFound("beneficiary"))?;
        self.open(&stored)
    }

    #[instrument(skip(self, input), err)]
    pub async fn update(&self, id: BeneficiaryId, input: BeneficiaryInput, now: DateTime<Utc>) -> ServiceResult<Beneficiary> {
        let patch = BeneficiaryPatch::try_from(input)?;
        let mut stored = self.store.get(id).await?.ok_or(ServiceError::NotFound("beneficiary"))?;

        stored.apply(patch, now, &self.cipher)?;
        if !self.store.replace(stored.clone()).await? {
            return Err(ServiceError::NotFound("beneficiary"));
        }

        info!(beneficiary_id = %id, "beneficiary updated");
        self.open(&stored)
    }

    #[instrument(skip(self), err)]
    pub async fn delete(&self, id: BeneficiaryId) -> ServiceResult<()> {
        if !self.store.delete(id).await? {
            return Err(ServiceError::NotFound("beneficiary"));
        }
        info!(beneficiary_id = %id, "beneficiary deleted");
        Ok(())
    }
}
