use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use safeaid_core::{BeneficiaryId, DomainError, DomainResult, Entity, FieldError, UserId};
use safeaid_crypto::{CipherError, EncryptedField, FieldCipher};

/// Raw beneficiary payload, as received on create or update.
///
/// `contactInfo` is accepted as an alias of `contact`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryInput {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub location: Option<String>,
    #[serde(alias = "contactInfo")]
    pub contact: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_info: Option<String>,
    pub notes: Option<String>,
}

/// Plaintext beneficiary attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeneficiaryDetails {
    pub name: String,
    pub age: u32,
    pub location: String,
    pub contact: String,
    pub emergency_contact: String,
    pub medical_info: Option<String>,
    pub notes: Option<String>,
}

/// A validated partial update.
///
/// For `medical_info` and `notes`, `Some(None)` clears the field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeneficiaryPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub location: Option<String>,
    pub contact: Option<String>,
    pub emergency_contact: Option<String>,
    pub medical_info: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

fn required(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: Option<String>,
    message: &'static str,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

/// Present fields must be non-empty; absent fields are skipped.
fn present(errors: &mut Vec<FieldError>, field: &'static str, value: Option<String>, message: &'static str) -> Option<String> {
    value.and_then(|v| required(errors, field, Some(v), message))
}

fn age(errors: &mut Vec<FieldError>, value: i64) -> Option<u32> {
    match u32::try_from(value) {
        Ok(age) if age > 0 => Some(age),
        _ => {
            errors.push(FieldError::new("age", "age must be a positive integer"));
            None
        }
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl TryFrom<BeneficiaryInput> for BeneficiaryDetails {
    type Error = DomainError;

    fn try_from(input: BeneficiaryInput) -> DomainResult<Self> {
        let mut errors = Vec::new();

        let name = required(&mut errors, "name", input.name, "name is required");
        let age = match input.age {
            Some(a) => age(&mut errors, a),
            None => {
                errors.push(FieldError::new("age", "age is required"));
                None
            }
        };
        let location = required(&mut errors, "location", input.location, "location is required");
        let contact = required(&mut errors, "contact", input.contact, "contact or phone is required");
        let emergency_contact = required(
            &mut errors,
            "emergencyContact",
            input.emergency_contact,
            "emergency contact is required",
        );

        DomainError::check_fields(errors)?;

        match (name, age, location, contact, emergency_contact) {
            (Some(name), Some(age), Some(location), Some(contact), Some(emergency_contact)) => Ok(Self {
                name,
                age,
                location,
                contact,
                emergency_contact,
                medical_info: optional(input.medical_info),
                notes: optional(input.notes),
            }),
            _ => Err(DomainError::validation("beneficiary payload is incomplete")),
        }
    }
}

impl TryFrom<BeneficiaryInput> for BeneficiaryPatch {
    type Error = DomainError;

    fn try_from(input: BeneficiaryInput) -> DomainResult<Self> {
        let mut errors = Vec::new();

        let patch = Self {
            name: present(&mut errors, "name", input.name, "name is required"),
            age: input.age.and_then(|a| age(&mut errors, a)),
            location: present(&mut errors, "location", input.location, "location is required"),
            contact: present(&mut errors, "contact", input.contact, "contact or phone is required"),
            emergency_contact: present(
                &mut errors,
                "emergencyContact",
                input.emergency_contact,
                "emergency contact is required",
            ),
            medical_info: input.medical_info.map(|v| optional(Some(v))),
            notes: input.notes.map(|v| optional(Some(v))),
        };

        DomainError::check_fields(errors)?;
        Ok(patch)
    }
}

/// Beneficiary record as stored: sensitive fields are ciphertext only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBeneficiary {
    pub id: BeneficiaryId,
    pub name: String,
    pub age: u32,
    pub location: EncryptedField,
    pub contact: String,
    pub emergency_contact: String,
    pub medical_info: Option<EncryptedField>,
    pub notes: Option<EncryptedField>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for StoredBeneficiary {
    type Id = BeneficiaryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl StoredBeneficiary {
    /// Encrypt the sensitive attributes and build a new record.
    pub fn seal(
        details: BeneficiaryDetails,
        created_by: UserId,
        now: DateTime<Utc>,
        cipher: &FieldCipher,
    ) -> Result<Self, CipherError> {
        Ok(Self {
            id: BeneficiaryId::new(),
            location: cipher.encrypt(&details.location)?,
            medical_info: cipher.encrypt_opt(details.medical_info.as_deref())?,
            notes: cipher.encrypt_opt(details.notes.as_deref())?,
            name: details.name,
            age: details.age,
            contact: details.contact,
            emergency_contact: details.emergency_contact,
            created_by,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decrypt into the form returned to authorized callers.
    pub fn open(&self, cipher: &FieldCipher) -> Result<Beneficiary, CipherError> {
        Ok(Beneficiary {
            id: self.id,
            details: BeneficiaryDetails {
                name: self.name.clone(),
                age: self.age,
                location: cipher.decrypt(&self.location)?,
                contact: self.contact.clone(),
                emergency_contact: self.emergency_contact.clone(),
                medical_info: cipher.decrypt_opt(self.medical_info.as_ref())?,
                notes: cipher.decrypt_opt(self.notes.as_ref())?,
            },
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    /// Merge a patch, re-encrypting only the sensitive fields it carries.
    pub fn apply(&mut self, patch: BeneficiaryPatch, now: DateTime<Utc>, cipher: &FieldCipher) -> Result<(), CipherError> {
        if let Some(location) = patch.location {
            self.location = cipher.encrypt(&location)?;
        }
        if let Some(medical_info) = patch.medical_info {
            self.medical_info = cipher.encrypt_opt(medical_info.as_deref())?;
        }
        if let Some(notes) = patch.notes {
            self.notes = cipher.encrypt_opt(notes.as_deref())?;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(contact) = patch.contact {
            self.contact = contact;
        }
        if let Some(emergency_contact) = patch.emergency_contact {
            self.emergency_contact = emergency_contact;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Decrypted beneficiary, as returned over the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beneficiary {
    pub id: BeneficiaryId,
    #[serde(flatten)]
    pub details: BeneficiaryDetails,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Beneficiary {
    type Id = BeneficiaryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
