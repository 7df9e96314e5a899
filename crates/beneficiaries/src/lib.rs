//! Beneficiaries domain module.
//!
//! Validation of beneficiary input and the sealed (at-rest) record form.
//! Pure domain logic; encryption is delegated to `safeaid-crypto`.

pub mod beneficiary;

pub use beneficiary::{
    Beneficiary, BeneficiaryDetails, BeneficiaryInput, BeneficiaryPatch, StoredBeneficiary,
};
