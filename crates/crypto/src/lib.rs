//! `safeaid-crypto`: field-level encryption for sensitive record attributes.

pub mod cipher;

pub use cipher::{CipherError, EncryptedField, FieldCipher};
