//! Infrastructure layer: document storage and the application services that
//! sit between HTTP handlers and the domain crates.

pub mod accounts;
pub mod beneficiaries;
pub mod error;
pub mod store;
pub mod training;

pub use accounts::{AccountService, BootstrapAdmin, LoginOutcome};
pub use beneficiaries::BeneficiaryService;
pub use error::{ServiceError, ServiceResult};
pub use store::{Document, DocumentStore, InMemoryDocumentStore, StoreError};
pub use training::{TrainingFilter, TrainingService};
