//! Training modules domain.
//!
//! Course records with a four-step difficulty level and an active flag used to
//! soft-filter listings. No IO.

pub mod level;
pub mod module;

pub use level::{Level, ParseLevelError};
pub use module::{
    NewTrainingModule, TrainingInput, TrainingModule, TrainingPatch, SUGGESTED_CATEGORIES,
};
