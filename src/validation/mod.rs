//! Consistency validation gating the expensive generation call.

pub mod report;
pub mod validator;

pub use report::{Category, Severity, ValidationFinding, ValidationReport};
pub use validator::{ValidationConfig, Validator, VideoMetadata};
