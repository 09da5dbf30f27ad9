//! Workflow generation: orchestration, prompt construction, and output
//! artifact formatting.

pub mod generator;
pub mod output;
pub mod prompt;

pub use generator::{GenerationOutcome, GeneratorConfig, WorkflowGenerator};
pub use output::{format_artifact, parse_header, write_artifact, OutputHeader, END_MARKER};
pub use prompt::build_prompt;
