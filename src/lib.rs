//! # RPA Workflow Generator
//!
//! Converts a recorded screen-interaction session (a video plus a timestamped
//! mouse/keyboard interaction log) into deterministic, human-readable RPA
//! workflow commands.
//!
//! ## Overview
//!
//! The recorder (an external tool) produces two artifacts per session: an
//! `.mp4`/`.mov`/`.avi` screen capture and a JSON interaction log. This
//! library correlates the two timelines, validates their mutual consistency,
//! and only then spends the expensive external generation call.
//!
//! ## Quick Start
//!
//! ```no_run
//! use rpa_workflow_gen::session::InteractionLog;
//! use rpa_workflow_gen::timeline::SampleTimeline;
//! use rpa_workflow_gen::correlate::correlate;
//!
//! let log = InteractionLog::load("records/session_interactions.json")?;
//! let session = log.extract()?;
//! let timeline = SampleTimeline::build(session.duration, 0.8)?;
//! let enriched = correlate(&session, &timeline);
//! println!("{} interactions correlated", enriched.len());
//! # Ok::<(), rpa_workflow_gen::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`session`]: interaction log parsing and the merged event timeline
//! - [`timeline`]: video sample-window computation and nearest/bracket lookup
//! - [`correlate`]: pairing events with their contextualizing sample windows
//! - [`validation`]: severity-tagged consistency checks gating generation
//! - [`gemini`]: the external generative capability boundary
//! - [`workflow`]: orchestration, prompt construction, and output formatting
//! - [`app`]: CLI and configuration management
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐   ┌───────────┐   ┌────────────┐   ┌───────────┐
//! │ video +   │──▶│ Extractor │──▶│ Correlator │──▶│ Validator │
//! │ JSON log  │   │ / Sampler │   │            │   │  (gate)   │
//! └───────────┘   └───────────┘   └────────────┘   └─────┬─────┘
//!                                                        ▼
//!                 ┌───────────┐   ┌────────────┐   ┌───────────┐
//!                 │ commands  │◀──│ formatter  │◀──│ Gemini    │
//!                 │ .txt      │   │ + validate │   │ call      │
//!                 └───────────┘   └────────────┘   └───────────┘
//! ```

pub mod session;
pub mod timeline;
pub mod correlate;
pub mod validation;
pub mod gemini;
pub mod workflow;
pub mod app;

// Re-export commonly used types
pub use correlate::EnrichedInteraction;
pub use session::{Event, Session};
pub use timeline::{SampleTimeline, SampleWindow};
pub use validation::{Severity, ValidationFinding, ValidationReport};
pub use workflow::WorkflowGenerator;

/// Result type alias for the workflow generator
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the workflow generator
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The interaction artifact is unparseable or structurally incomplete.
    #[error("malformed interaction log: {0}")]
    MalformedInput(String),

    /// A non-positive session or video duration.
    #[error("invalid duration: {0} (must be > 0)")]
    InvalidDuration(f64),

    /// The validation report carries at least one error-severity finding.
    /// Generation must not proceed.
    #[error("validation failed with {error_count} error finding(s)")]
    ValidationFailed {
        report: validation::ValidationReport,
        error_count: usize,
    },

    /// The external generation call failed, timed out, or returned an
    /// empty/invalid result after all retries.
    #[error("generation call failed after {attempts} attempt(s): {message}")]
    ExternalCall { attempts: u32, message: String },

    /// The output destination is not writable.
    #[error("cannot write output: {0}")]
    OutputWrite(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
