//! Event/video correlation.

pub mod correlator;

pub use correlator::{correlate, EnrichedInteraction};
