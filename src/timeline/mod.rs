//! Video sample-window timeline.

pub mod sampler;

pub use sampler::{SampleTimeline, SampleWindow};
