//! Interaction log parsing and the merged event timeline.

pub mod event;
pub mod extractor;

pub use event::{Event, KeyboardAction, MouseAction, MouseButton, Position};
pub use extractor::{EndAction, InteractionLog, Session, TextSequence};
