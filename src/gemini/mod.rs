//! External generative capability boundary.

pub mod client;

pub use client::{CommandModel, GeminiClient, GenerateOptions};
