//! Prompt templates for deliberation turns and the final synthesis.

pub mod template;

pub use template::{PromptTemplate, TurnPromptContext};
