//! Prompt system for clinrag.
//!
//! This crate turns retrieved literature into the final model input:
//! - YAML-based prompt definitions (optional workspace override)
//! - Handlebars template rendering
//! - Grounding context assembly from retrieved chunks

pub mod builder;
pub mod composer;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::format_context;
pub use composer::{PromptComposer, CLINICAL_ANSWER_PROMPT_ID, DEFAULT_TEMPLATE};
pub use loader::{load_prompt, load_prompt_override};
pub use types::{ContextEntry, PromptBehavior, PromptDefinition};
