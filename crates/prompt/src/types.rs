//! Prompt types for clinrag.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Tone and style handed to the template
    #[serde(default)]
    pub behavior: PromptBehavior,

    /// Template string with Handlebars syntax.
    ///
    /// Available variables: `topic`, `context`, `question`, `tone`, `style`.
    pub template: String,
}

/// Answer register, rendered as `{{tone}}` and `{{style}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptBehavior {
    /// Tone (e.g., "reassuring", "clinical")
    pub tone: String,

    /// Style (e.g., "bulleted", "concise")
    pub style: String,
}

impl Default for PromptBehavior {
    fn default() -> Self {
        Self {
            tone: "patient-friendly".to_string(),
            style: "bulleted".to_string(),
        }
    }
}

/// One retrieved chunk as the composer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Source article title
    pub title: String,

    /// Position of the chunk within its article
    pub chunk_index: usize,

    /// Raw chunk text
    pub text: String,
}

impl ContextEntry {
    pub fn new(title: impl Into<String>, chunk_index: usize, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            chunk_index,
            text: text.into(),
        }
    }
}
