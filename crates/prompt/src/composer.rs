//! Final model input assembly.

use crate::builder::{format_context, register, registry};
use crate::loader::load_prompt_override;
use crate::types::{ContextEntry, PromptBehavior, PromptDefinition};
use clinrag_core::config::ContextMode;
use clinrag_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::BTreeMap;
use std::path::Path;

/// Identifier of the answer prompt; also the override file stem.
pub const CLINICAL_ANSWER_PROMPT_ID: &str = "clinical.answer";

/// Built-in answer template.
pub const DEFAULT_TEMPLATE: &str = "You are a clinical explainer helping a patient understand their condition.\n\
Based on the following medical {{topic}} and context, answer the user's question.\n\
Use plain, {{tone}} language and keep the answer {{style}}.\n\
Context:\n\
{{context}}\n\
\n\
User's Question: {{question}}";

/// Renders the answer prompt from a topic, retrieved chunks and a question.
///
/// The template is compiled once; `compose` only renders.
pub struct PromptComposer {
    handlebars: Handlebars<'static>,
    prompt_id: String,
    behavior: PromptBehavior,
    mode: ContextMode,
}

impl PromptComposer {
    /// Composer using the built-in template.
    pub fn new(mode: ContextMode) -> AppResult<Self> {
        Self::with_template(
            CLINICAL_ANSWER_PROMPT_ID,
            DEFAULT_TEMPLATE,
            PromptBehavior::default(),
            mode,
        )
    }

    /// Composer using a loaded prompt definition.
    pub fn from_definition(definition: &PromptDefinition, mode: ContextMode) -> AppResult<Self> {
        Self::with_template(
            &definition.id,
            &definition.template,
            definition.behavior.clone(),
            mode,
        )
    }

    /// Composer using `<prompts_dir>/clinical.answer.yml` when present,
    /// otherwise the built-in template.
    pub fn load(prompts_dir: &Path, mode: ContextMode) -> AppResult<Self> {
        match load_prompt_override(prompts_dir, CLINICAL_ANSWER_PROMPT_ID)? {
            Some(definition) => {
                tracing::info!("Using prompt override: {}", definition.id);
                Self::from_definition(&definition, mode)
            }
            None => Self::new(mode),
        }
    }

    fn with_template(
        prompt_id: &str,
        template: &str,
        behavior: PromptBehavior,
        mode: ContextMode,
    ) -> AppResult<Self> {
        let mut handlebars = registry();
        register(&mut handlebars, prompt_id, template)?;

        Ok(Self {
            handlebars,
            prompt_id: prompt_id.to_string(),
            behavior,
            mode,
        })
    }

    pub fn prompt_id(&self) -> &str {
        &self.prompt_id
    }

    pub fn mode(&self) -> ContextMode {
        self.mode
    }

    /// Compose the model input.
    ///
    /// Entries are rendered in the order given; an empty slice produces
    /// an empty context block.
    pub fn compose(&self, topic: &str, entries: &[ContextEntry], question: &str) -> AppResult<String> {
        let mut variables = BTreeMap::new();
        variables.insert("topic", topic.to_string());
        variables.insert("context", format_context(entries, self.mode));
        variables.insert("question", question.to_string());
        variables.insert("tone", self.behavior.tone.clone());
        variables.insert("style", self.behavior.style.clone());

        tracing::debug!(
            prompt = %self.prompt_id,
            context_entries = entries.len(),
            "Composing prompt"
        );

        self.handlebars
            .render(&self.prompt_id, &variables)
            .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
    }
}
