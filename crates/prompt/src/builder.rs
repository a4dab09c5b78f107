//! Template rendering and grounding-context assembly.

use crate::types::ContextEntry;
use clinrag_core::config::ContextMode;
use clinrag_core::{AppError, AppResult};
use handlebars::Handlebars;

/// Create a Handlebars registry that renders plain text.
pub(crate) fn registry() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text, never HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
}

/// Register `template` under `name`, mapping syntax errors to prompt errors.
pub(crate) fn register(
    handlebars: &mut Handlebars<'static>,
    name: &str,
    template: &str,
) -> AppResult<()> {
    handlebars
        .register_template_string(name, template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))
}

/// Build the context block from retrieved chunks, in the order given.
///
/// An empty slice yields an empty string.
pub fn format_context(entries: &[ContextEntry], mode: ContextMode) -> String {
    entries
        .iter()
        .map(|entry| {
            let citation = format!("Title: {}, Chunk: {}", entry.title, entry.chunk_index);
            match mode {
                ContextMode::Citations => citation,
                ContextMode::Excerpts => format!("{}\n{}", citation, entry.text),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries() -> Vec<ContextEntry> {
        vec![
            ContextEntry::new("Asthma in adults", 3, "Inhaled steroids reduce flares."),
            ContextEntry::new("Managing asthma", 0, "Avoid known triggers."),
        ]
    }

    #[test]
    fn test_format_citations() {
        let context = format_context(&entries(), ContextMode::Citations);
        assert_eq!(
            context,
            "Title: Asthma in adults, Chunk: 3\nTitle: Managing asthma, Chunk: 0"
        );
    }

    #[test]
    fn test_format_excerpts() {
        let context = format_context(&entries(), ContextMode::Excerpts);
        assert_eq!(
            context,
            "Title: Asthma in adults, Chunk: 3\nInhaled steroids reduce flares.\n\
             Title: Managing asthma, Chunk: 0\nAvoid known triggers."
        );
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format_context(&[], ContextMode::Citations), "");
        assert_eq!(format_context(&[], ContextMode::Excerpts), "");
    }
}
