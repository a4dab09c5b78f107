//! YAML prompt definitions on disk.

use crate::types::PromptDefinition;
use clinrag_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

fn prompt_path(prompts_dir: &Path, prompt_id: &str) -> PathBuf {
    prompts_dir.join(format!("{}.yml", prompt_id))
}

/// Load and validate `<prompts_dir>/<prompt_id>.yml`.
///
/// # Example
/// ```no_run
/// use clinrag_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new(".clinrag/prompts"), "clinical.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(prompts_dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let path = prompt_path(prompts_dir, prompt_id);
    tracing::debug!("Loading prompt from: {:?}", path);

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| AppError::Prompt(format!("Failed to read prompt file {:?}: {}", path, e)))?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {:?}: {}", path, e)))?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}'",
            path, definition.id
        )));
    }
    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);
    Ok(definition)
}

/// Like [`load_prompt`], but a missing file is `Ok(None)`.
pub fn load_prompt_override(
    prompts_dir: &Path,
    prompt_id: &str,
) -> AppResult<Option<PromptDefinition>> {
    if !prompt_path(prompts_dir, prompt_id).is_file() {
        return Ok(None);
    }
    load_prompt(prompts_dir, prompt_id).map(Some)
}

fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    let required = [
        ("id", def.id.as_str()),
        ("title", def.title.as_str()),
        ("apiVersion", def.api_version.as_str()),
        ("template", def.template.trim()),
    ];
    if let Some((field, _)) = required.iter().find(|(_, value)| value.is_empty()) {
        return Err(AppError::Prompt(format!("Prompt {} cannot be empty", field)));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
