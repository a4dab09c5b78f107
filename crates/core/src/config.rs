//! Configuration management for clinrag.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (.clinrag/config.yaml, or an explicit path)
//! - Environment variables
//! - Command-line flags
//!
//! The configuration is workspace-centric, with local state stored in `.clinrag/`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Chat completion providers the generation client knows how to talk to.
pub const KNOWN_LLM_PROVIDERS: [&str; 3] = ["groq", "openai", "ollama"];

/// Embedding providers available to the embedder.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["trigram", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .clinrag/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Explicit API key override for the generation provider
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Emit logs as JSON lines
    pub log_json: bool,

    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub patients: PatientSettings,
    pub literature: LiteratureSettings,
}

/// Generation endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// Provider name ("groq", "openai", "ollama")
    pub provider: String,

    /// Model identifier sent with every completion request
    pub model: String,

    /// Base URL override; provider default when absent
    pub endpoint: Option<String>,

    /// Environment variable holding the API key
    pub api_key_env: Option<String>,

    /// Sampling temperature, kept low for factual answers
    pub temperature: f32,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama3-8b-8192".to_string(),
            endpoint: None,
            api_key_env: Some("GROQ_API_KEY".to_string()),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

/// Embedding model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name ("trigram", "ollama")
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Base URL override for HTTP providers
    pub endpoint: Option<String>,

    /// Per-request timeout in seconds for HTTP providers
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            endpoint: None,
            timeout_secs: 30,
        }
    }
}

/// How retrieved chunks are rendered into the grounding context.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContextMode {
    /// One `Title: .., Chunk: ..` citation line per retrieved chunk
    #[default]
    Citations,

    /// Citation line followed by the chunk's text
    Excerpts,
}

/// Retrieval and caching settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Number of nearest chunks fed into the prompt
    pub top_k: usize,

    /// Maximum number of patients whose ingested literature stays in memory
    pub cache_capacity: usize,

    /// Context block rendering
    pub context_mode: ContextMode,

    /// Keep blank lines as (empty) chunks
    pub keep_empty_chunks: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 6,
            cache_capacity: 128,
            context_mode: ContextMode::Citations,
            keep_empty_chunks: false,
        }
    }
}

/// Patient record store settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PatientSettings {
    /// Environment variable holding the Supabase project URL
    pub url_env: String,

    /// Environment variable holding the Supabase API key
    pub key_env: String,

    /// Table holding per-patient records with a `disease` column
    pub table: String,

    /// Local YAML `id: disease` file used when Supabase is not configured
    pub file: Option<PathBuf>,

    /// Supabase lookup deadline in seconds
    pub timeout_secs: u64,
}

impl PatientSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PatientSettings {
    fn default() -> Self {
        Self {
            url_env: "SUPABASE_URL".to_string(),
            key_env: "SUPABASE_KEY".to_string(),
            table: "patient_records".to_string(),
            file: None,
            timeout_secs: 10,
        }
    }
}

/// Local literature corpus settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LiteratureSettings {
    /// Directory holding pre-extracted articles, relative to the workspace
    pub dir: PathBuf,
}

impl Default for LiteratureSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".clinrag/literature"),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    llm: Option<LlmSettings>,
    embedding: Option<EmbeddingSettings>,
    retrieval: Option<RetrievalSettings>,
    patients: Option<PatientSettings>,
    literature: Option<LiteratureSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
    json: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
            log_json: false,
            llm: LlmSettings::default(),
            embedding: EmbeddingSettings::default(),
            retrieval: RetrievalSettings::default(),
            patients: PatientSettings::default(),
            literature: LiteratureSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `CLINRAG_WORKSPACE`: Override workspace path
    /// - `CLINRAG_CONFIG`: Path to config file
    /// - `CLINRAG_PROVIDER`: Generation provider
    /// - `CLINRAG_MODEL`: Generation model identifier
    /// - `CLINRAG_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use clinrag_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None, None)
    }

    /// Load configuration, with explicit workspace and config file paths
    /// taking precedence over their environment variables.
    pub fn load_from(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace.or_else(|| env_path("CLINRAG_WORKSPACE")) {
            config.workspace = workspace;
        }

        config.config_file = config_file.or_else(|| env_path("CLINRAG_CONFIG"));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.clinrag_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("CLINRAG_PROVIDER") {
            config.llm.provider = provider;
        }

        if let Ok(model) = std::env::var("CLINRAG_MODEL") {
            config.llm.model = model;
        }

        config.api_key = std::env::var("CLINRAG_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
            if let Some(json) = logging.json {
                result.log_json = json;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(patients) = config_file.patients {
            result.patients = patients;
        }
        if let Some(literature) = config_file.literature {
            result.literature = literature;
        }

        tracing::debug!("Merged config file {:?}", path);

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(
        mut self,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(provider) = provider {
            self.llm.provider = provider;
        }

        if let Some(model) = model {
            self.llm.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .clinrag directory.
    pub fn clinrag_dir(&self) -> PathBuf {
        self.workspace.join(".clinrag")
    }

    /// Ensure the .clinrag directory exists.
    pub fn ensure_clinrag_dir(&self) -> AppResult<()> {
        let dir = self.clinrag_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .clinrag directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Directory holding prompt definition overrides.
    pub fn prompts_dir(&self) -> PathBuf {
        self.clinrag_dir().join("prompts")
    }

    /// Literature corpus directory, resolved against the workspace.
    pub fn literature_dir(&self) -> PathBuf {
        self.resolve(&self.literature.dir)
    }

    /// Local patient file, resolved against the workspace.
    pub fn patients_file(&self) -> PathBuf {
        match self.patients.file {
            Some(ref file) => self.resolve(file),
            None => self.clinrag_dir().join("patients.yaml"),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Resolve the generation API key.
    ///
    /// `CLINRAG_API_KEY` wins; otherwise the variable named by
    /// `llm.apiKeyEnv` is consulted.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        self.llm
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty())
    }

    /// Resolve Supabase credentials; `None` when either variable is unset.
    pub fn resolve_patient_store(&self) -> Option<(String, String)> {
        let url = std::env::var(&self.patients.url_env).ok()?;
        let key = std::env::var(&self.patients.key_env).ok()?;
        Some((url, key))
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.llm.provider.to_lowercase();
        if !KNOWN_LLM_PROVIDERS.contains(&provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(AppError::Config("Model identifier cannot be empty".to_string()));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(AppError::Config(format!(
                "Temperature must be within 0.0-2.0, got {}",
                self.llm.temperature
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("topK must be greater than zero".to_string()));
        }

        if self.retrieval.cache_capacity == 0 {
            return Err(AppError::Config(
                "cacheCapacity must be greater than zero".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0
            || self.embedding.timeout_secs == 0
            || self.patients.timeout_secs == 0
        {
            return Err(AppError::Config(
                "Timeouts must be at least one second".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var(var).ok().map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.model, "llama3-8b-8192");
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.retrieval.context_mode, ContextMode::Citations);
        assert!(!config.retrieval.keep_empty_chunks);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clinrag_dir() {
        let config = AppConfig::default();
        assert!(config.clinrag_dir().ends_with(".clinrag"));
        assert!(config.prompts_dir().ends_with(".clinrag/prompts"));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default();
        let overridden = config.with_overrides(
            Some("ollama".to_string()),
            Some("llama3.2".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(overridden.llm.provider, "ollama");
        assert_eq!(overridden.llm.model, "llama3.2");
        assert!(overridden.verbose);
        assert_eq!(overridden.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_merge_yaml_sections() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(
            &path,
            r#"
llm:
  provider: ollama
  model: llama3.2
  temperature: 0.1
retrieval:
  topK: 3
  contextMode: excerpts
logging:
  color: false
  json: true
"#,
        )
        .unwrap();

        let base = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };
        let merged = base.merge_yaml(&path).unwrap();

        assert_eq!(merged.llm.provider, "ollama");
        assert_eq!(merged.llm.temperature, 0.1);
        // Missing keys inside a section fall back to defaults
        assert_eq!(merged.llm.timeout_secs, 60);
        assert_eq!(merged.retrieval.top_k, 3);
        assert_eq!(merged.retrieval.context_mode, ContextMode::Excerpts);
        assert_eq!(merged.retrieval.cache_capacity, 128);
        assert_eq!(merged.embedding, EmbeddingSettings::default());
        assert!(merged.no_color);
        assert!(merged.log_json);
    }

    #[test]
    fn test_load_from_missing_explicit_config_file() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_from(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_from_missing_workspace() {
        let result = AppConfig::load_from(Some(PathBuf::from("/definitely/not/here")), None);
        assert!(result.is_err());
    }

    #[test]
    fn test_paths_resolve_against_workspace() {
        let config = AppConfig {
            workspace: PathBuf::from("/srv/clinic"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.literature_dir(),
            PathBuf::from("/srv/clinic/.clinrag/literature")
        );
        assert_eq!(
            config.patients_file(),
            PathBuf::from("/srv/clinic/.clinrag/patients.yaml")
        );
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.llm.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_top_k() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_patient_lookup_timeout_is_its_own_setting() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        fs::write(&path, "patients:\n  table: records\n  timeoutSecs: 4\n").unwrap();

        let merged = AppConfig::default().merge_yaml(&path).unwrap();
        assert_eq!(merged.patients.table, "records");
        assert_eq!(merged.patients.timeout(), Duration::from_secs(4));
        assert_eq!(merged.llm.timeout_secs, 60);

        let mut config = merged;
        config.patients.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_hot_temperature() {
        let mut config = AppConfig::default();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }
}
