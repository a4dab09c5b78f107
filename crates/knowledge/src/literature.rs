//! Literature sources keyed by disease topic.

use crate::types::{Article, ArticleSet};
use clinrag_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Source of already-extracted article text for a topic.
#[async_trait::async_trait]
pub trait ArticleFetcher: Send + Sync {
    /// Articles for `topic`; an empty set means nothing is available.
    async fn fetch(&self, topic: &str) -> AppResult<ArticleSet>;
}

/// Normalise a topic into a file-system slug.
///
/// Lowercase, with every run of non-alphanumerics collapsed to one `-`.
pub fn topic_slug(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    for c in topic.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// A local corpus of extracted literature.
///
/// For topic slug `s`, reads `<root>/s.json` (a `{title: {url, text}}` map)
/// and every `<root>/s/*.txt` file (title = file stem). JSON titles win over
/// text files with the same stem.
#[derive(Debug, Clone)]
pub struct LiteratureDirectory {
    root: PathBuf,
}

impl LiteratureDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(root: &Path, slug: &str) -> AppResult<ArticleSet> {
        let mut articles = ArticleSet::new();

        let json_path = root.join(format!("{}.json", slug));
        if json_path.is_file() {
            let content = std::fs::read_to_string(&json_path)?;
            let parsed: ArticleSet = serde_json::from_str(&content).map_err(|e| {
                AppError::Knowledge(format!("Failed to parse {:?}: {}", json_path, e))
            })?;
            articles.extend(parsed);
        }

        let topic_dir = root.join(slug);
        if topic_dir.is_dir() {
            for entry in WalkDir::new(&topic_dir)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let path = entry.path();
                if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("txt") {
                    continue;
                }
                let Some(title) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if articles.contains_key(title) {
                    continue;
                }

                let text = std::fs::read_to_string(path)?;
                let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
                articles.insert(
                    title.to_string(),
                    Article::new(format!("file://{}", absolute.display()), text),
                );
            }
        }

        Ok(articles)
    }
}

#[async_trait::async_trait]
impl ArticleFetcher for LiteratureDirectory {
    async fn fetch(&self, topic: &str) -> AppResult<ArticleSet> {
        let slug = topic_slug(topic);
        if slug.is_empty() {
            return Ok(ArticleSet::new());
        }

        let root = self.root.clone();
        let lookup = slug.clone();
        let articles = tokio::task::spawn_blocking(move || Self::load(&root, &lookup))
            .await
            .map_err(|e| AppError::Knowledge(format!("Literature loader panicked: {}", e)))??;

        tracing::debug!(
            topic = %topic,
            slug = %slug,
            "Loaded {} articles from {:?}",
            articles.len(),
            self.root
        );

        Ok(articles)
    }
}
