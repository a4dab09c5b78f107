//! Offline embeddings from hashed character trigrams and whole words.

use crate::embeddings::provider::EmbeddingProvider;
use clinrag_core::AppResult;
use std::collections::BTreeMap;

const STOP_WORDS: [&str; 32] = [
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them",
];

/// Deterministic local embedding provider.
///
/// Clinical vocabulary is morphologically rich ("nephropathy", "nephrotic"),
/// so shared trigrams give related terms nearby vectors without a neural
/// model. Vectors are unit length; text without indexable words maps to the
/// zero vector.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();

        // Ordered so accumulation, and therefore rounding, is reproducible
        let mut frequencies: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *frequencies.entry(word).or_default() += 1;
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for (word, freq) in frequencies {
            let chars: Vec<char> = word.chars().collect();
            let trigram_weight = (freq as f32).sqrt();
            for window in chars.windows(3) {
                vector[self.bucket(window.iter().copied(), 37)] += trigram_weight;
            }
            vector[self.bucket(word.chars(), 31)] += freq as f32;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }

    fn bucket(&self, chars: impl Iterator<Item = char>, multiplier: u64) -> usize {
        let mut utf8 = [0u8; 4];
        let hash = chars.fold(0u64, |acc, c| {
            c.encode_utf8(&mut utf8)
                .bytes()
                .fold(acc, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(b as u64))
        });
        (hash % self.dimensions as u64) as usize
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.vectorize(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(vector: &[f32]) -> f32 {
        vector.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[tokio::test]
    async fn test_batch_vectors_are_unit_length() {
        let provider = TrigramProvider::new(384);
        let texts = vec![
            "insulin resistance".to_string(),
            "blood glucose monitoring".to_string(),
            "Síndrome de Guillain–Barré: fraqueza muscular 💉 progressiva".to_string(),
        ];

        let vectors = provider.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
        for vector in &vectors {
            assert_eq!(vector.len(), 384);
            assert!((norm(vector) - 1.0).abs() < 0.001);
        }
    }

    #[tokio::test]
    async fn test_same_text_same_vector() {
        let provider = TrigramProvider::new(64);
        let text = "Rescue inhalers relieve acute wheezing and wheezing at night";

        assert_eq!(provider.embed(text).await.unwrap(), provider.embed(text).await.unwrap());
        assert_ne!(
            provider.embed("hello world").await.unwrap(),
            provider.embed("goodbye world").await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_stop_words_only_is_zero_vector() {
        let provider = TrigramProvider::new(32);

        for text in ["", "it is the", "  \t "] {
            let vector = provider.embed(text).await.unwrap();
            assert_eq!(vector.len(), 32);
            assert!(vector.iter().all(|&x| x == 0.0));
        }
    }

    #[tokio::test]
    async fn test_related_terms_are_closer() {
        let provider = TrigramProvider::new(384);

        let query = provider.embed("diabetic nephropathy").await.unwrap();
        let related = provider.embed("nephropathy in diabetes").await.unwrap();
        let unrelated = provider.embed("fractured wrist cast").await.unwrap();

        let distance = |a: &[f32], b: &[f32]| -> f32 {
            a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
        };
        assert!(distance(&query, &related) < distance(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_punctuation_does_not_split_vocabulary() {
        let provider = TrigramProvider::new(384);

        let bare = provider.embed("asthma").await.unwrap();
        let punctuated = provider.embed("(ASTHMA),").await.unwrap();
        assert_eq!(bare, punctuated);
    }
}
