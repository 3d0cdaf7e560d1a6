//! Nearest-label matching for oracle replies that carry no exact keyword.
//!
//! [`LabelMatcher`] embeds the reply and each canonical label and picks the label with
//! the highest cosine similarity. The default [`HashEmbedder`] is deterministic and
//! offline; a model-backed [`Embedder`] such as [`OpenAIEmbedder`] can be plugged in and
//! the matcher falls back to hashing whenever it fails.

use std::sync::Arc;

use async_openai::{
    config::OpenAIConfig,
    types::embeddings::{CreateEmbeddingRequest, EmbeddingInput},
    Client,
};
use async_trait::async_trait;
use tracing::warn;

use crate::error::OracleError;

/// Produces fixed-size float vectors from text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input text, same order.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, OracleError>;
}

/// Character-trigram hashing embedder (FNV-1a into `dimension` buckets).
///
/// Each word is lowercased and padded with a space on both sides before trigrams are
/// taken, so `"final"` and `"FINAL answer"` share the `" fi"`..`"al "` buckets.
#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dimension: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dimension: 1024 }
    }
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.to_lowercase().chars())
                .chain(std::iter::once(' '))
                .collect();
            for gram in padded.windows(3) {
                let idx = (fnv1a(gram) % self.dimension as u64) as usize;
                v[idx] += 1.0;
            }
        }
        v
    }
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for c in chars {
        let mut buf = [0u8; 4];
        for b in c.encode_utf8(&mut buf).bytes() {
            hash ^= u64::from(b);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
    }
    hash
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, OracleError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

/// OpenAI Embeddings implementation of [`Embedder`], e.g. with `text-embedding-3-small`.
pub struct OpenAIEmbedder {
    config: OpenAIConfig,
    model: String,
}

impl OpenAIEmbedder {
    /// API key from `OPENAI_API_KEY`.
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_config(OpenAIConfig::new(), model)
    }

    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Self {
        Self {
            config,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, OracleError> {
        let inputs: Vec<String> = texts.iter().map(|&s| s.to_string()).collect();
        let request = CreateEmbeddingRequest {
            input: EmbeddingInput::StringArray(inputs),
            model: self.model.clone(),
            ..Default::default()
        };
        let client = Client::with_config(self.config.clone());
        let response = client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| OracleError::Llm(format!("OpenAI embeddings error: {}", e)))?;
        Ok(response.data.into_iter().map(|e| e.embedding).collect())
    }
}

/// Cosine similarity in `[-1, 1]`; 0 for empty, mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    let s = dot / (na * nb);
    if s.is_nan() {
        0.0
    } else {
        s
    }
}

/// Picks the label closest to a text. Never fails.
#[derive(Clone, Default)]
pub struct LabelMatcher {
    embedder: Option<Arc<dyn Embedder>>,
    fallback: HashEmbedder,
}

impl LabelMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `embedder` first; hashing is used only when it errors or returns bad shapes.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Similarity of `text` to each label, in label order.
    pub async fn similarities(&self, text: &str, labels: &[&str]) -> Vec<f32> {
        let mut inputs = Vec::with_capacity(labels.len() + 1);
        inputs.push(text);
        inputs.extend_from_slice(labels);

        let vectors = match &self.embedder {
            Some(embedder) => match embedder.embed(&inputs).await {
                Ok(v) if v.len() == inputs.len() => v,
                Ok(v) => {
                    warn!(
                        expected = inputs.len(),
                        got = v.len(),
                        "embedder returned wrong vector count, using hash embedder"
                    );
                    self.hash_all(&inputs)
                }
                Err(e) => {
                    warn!(error = %e, "embedder failed, using hash embedder");
                    self.hash_all(&inputs)
                }
            },
            None => self.hash_all(&inputs),
        };

        let (head, rest) = vectors.split_at(1);
        rest.iter()
            .map(|label| cosine_similarity(&head[0], label))
            .collect()
    }

    /// Index of the most similar label (first wins ties), or `None` when nothing is
    /// similar at all.
    pub async fn nearest(&self, text: &str, labels: &[&str]) -> Option<usize> {
        let sims = self.similarities(text, labels).await;
        let mut best: Option<(usize, f32)> = None;
        for (i, s) in sims.into_iter().enumerate() {
            if s > best.map(|(_, b)| b).unwrap_or(0.0) {
                best = Some((i, s));
            }
        }
        best.map(|(i, _)| i)
    }

    fn hash_all(&self, inputs: &[&str]) -> Vec<Vec<f32>> {
        inputs.iter().map(|t| self.fallback.embed_one(t)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: [&str; 3] = ["FINAL", "INTERMEDIATE", "INVALID"];

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, OracleError> {
            Err(OracleError::Llm("no network".into()))
        }
    }

    #[test]
    fn cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn hash_embedding_is_case_insensitive() {
        let e = HashEmbedder::default();
        assert_eq!(e.embed_one("Final"), e.embed_one("FINAL"));
        assert_eq!(e.embed_one("").iter().sum::<f32>(), 0.0);
    }

    #[tokio::test]
    async fn nearest_picks_shared_word() {
        let m = LabelMatcher::new();
        assert_eq!(m.nearest("The final answer", &LABELS).await, Some(0));
        assert_eq!(m.nearest("an intermediate step", &LABELS).await, Some(1));
        assert_eq!(m.nearest("clearly invalid move", &LABELS).await, Some(2));
    }

    #[tokio::test]
    async fn nearest_is_none_without_overlap() {
        let m = LabelMatcher::new();
        assert_eq!(m.nearest("", &LABELS).await, None);
        assert_eq!(m.nearest("!!! ???", &LABELS).await, None);
    }

    #[tokio::test]
    async fn broken_embedder_degrades_to_hashing() {
        let m = LabelMatcher::new().with_embedder(Arc::new(BrokenEmbedder));
        assert_eq!(m.nearest("final", &LABELS).await, Some(0));
    }
}
