//! In-memory vector store with brute-force cosine search.
//!
//! Suitable for the bounded page budgets this pipeline works with: a few
//! dozen pages produce at most a few hundred chunks, well within linear
//! scan territory. The store holds one site's chunks at a time; `replace`
//! swaps the whole set atomically.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use sitechat_shared::{Result, ScoredChunk};

use crate::{EmbeddedChunk, VectorStore};

/// Brute-force in-memory vector store.
pub struct MemoryStore {
    contents: RwLock<SiteContents>,
}

#[derive(Default)]
struct SiteContents {
    site: String,
    chunks: Vec<EmbeddedChunk>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            contents: RwLock::new(SiteContents::default()),
        }
    }

    /// Cosine similarity between two vectors; 0.0 for mismatched lengths
    /// or zero-magnitude inputs.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn replace(&self, site: &str, chunks: Vec<EmbeddedChunk>) -> Result<()> {
        let mut contents = self.contents.write().await;
        debug!(
            site,
            previous = contents.chunks.len(),
            next = chunks.len(),
            "replacing site contents"
        );
        contents.site = site.to_string();
        contents.chunks = chunks;
        Ok(())
    }

    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        let contents = self.contents.read().await;

        let mut scored: Vec<ScoredChunk> = contents
            .chunks
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: Self::cosine_similarity(embedding, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn len(&self) -> usize {
        self.contents.read().await.chunks.len()
    }
}
