//! Embedding, vector storage, and retrieval.
//!
//! This crate defines the fixed collaborator interfaces the pipeline talks
//! to — [`Embedder`], [`VectorStore`], [`Retriever`] — plus the built-in
//! implementations: an OpenAI-compatible HTTP embedder, a brute-force
//! in-memory cosine store, and the [`Indexer`] that ties them together.

mod embedder;
mod indexer;
mod store;

use async_trait::async_trait;

use sitechat_shared::{Chunk, Result, ScoredChunk};

pub use embedder::OpenAiEmbedder;
pub use indexer::Indexer;
pub use store::MemoryStore;

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Text-embedding engine. Pure: the same text and model always produce
/// the same vector, and calls have no side effects visible to the pipeline.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed multiple texts. The default calls [`Embedder::embed`]
    /// sequentially; implementations with a batch endpoint should override.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Embedding dimensionality.
    fn dimensions(&self) -> usize;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

/// A chunk paired with its embedding, as stored by a [`VectorStore`].
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    /// Deterministic chunk id (see `sitechat_shared::chunk_id`).
    pub id: String,
    /// The chunk itself.
    pub chunk: Chunk,
    /// Its embedding vector.
    pub embedding: Vec<f32>,
}

/// Vector storage and similarity search.
///
/// `replace` swaps in a full new set of chunks for a site atomically:
/// re-indexing fully replaces prior contents, and a failed run must leave
/// the store unchanged.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Atomically replace the stored chunks for `site` with `chunks`.
    async fn replace(&self, site: &str, chunks: Vec<EmbeddedChunk>) -> Result<()>;

    /// Return the `top_k` chunks most similar to `embedding`, best first.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of stored chunks.
    async fn len(&self) -> usize;
}

/// Query-time retrieval: the single fixed interface the QA chain calls.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch the chunks most relevant to `query`, best match first.
    async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>>;
}
