//! Indexing coordination: embed chunks, hand them to the vector store,
//! and serve retrieval queries.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use sitechat_shared::{Chunk, Result, ScoredChunk, SiteChatError, chunk_id};

use crate::{EmbeddedChunk, Embedder, Retriever, VectorStore};

/// Coordinates the embedding engine and vector store.
///
/// Indexing is all-or-nothing: every chunk is embedded before anything is
/// written, so a failed run leaves the store's previous contents intact
/// and surfaces [`SiteChatError::Indexing`] for the caller to re-trigger.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl Indexer {
    /// Create an indexer over the given engine and store.
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, top_k: usize) -> Self {
        Self {
            embedder,
            store,
            top_k,
        }
    }

    /// Embed `chunks` and replace the stored contents for `site`.
    #[instrument(skip_all, fields(site = %site, chunks = chunks.len()))]
    pub async fn index_chunks(&self, site: &str, chunks: Vec<Chunk>) -> Result<usize> {
        if chunks.is_empty() {
            warn!(site, "no chunks to index");
            return Err(SiteChatError::Indexing(
                "no chunks were produced from the crawled pages".into(),
            ));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(SiteChatError::Indexing(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let embedded: Vec<EmbeddedChunk> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(i, (chunk, embedding))| EmbeddedChunk {
                id: chunk_id(&chunk.metadata.source, i, &chunk.content),
                chunk,
                embedding,
            })
            .collect();

        let count = embedded.len();
        self.store.replace(site, embedded).await?;

        info!(site, count, model = self.embedder.model(), "indexed chunks");
        Ok(count)
    }
}

#[async_trait]
impl Retriever for Indexer {
    async fn retrieve(&self, query: &str) -> Result<Vec<ScoredChunk>> {
        let embedding = self.embedder.embed(query).await?;
        self.store.search(&embedding, self.top_k).await
    }
}
