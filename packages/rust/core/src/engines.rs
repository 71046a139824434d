//! Once-per-process construction of the external engines.
//!
//! The embedding model and language model are expensive to set up and are
//! reused for the whole process lifetime. [`EngineFactory`] makes that
//! explicit: collaborators receive `Arc` handles built lazily on first use
//! and cached, with no hidden global state.

use std::sync::{Arc, OnceLock};

use sitechat_index::{Embedder, OpenAiEmbedder};
use sitechat_qa::{LanguageModel, OpenAiChat};
use sitechat_shared::{EngineConfig, Result};

/// Lazily-initialized, process-wide engine singletons.
pub struct EngineFactory {
    config: EngineConfig,
    embedder: OnceLock<Arc<dyn Embedder>>,
    model: OnceLock<Arc<dyn LanguageModel>>,
}

impl EngineFactory {
    /// Create a factory; no engine is constructed until first requested.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            embedder: OnceLock::new(),
            model: OnceLock::new(),
        }
    }

    /// The shared embedding engine, constructed on first call.
    pub fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        if let Some(embedder) = self.embedder.get() {
            return Ok(Arc::clone(embedder));
        }
        let built: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&self.config)?);
        Ok(Arc::clone(self.embedder.get_or_init(|| built)))
    }

    /// The shared language model, constructed on first call.
    pub fn language_model(&self) -> Result<Arc<dyn LanguageModel>> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }
        let built: Arc<dyn LanguageModel> = Arc::new(OpenAiChat::new(&self.config)?);
        Ok(Arc::clone(self.model.get_or_init(|| built)))
    }
}
