//! Retrieval-augmented question answering with a strict grounding policy.
//!
//! The [`QaChain`] retrieves candidate chunks for a query and composes an
//! answer via a templated prompt to a language model. Two guarantees hold:
//!
//! - **Structural**: when retrieval returns zero documents the chain
//!   short-circuits with [`FALLBACK_ANSWER`] and never invokes the model.
//! - **Policy**: when documents exist, the prompt instructs the model to
//!   answer strictly from context and to emit the same fallback sentence
//!   verbatim if the context is insufficient.
//!
//! Retrieval and generation failures are converted into a user-visible
//! error answer with empty sources, never left as an unhandled fault.

mod chat;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use sitechat_index::Retriever;
use sitechat_shared::{AnswerResult, ConversationTurn, QaConfig, Result};

pub use chat::OpenAiChat;
pub use prompt::PromptBuilder;

/// The fixed answer returned whenever no supporting text exists.
pub const FALLBACK_ANSWER: &str = "The answer is not available on the provided website.";

// ---------------------------------------------------------------------------
// LanguageModel trait
// ---------------------------------------------------------------------------

/// Answer-generation engine. One fixed interface, no fallback probing.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ---------------------------------------------------------------------------
// QaChain
// ---------------------------------------------------------------------------

/// Orchestrates retrieve → ground-check → generate for one query at a time.
pub struct QaChain {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn LanguageModel>,
    config: QaConfig,
}

impl QaChain {
    /// Create a chain over the given retriever and language model.
    pub fn new(
        retriever: Arc<dyn Retriever>,
        model: Arc<dyn LanguageModel>,
        config: QaConfig,
    ) -> Self {
        Self {
            retriever,
            model,
            config,
        }
    }

    /// Answer `query` against the indexed site, using the most recent
    /// turns of `history` as conversational context.
    ///
    /// Never returns an error: failures become an error-answer with empty
    /// sources, and an empty retrieval becomes the fallback answer.
    #[instrument(skip_all, fields(query_len = query.len(), history_len = history.len()))]
    pub async fn answer(&self, query: &str, history: &[ConversationTurn]) -> AnswerResult {
        // Pre-flight retrieval. Zero documents means the model is never
        // consulted — the grounding guarantee is structural, not prompted.
        let retrieved = match self.retriever.retrieve(query).await {
            Ok(retrieved) => retrieved,
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                return error_answer(&e);
            }
        };

        if retrieved.is_empty() {
            debug!("no documents retrieved, returning fallback answer");
            return AnswerResult {
                answer: FALLBACK_ANSWER.to_string(),
                sources: Vec::new(),
            };
        }

        let window = recent_turns(history, self.config.history_window);
        let prompt = PromptBuilder::build_qa_prompt(query, &retrieved, window);

        match self.model.generate(&prompt).await {
            Ok(answer) => AnswerResult {
                answer,
                sources: retrieved.into_iter().map(|r| r.chunk).collect(),
            },
            Err(e) => {
                warn!(error = %e, "generation failed");
                error_answer(&e)
            }
        }
    }
}

/// The last `window` turns of the conversation.
fn recent_turns(history: &[ConversationTurn], window: usize) -> &[ConversationTurn] {
    let start = history.len().saturating_sub(window);
    &history[start..]
}

/// Convert a failure into the user-visible error answer.
fn error_answer(e: &sitechat_shared::SiteChatError) -> AnswerResult {
    AnswerResult {
        answer: format!("An error occurred: {e}"),
        sources: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitechat_shared::{Chunk, ChunkMetadata, ScoredChunk, SiteChatError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRetriever {
        results: Vec<ScoredChunk>,
        fail: bool,
    }

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<ScoredChunk>> {
            if self.fail {
                return Err(SiteChatError::Indexing("store offline".into()));
            }
            Ok(self.results.clone())
        }
    }

    struct StubModel {
        calls: Arc<AtomicUsize>,
        reply: Result<String>,
    }

    impl StubModel {
        fn replying(reply: &str) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    reply: Ok(reply.to_string()),
                },
                calls,
            )
        }

        fn failing() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: Arc::clone(&calls),
                    reply: Err(SiteChatError::Generation("model quota exceeded".into())),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl LanguageModel for StubModel {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(SiteChatError::Generation(e.to_string())),
            }
        }
    }

    /// Model stub that asserts on the prompt it receives.
    struct PromptCapture {
        seen: tokio::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LanguageModel for PromptCapture {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.seen.lock().await.push(prompt.to_string());
            Ok("captured".into())
        }
    }

    fn scored(content: &str) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                content: content.to_string(),
                metadata: ChunkMetadata {
                    source: "https://x.example/docs".into(),
                    title: "Docs".into(),
                },
            },
            score: 0.8,
        }
    }

    fn qa_config() -> QaConfig {
        QaConfig {
            top_k: 4,
            history_window: 5,
        }
    }

    #[tokio::test]
    async fn empty_retrieval_short_circuits_without_model_call() {
        let retriever = Arc::new(StubRetriever {
            results: vec![],
            fail: false,
        });
        let (model, calls) = StubModel::replying("should never appear");
        let chain = QaChain::new(retriever, Arc::new(model), qa_config());

        let result = chain.answer("anything at all?", &[]).await;

        assert_eq!(result.answer, FALLBACK_ANSWER);
        assert!(result.sources.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0, "model must not be invoked");
    }

    #[tokio::test]
    async fn answer_carries_retrieved_sources() {
        let retriever = Arc::new(StubRetriever {
            results: vec![scored("the crawler is breadth-first"), scored("chunks overlap")],
            fail: false,
        });
        let (model, calls) = StubModel::replying("It crawls breadth-first.");
        let chain = QaChain::new(retriever, Arc::new(model), qa_config());

        let result = chain.answer("how does it crawl?", &[]).await;

        assert_eq!(result.answer, "It crawls breadth-first.");
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.sources[0].content, "the crawler is breadth-first");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retrieval_failure_becomes_error_answer() {
        let retriever = Arc::new(StubRetriever {
            results: vec![],
            fail: true,
        });
        let (model, calls) = StubModel::replying("unused");
        let chain = QaChain::new(retriever, Arc::new(model), qa_config());

        let result = chain.answer("question?", &[]).await;

        assert!(result.answer.starts_with("An error occurred:"));
        assert!(result.answer.contains("store offline"));
        assert!(result.sources.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generation_failure_becomes_error_answer() {
        let retriever = Arc::new(StubRetriever {
            results: vec![scored("some context")],
            fail: false,
        });
        let (model, _calls) = StubModel::failing();
        let chain = QaChain::new(retriever, Arc::new(model), qa_config());

        let result = chain.answer("question?", &[]).await;

        assert!(result.answer.starts_with("An error occurred:"));
        assert!(result.answer.contains("quota"));
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn history_is_windowed_to_most_recent_turns() {
        let retriever = Arc::new(StubRetriever {
            results: vec![scored("context")],
            fail: false,
        });
        let capture = Arc::new(PromptCapture {
            seen: tokio::sync::Mutex::new(Vec::new()),
        });
        let model: Arc<dyn LanguageModel> = capture.clone();
        let chain = QaChain::new(retriever, model, qa_config());

        // Seven turns; only the last five may appear in the prompt.
        let history: Vec<ConversationTurn> = (0..7)
            .map(|i| {
                if i % 2 == 0 {
                    ConversationTurn::human(format!("question {i}"))
                } else {
                    ConversationTurn::ai(format!("answer {i}"))
                }
            })
            .collect();

        chain.answer("current question?", &history).await;

        let prompts = capture.seen.lock().await;
        let prompt = &prompts[0];
        assert!(!prompt.contains("question 0"));
        assert!(!prompt.contains("answer 1"));
        assert!(prompt.contains("question 2"));
        assert!(prompt.contains("answer 5"));
        assert!(prompt.contains("question 6"));
        assert!(prompt.contains("Human: question 6"));
        assert!(prompt.contains("AI: answer 5"));
    }

    #[test]
    fn recent_turns_windows_correctly() {
        let history: Vec<ConversationTurn> =
            (0..3).map(|i| ConversationTurn::human(format!("t{i}"))).collect();
        assert_eq!(recent_turns(&history, 5).len(), 3);
        assert_eq!(recent_turns(&history, 2).len(), 2);
        assert_eq!(recent_turns(&history, 2)[0].content, "t1");
        assert_eq!(recent_turns(&history, 0).len(), 0);
    }
}
