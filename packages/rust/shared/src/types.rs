//! Core domain types for the sitechat pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// Minimum extracted-text length (in characters) for a page to be kept.
pub const MIN_CONTENT_CHARS: usize = 50;

// ---------------------------------------------------------------------------
// PageRecord
// ---------------------------------------------------------------------------

/// A single fetched page: the final post-redirect URL and its raw HTML.
///
/// Created by the crawler, consumed once by the extractor.
#[derive(Debug, Clone)]
pub struct PageRecord {
    /// Final URL after following redirects.
    pub url: Url,
    /// Raw HTML body.
    pub html: String,
    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
    /// HTTP status code from the fetch.
    pub status_code: u16,
}

// ---------------------------------------------------------------------------
// Chunk
// ---------------------------------------------------------------------------

/// Source metadata stamped onto every chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// URL of the page this chunk came from.
    pub source: String,
    /// Title of the page this chunk came from.
    pub title: String,
}

/// A bounded-size span of text plus source metadata — the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The chunk text.
    pub content: String,
    /// Source metadata.
    pub metadata: ChunkMetadata,
}

/// Deterministic chunk identifier: same source, position, and content
/// always hash to the same id, so re-indexing identical input is stable.
pub fn chunk_id(source: &str, index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A retrieved chunk with its similarity score (higher is closer).
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Cosine similarity to the query embedding.
    pub score: f32,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The user asking questions.
    Human,
    /// The assistant's answers.
    Ai,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Human => write!(f, "Human"),
            Role::Ai => write!(f, "AI"),
        }
    }
}

/// One turn of the conversation, appended in order by the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who spoke.
    pub role: Role,
    /// What was said.
    pub content: String,
}

impl ConversationTurn {
    /// A turn from the user.
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    /// A turn from the assistant.
    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnswerResult
// ---------------------------------------------------------------------------

/// The outcome of one query: the answer text plus the chunks it was
/// grounded on (empty for fallback and error answers).
#[derive(Debug, Clone)]
pub struct AnswerResult {
    /// Answer text shown to the user.
    pub answer: String,
    /// Retrieved chunks the answer was composed from, best match first.
    pub sources: Vec<Chunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_id_is_deterministic() {
        let a = chunk_id("https://example.com/page", 0, "some content");
        let b = chunk_id("https://example.com/page", 0, "some content");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64); // SHA-256 = 64 hex chars
    }

    #[test]
    fn chunk_id_varies_by_position() {
        let a = chunk_id("https://example.com/page", 0, "same");
        let b = chunk_id("https://example.com/page", 1, "same");
        assert_ne!(a, b);
    }

    #[test]
    fn role_renders_as_prompt_labels() {
        assert_eq!(Role::Human.to_string(), "Human");
        assert_eq!(Role::Ai.to_string(), "AI");
    }

    #[test]
    fn chunk_serialization_roundtrip() {
        let chunk = Chunk {
            content: "Rust is a systems language.".into(),
            metadata: ChunkMetadata {
                source: "https://example.com/about".into(),
                title: "About".into(),
            },
        };
        let json = serde_json::to_string(&chunk).expect("serialize");
        let parsed: Chunk = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, chunk);
    }
}
