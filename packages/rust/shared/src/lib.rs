//! Shared types, error model, and configuration for sitechat.
//!
//! This crate is the foundation depended on by all other sitechat crates.
//! It provides:
//! - [`SiteChatError`] — the unified error type
//! - Domain types ([`PageRecord`], [`Chunk`], [`ConversationTurn`], [`AnswerResult`])
//! - Configuration ([`AppConfig`], runtime config structs, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ChunkConfig, ChunkSection, CrawlConfig, CrawlSection, EngineConfig, OpenAiSection,
    QaConfig, QaSection, config_dir, config_file_path, init_config, load_config, load_config_from,
    validate_api_key,
};
pub use error::{Result, SiteChatError};
pub use types::{
    AnswerResult, Chunk, ChunkMetadata, ConversationTurn, MIN_CONTENT_CHARS, PageRecord, Role,
    ScoredChunk, chunk_id,
};
