//! End-to-end orchestration for sitechat.
//!
//! This crate ties the crawler, extractor, chunker, and indexer into the
//! `ingest` pipeline, owns the per-conversation [`ChatSession`], and
//! constructs the external engines once per process via [`EngineFactory`].

pub mod engines;
pub mod pipeline;
pub mod session;

pub use engines::EngineFactory;
pub use pipeline::{IngestConfig, IngestReport, ProgressReporter, SilentProgress, ingest};
pub use session::{ChatSession, SessionId};
