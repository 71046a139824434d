//! URL validation and the sequential BFS crawl engine.
//!
//! This crate provides:
//! - [`validator`] — pre-crawl URL format and reachability checks
//! - [`engine`] — breadth-first, same-domain crawler with a page budget

pub mod engine;
pub mod validator;

pub use engine::{CrawlReport, Crawler};
pub use validator::{ValidationReport, validate};
