//! End-to-end ingest pipeline: URL → crawl → extract → clean → chunk → index.

use std::time::Instant;

use tracing::{debug, info, instrument, warn};
use url::Url;

use sitechat_chunker::chunk;
use sitechat_crawler::Crawler;
use sitechat_extract::{clean, extract};
use sitechat_index::Indexer;
use sitechat_shared::{Chunk, ChunkConfig, CrawlConfig, Result, SiteChatError};

/// Configuration for one ingest run.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Site to ingest.
    pub url: Url,
    /// Crawl configuration.
    pub crawl: CrawlConfig,
    /// Chunking configuration.
    pub chunking: ChunkConfig,
}

/// Summary of a completed ingest run.
#[derive(Debug)]
pub struct IngestReport {
    /// Pages fetched by the crawler.
    pub pages_fetched: usize,
    /// Pages the crawler skipped (non-HTML, errors, off-domain).
    pub pages_skipped: usize,
    /// Pages that produced at least one indexed chunk.
    pub pages_indexed: usize,
    /// Total chunks written to the index.
    pub chunk_count: usize,
    /// Wall-clock duration of the run.
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called per page during extraction.
    fn page_processed(&self, url: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, report: &IngestReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_processed(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _report: &IngestReport) {}
}

/// Run the full ingest pipeline.
///
/// Crawling and per-page processing tolerate individual failures — a page
/// that cannot be fetched, extracted, or chunked is skipped without
/// affecting the others. Two conditions are fatal: a crawl that produces
/// no pages at all, and any failure while writing the index.
#[instrument(skip_all, fields(url = %config.url))]
pub async fn ingest(
    config: &IngestConfig,
    indexer: &Indexer,
    progress: &dyn ProgressReporter,
) -> Result<IngestReport> {
    let start = Instant::now();

    // --- Phase 1: Crawl ---
    progress.phase("Crawling website");
    let crawler = Crawler::new(config.crawl.clone())?;
    let crawl_report = crawler.crawl(&config.url).await;

    if crawl_report.pages.is_empty() {
        return Err(SiteChatError::Network(
            "no pages could be fetched from the website".into(),
        ));
    }

    // --- Phase 2: Extract, clean, chunk ---
    progress.phase("Extracting content");
    let total = crawl_report.pages.len();
    let mut chunks: Vec<Chunk> = Vec::new();
    let mut pages_indexed = 0;

    for (i, page) in crawl_report.pages.iter().enumerate() {
        progress.page_processed(page.url.as_str(), i + 1, total);

        let Some(extraction) = extract(&page.html) else {
            debug!(url = %page.url, "no usable content, skipping page");
            continue;
        };

        let text = clean(&extraction.text);
        let page_chunks = chunk(&text, page.url.as_str(), &extraction.title, &config.chunking);
        if page_chunks.is_empty() {
            warn!(url = %page.url, "page produced no chunks, skipping");
            continue;
        }

        pages_indexed += 1;
        chunks.extend(page_chunks);
    }

    // --- Phase 3: Index ---
    progress.phase("Indexing chunks");
    let chunk_count = indexer.index_chunks(config.url.as_str(), chunks).await?;

    let report = IngestReport {
        pages_fetched: crawl_report.pages.len(),
        pages_skipped: crawl_report.pages_skipped,
        pages_indexed,
        chunk_count,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        pages_fetched = report.pages_fetched,
        pages_indexed = report.pages_indexed,
        chunk_count = report.chunk_count,
        elapsed_ms = report.elapsed.as_millis(),
        "ingest complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sitechat_index::{Embedder, MemoryStore, Retriever};
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Deterministic embedder keyed on topic words.
    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> sitechat_shared::Result<Vec<f32>> {
            let v = if text.contains("crawler") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            };
            Ok(v)
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn model(&self) -> &str {
            "stub"
        }
    }

    fn test_config(url: Url) -> IngestConfig {
        IngestConfig {
            url,
            crawl: CrawlConfig {
                page_limit: 10,
                request_timeout_secs: 5,
                politeness_delay_ms: 0,
                user_agent: "sitechat-test/0.1".into(),
                max_redirects: 5,
                allow_subdomains: false,
            },
            chunking: ChunkConfig {
                chunk_size: 200,
                chunk_overlap: 20,
            },
        }
    }

    async fn mount_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn ingest_end_to_end_indexes_and_retrieves() {
        let server = MockServer::start().await;

        mount_page(
            &server,
            "/",
            r#"<html><body><main>
                <h1>Overview</h1>
                <p>This website documents a small tool for asking questions about websites.</p>
                <a href="/crawler">Crawler docs</a>
            </main></body></html>"#,
        )
        .await;
        mount_page(
            &server,
            "/crawler",
            r#"<html><body><main>
                <h1>Crawler</h1>
                <p>The crawler walks pages breadth-first and respects a strict page budget.</p>
            </main></body></html>"#,
        )
        .await;

        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(Arc::new(StubEmbedder), store, 3);

        let url = Url::parse(&server.uri()).unwrap();
        let report = ingest(&test_config(url), &indexer, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.pages_indexed, 2);
        assert!(report.chunk_count >= 2);

        // The indexed content is retrievable, best match first.
        let results = indexer.retrieve("tell me about the crawler").await.unwrap();
        assert!(!results.is_empty());
        assert!(results[0].chunk.content.contains("breadth-first"));
        assert!(results[0].chunk.metadata.source.ends_with("/crawler"));
    }

    #[tokio::test]
    async fn ingest_skips_thin_pages_but_continues() {
        let server = MockServer::start().await;

        mount_page(
            &server,
            "/",
            r#"<html><body><main>
                <p>A healthy page with more than enough prose to clear the extraction floor.</p>
                <a href="/thin">thin</a>
            </main></body></html>"#,
        )
        .await;
        // Under the 50-character floor — extracted as None and skipped.
        mount_page(&server, "/thin", "<html><body><main><p>Too short.</p></main></body></html>")
            .await;

        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(Arc::new(StubEmbedder), store, 3);

        let url = Url::parse(&server.uri()).unwrap();
        let report = ingest(&test_config(url), &indexer, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.pages_indexed, 1);
    }

    #[tokio::test]
    async fn query_against_empty_index_returns_fallback() {
        use sitechat_qa::{LanguageModel, QaChain};
        use sitechat_shared::QaConfig;

        /// A model that must never be reached.
        struct NeverModel;

        #[async_trait]
        impl LanguageModel for NeverModel {
            async fn generate(&self, _prompt: &str) -> sitechat_shared::Result<String> {
                panic!("language model must not be invoked for an empty index");
            }
        }

        let store = Arc::new(MemoryStore::new());
        let indexer = Arc::new(Indexer::new(Arc::new(StubEmbedder), store, 3));
        let chain = QaChain::new(
            indexer,
            Arc::new(NeverModel),
            QaConfig {
                top_k: 3,
                history_window: 5,
            },
        );

        let result = chain.answer("what does the site say?", &[]).await;

        assert_eq!(
            result.answer,
            "The answer is not available on the provided website."
        );
        assert!(result.sources.is_empty());
    }

    #[tokio::test]
    async fn ingest_fails_when_nothing_can_be_fetched() {
        let store = Arc::new(MemoryStore::new());
        let indexer = Indexer::new(Arc::new(StubEmbedder), store, 3);

        let url = Url::parse("http://127.0.0.1:1/").unwrap();
        let err = ingest(&test_config(url), &indexer, &SilentProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("no pages"));
    }
}
