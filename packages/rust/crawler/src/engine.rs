//! Sequential, scope-aware web crawler engine.
//!
//! The crawler starts from a given URL and performs a breadth-first
//! traversal of the site's anchor-link graph, one fetch at a time with a
//! politeness delay between requests. Traversal is bounded by a page
//! budget and scoped to the start URL's domain; per-page failures are
//! logged and skipped, never fatal to the crawl as a whole.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, StatusCode, header, redirect};
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use sitechat_shared::{CrawlConfig, PageRecord, Result, SiteChatError};

// ---------------------------------------------------------------------------
// CrawlReport
// ---------------------------------------------------------------------------

/// Summary of a completed crawl operation.
///
/// `pages` is the ordered BFS result sequence. An unreachable root yields
/// an empty `pages` vector; the caller decides whether that is fatal.
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Successfully fetched pages, in traversal order.
    pub pages: Vec<PageRecord>,
    /// Pages skipped (non-200, non-HTML, off-domain redirect, fetch error).
    pub pages_skipped: usize,
    /// Errors encountered (URL, error message).
    pub errors: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Sequential BFS crawler with same-domain scoping and a page budget.
pub struct Crawler {
    config: CrawlConfig,
    client: Client,
}

impl Crawler {
    /// Create a new crawler with the given configuration.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    /// Crawl starting from `start_url`, returning fetched pages in BFS order.
    ///
    /// Per-page failures are recorded and skipped; the crawl itself never
    /// fails. The traversal stops when the queue empties or the page budget
    /// is reached.
    #[instrument(skip_all, fields(start_url = %start_url, page_limit = self.config.page_limit))]
    pub async fn crawl(&self, start_url: &Url) -> CrawlReport {
        let scope = DomainScope::new(start_url, self.config.allow_subdomains);

        let mut queue: VecDeque<Url> = VecDeque::from([start_url.clone()]);
        let mut visited: HashSet<String> = HashSet::from([dedup_key(start_url)]);
        let mut report = CrawlReport::default();

        info!(
            politeness_delay_ms = self.config.politeness_delay_ms,
            allow_subdomains = self.config.allow_subdomains,
            "starting crawl"
        );

        while let Some(current) = queue.pop_front() {
            if report.pages.len() >= self.config.page_limit {
                break;
            }

            // Politeness delay before every fetch.
            if self.config.politeness_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.politeness_delay_ms)).await;
            }

            let page = match self.fetch_page(&current, &scope).await {
                Ok(Some(page)) => page,
                Ok(None) => {
                    report.pages_skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(url = %current, error = %e, "error crawling page, skipping");
                    report.errors.push((current.to_string(), e.to_string()));
                    report.pages_skipped += 1;
                    continue;
                }
            };

            // Only discover new links while still under the budget.
            let links = if report.pages.len() + 1 < self.config.page_limit {
                extract_links(&page.url, &page.html)
            } else {
                Vec::new()
            };
            report.pages.push(page);

            for link in links {
                if !scope.in_scope(&link) {
                    continue;
                }
                if visited.insert(dedup_key(&link)) {
                    queue.push_back(link);
                }
            }
        }

        info!(
            pages_fetched = report.pages.len(),
            pages_skipped = report.pages_skipped,
            errors = report.errors.len(),
            "crawl complete"
        );

        report
    }

    /// Fetch a single page. `Ok(None)` means "skip this page" (non-200,
    /// non-HTML, or an off-domain redirect); `Err` is a transport failure.
    async fn fetch_page(&self, url: &Url, scope: &DomainScope) -> Result<Option<PageRecord>> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| classify_request_error(e, self.config.request_timeout_secs))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%url, %status, "skipping page: non-200 status");
            return Ok(None);
        }

        // The response URL is where we ended up after redirects. A redirect
        // that left the starting domain means the page is out of scope.
        let final_url = response.url().clone();
        if !scope.in_scope(&final_url) {
            warn!(%url, final_url = %final_url, "redirected off-domain, skipping");
            return Ok(None);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();
        if !content_type.contains("text/html") {
            warn!(%url, content_type, "skipping non-HTML content");
            return Ok(None);
        }

        let html = response
            .text()
            .await
            .map_err(|e| SiteChatError::Network(format!("{url}: body read failed: {e}")))?;

        Ok(Some(PageRecord {
            url: final_url,
            html,
            fetched_at: Utc::now(),
            status_code: status.as_u16(),
        }))
    }
}

// ---------------------------------------------------------------------------
// HTTP client construction & error classification
// ---------------------------------------------------------------------------

/// Build the HTTP client used for crawling and validation.
pub(crate) fn build_client(config: &CrawlConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(redirect::Policy::limited(config.max_redirects))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| SiteChatError::Network(format!("failed to build HTTP client: {e}")))
}

/// Map a transport error onto the typed failure taxonomy.
pub(crate) fn classify_request_error(err: reqwest::Error, timeout_secs: u64) -> SiteChatError {
    if err.is_timeout() {
        return SiteChatError::Timeout {
            seconds: timeout_secs,
        };
    }
    if err.is_redirect() {
        return SiteChatError::RedirectLoop(err.to_string());
    }
    if is_tls_failure(&err) {
        return SiteChatError::Tls(err.to_string());
    }
    SiteChatError::Network(err.to_string())
}

/// Walk the error chain looking for a certificate failure.
fn is_tls_failure(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let text = cause.to_string();
        if text.contains("certificate") || text.to_ascii_lowercase().contains("tls") {
            return true;
        }
        source = cause.source();
    }
    false
}

// ---------------------------------------------------------------------------
// Scope checking
// ---------------------------------------------------------------------------

/// Determines which URLs are "in scope" for a crawl: same host and port
/// as the start URL, with optional subdomain folding.
struct DomainScope {
    host: String,
    port: Option<u16>,
    allow_subdomains: bool,
}

impl DomainScope {
    fn new(start_url: &Url, allow_subdomains: bool) -> Self {
        Self {
            host: start_url.host_str().unwrap_or("").to_string(),
            port: start_url.port_or_known_default(),
            allow_subdomains,
        }
    }

    fn in_scope(&self, url: &Url) -> bool {
        if url.scheme() != "http" && url.scheme() != "https" {
            return false;
        }

        if url.port_or_known_default() != self.port {
            return false;
        }

        let host = url.host_str().unwrap_or("");
        if host == self.host {
            return true;
        }

        self.allow_subdomains && host.ends_with(&format!(".{}", self.host))
    }
}

// ---------------------------------------------------------------------------
// Link extraction & dedup
// ---------------------------------------------------------------------------

/// Extract all anchor links from a page, resolved against its URL with
/// fragments stripped. Pure-fragment, `javascript:`, and `mailto:` links
/// are ignored.
fn extract_links(base_url: &Url, html: &str) -> Vec<Url> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href]").expect("valid selector");
    let mut links = Vec::new();

    for el in doc.select(&link_sel) {
        if let Some(href) = el.value().attr("href") {
            if href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
            {
                continue;
            }

            if let Ok(mut resolved) = base_url.join(href) {
                resolved.set_fragment(None);
                links.push(resolved);
            }
        }
    }

    links
}

/// Dedup key for the visited set: the URL with its fragment stripped, so
/// `https://x/a#foo` and `https://x/a#bar` collapse to one key.
fn dedup_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
