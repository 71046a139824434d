//! CLI command definitions, routing, and tracing setup.

use std::io::{BufRead, Write};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

use sitechat_core::{ChatSession, EngineFactory, IngestConfig, IngestReport, ProgressReporter, ingest};
use sitechat_crawler::validate;
use sitechat_index::{Indexer, MemoryStore, Retriever};
use sitechat_qa::QaChain;
use sitechat_shared::{
    AppConfig, ChunkConfig, CrawlConfig, EngineConfig, QaConfig, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// sitechat — ask questions about any website.
#[derive(Parser)]
#[command(
    name = "sitechat",
    version,
    about = "Crawl a website, index its content, and answer questions about it.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Check that a URL is well-formed and reachable as an HTML page.
    Validate {
        /// URL to validate.
        url: String,
    },

    /// Ingest a website and answer a single question.
    Ask {
        /// Website URL to ingest.
        url: String,

        /// The question to answer.
        question: String,
    },

    /// Ingest a website and start an interactive question loop.
    Chat {
        /// Website URL to ingest.
        url: String,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Validate { url } => cmd_validate(&url).await,
        Command::Ask { url, question } => cmd_ask(&url, &question).await,
        Command::Chat { url } => cmd_chat(&url).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_validate(url: &str) -> Result<()> {
    let config = load_config()?;
    let crawl_config = CrawlConfig::from(&config);

    let report = validate(url, &crawl_config).await;
    if report.valid {
        println!("OK: {url} is reachable and serves HTML.");
        Ok(())
    } else {
        Err(eyre!(
            "{url} failed validation: {}",
            report.error.unwrap_or_else(|| "unknown reason".into())
        ))
    }
}

async fn cmd_ask(url: &str, question: &str) -> Result<()> {
    let (chain, mut session) = ingest_site(url).await?;

    let result = chain.answer(question, session.history()).await;
    session.push_human(question);
    session.push_ai(result.answer.clone());

    println!();
    println!("{}", result.answer);
    print_sources(&result.sources);

    Ok(())
}

async fn cmd_chat(url: &str) -> Result<()> {
    let (chain, mut session) = ingest_site(url).await?;

    println!();
    println!("Ask questions about {url} — type 'exit' or 'quit' to leave.");

    let stdin = std::io::stdin();
    loop {
        print!("you> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let result = chain.answer(question, session.history()).await;
        session.push_human(question);
        session.push_ai(result.answer.clone());

        println!();
        println!("{}", result.answer);
        print_sources(&result.sources);
        println!();
    }

    info!(session = %session.id(), turns = session.history().len(), "chat session ended");
    Ok(())
}

/// Validate, crawl, and index a site; returns the QA chain and a fresh session.
async fn ingest_site(url: &str) -> Result<(QaChain, ChatSession)> {
    // Validate credentials before any network work.
    let config = load_config()?;
    let engine_config = EngineConfig::from_app_config(&config)?;

    let crawl_config = CrawlConfig::from(&config);
    let report = validate(url, &crawl_config).await;
    if !report.valid {
        return Err(eyre!(
            "{url} failed validation: {}",
            report.error.unwrap_or_else(|| "unknown reason".into())
        ));
    }

    let parsed_url = Url::parse(url).map_err(|e| eyre!("invalid URL '{url}': {e}"))?;

    info!(url, "ingesting website");

    let factory = EngineFactory::new(engine_config);
    let store = Arc::new(MemoryStore::new());
    let qa_config = QaConfig::from(&config);
    let indexer = Arc::new(Indexer::new(factory.embedder()?, store, qa_config.top_k));

    let ingest_config = IngestConfig {
        url: parsed_url.clone(),
        crawl: crawl_config,
        chunking: ChunkConfig::from(&config),
    };

    let reporter = CliProgress::new();
    let report = ingest(&ingest_config, &indexer, &reporter).await?;

    println!();
    println!("  Website indexed successfully!");
    println!("  Pages fetched: {}", report.pages_fetched);
    println!("  Pages indexed: {}", report.pages_indexed);
    println!("  Chunks:        {}", report.chunk_count);
    println!("  Time:          {:.1}s", report.elapsed.as_secs_f64());

    let retriever: Arc<dyn Retriever> = indexer;
    let chain = QaChain::new(retriever, factory.language_model()?, qa_config);
    let session = ChatSession::new(parsed_url);

    Ok((chain, session))
}

/// Print the deduplicated source URLs backing an answer.
fn print_sources(sources: &[sitechat_shared::Chunk]) {
    let mut seen: Vec<&str> = Vec::new();
    for chunk in sources {
        let source = chunk.metadata.source.as_str();
        if !seen.contains(&source) {
            seen.push(source);
        }
    }
    for source in seen {
        println!("  source: {source}");
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("valid template")
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_processed(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Processing [{current}/{total}] {url}"));
    }

    fn done(&self, _report: &IngestReport) {
        self.spinner.finish_and_clear();
    }
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
