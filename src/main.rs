//! # firescout CLI
//!
//! Command-line interface for the firescout crawl and search pipelines.
//!
//! ## Subcommands
//!
//! - `crawl`: submit a crawl job and persist pages as they are discovered
//! - `search`: run a quick, deep, or selective objective search on a site
//! - `analyze`: scrape one page and structure its content with the model
//! - `batch`: analyze several pages in sequence
//! - `extract`: pull user-specified CSS selectors from one page
//!
//! Service endpoints and credentials come from the environment:
//! `FIRECRAWL_API_URL` (default `http://localhost:3002`), `FIRECRAWL_API_KEY`
//! (optional), `ANTHROPIC_API_KEY`, `ANTHROPIC_MODEL_NAME`, and `MAX_TOKENS`.

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use firescout::crawl::{CrawlConfig, CrawlPoller, CrawlSummary};
use firescout::firecrawl::ScrapeApi;
use firescout::search::{SearchOrchestrator, SearchStrategy};
use firescout::{anthropic, firecrawl};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use tokio::sync::watch;
use tracing::instrument;
use tracing_subscriber::EnvFilter;

/// Default crawl service endpoint
const DEFAULT_API_URL: &str = "http://localhost:3002";

/// Default model for search judgments
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// Default token budget for model responses
const DEFAULT_MAX_TOKENS: u32 = 8192;

#[derive(Parser)]
#[command(author, version, about = "Crawl orchestration and LLM-assisted site search", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a website and save its content
    Crawl(CrawlArgs),

    /// Search a website for an objective
    Search(SearchArgs),

    /// Analyze a single page into structured JSON
    Analyze(AnalyzeArgs),

    /// Analyze several pages in sequence
    Batch(BatchArgs),

    /// Extract CSS-selector fields from a single page
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct CrawlArgs {
    /// Website URL to crawl
    #[arg(required = true)]
    url: String,

    /// Maximum crawl depth
    #[arg(long, default_value = "10")]
    max_depth: u32,

    /// Maximum number of pages to crawl (unlimited when omitted)
    #[arg(long)]
    max_pages: Option<u32>,

    /// Allow crawling external links
    #[arg(long)]
    allow_external: bool,

    /// Don't crawl subdomains
    #[arg(long = "no-subdomains")]
    no_subdomains: bool,

    /// Languages to include (e.g. en es fr); empty accepts all
    #[arg(long, num_args = 1.., default_values_t = vec!["en".to_string()])]
    languages: Vec<String>,

    /// URL patterns to exclude
    #[arg(long = "exclude", num_args = 1..)]
    exclude_patterns: Vec<String>,

    /// URL patterns to include
    #[arg(long = "include", num_args = 1..)]
    include_patterns: Vec<String>,

    /// Output directory (default: crawls/<host>)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also save raw HTML content
    #[arg(long = "save-html")]
    save_html: bool,

    /// Seconds between progress checks
    #[arg(long, default_value = "5")]
    check_interval: u64,

    /// API timeout in milliseconds
    #[arg(long, default_value = "30000")]
    timeout: u64,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Website URL to search
    #[arg(required = true)]
    url: String,

    /// Search objective or query
    #[arg(required = true)]
    objective: String,

    /// Type of search to perform
    #[arg(short = 't', long, default_value = "quick", value_parser = ["quick", "deep", "selective"])]
    strategy: String,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// URL to analyze
    #[arg(required = true)]
    url: String,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// URLs to analyze, processed in order
    #[arg(required = true, num_args = 1..)]
    urls: Vec<String>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL to extract from
    #[arg(required = true)]
    url: String,

    /// JSON object mapping field names to CSS selectors,
    /// e.g. '{"title": "h1", "price": ".amount"}'
    #[arg(long, value_parser = parse_selectors)]
    selectors: BTreeMap<String, String>,
}

/// Parse the --selectors argument as a flat JSON object
fn parse_selectors(raw: &str) -> Result<BTreeMap<String, String>, String> {
    serde_json::from_str(raw).map_err(|e| format!("selectors must be a JSON object: {}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl(args) => crawl_command(args).await?,
        Commands::Search(args) => search_command(args).await?,
        Commands::Analyze(args) => analyze_command(args).await?,
        Commands::Batch(args) => batch_command(args).await?,
        Commands::Extract(args) => extract_command(args).await?,
    }

    Ok(())
}

#[instrument(skip(args))]
async fn crawl_command(args: CrawlArgs) -> anyhow::Result<()> {
    let mut builder = CrawlConfig::builder(&args.url)?
        .max_depth(args.max_depth)
        .max_pages(args.max_pages)
        .allow_external(args.allow_external)
        .allow_subdomains(!args.no_subdomains)
        .languages(args.languages.into_iter().collect())
        .exclude_patterns(args.exclude_patterns)
        .include_patterns(args.include_patterns)
        .save_raw_html(args.save_html)
        .check_interval_secs(args.check_interval)
        .timeout_ms(args.timeout);
    if let Some(dir) = args.output_dir {
        builder = builder.output_dir(dir);
    }
    let config = builder.build();

    let client = firecrawl_client_from_env(args.timeout);
    let output_dir = config.output_dir.clone();

    // Ctrl-C flips the shutdown signal; the poller drains and flushes
    // its manifest instead of dying mid-write.
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });

    let poller = CrawlPoller::new(client.crawl(), config);
    let summary = poller.run(rx).await?;

    print_summary(&summary, &output_dir)?;
    Ok(())
}

#[instrument(skip(args))]
async fn search_command(args: SearchArgs) -> anyhow::Result<()> {
    let strategy: SearchStrategy = args.strategy.parse().map_err(|e: String| anyhow!(e))?;

    let client = firecrawl_client_from_env(30_000);
    let model = anthropic_client_from_env()?;

    let orchestrator =
        SearchOrchestrator::new(client.map(), client.scrape(), model, max_tokens_from_env());
    let report = orchestrator
        .search(strategy, &args.url, &args.objective)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[instrument(skip(args))]
async fn analyze_command(args: AnalyzeArgs) -> anyhow::Result<()> {
    let client = firecrawl_client_from_env(30_000);
    let model = anthropic_client_from_env()?;

    let orchestrator =
        SearchOrchestrator::new(client.map(), client.scrape(), model, max_tokens_from_env());
    let value = orchestrator.analyze(&args.url).await?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[instrument(skip(args))]
async fn batch_command(args: BatchArgs) -> anyhow::Result<()> {
    let client = firecrawl_client_from_env(30_000);
    let model = anthropic_client_from_env()?;

    let orchestrator =
        SearchOrchestrator::new(client.map(), client.scrape(), model, max_tokens_from_env());
    let results = orchestrator.analyze_batch(&args.urls).await;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

#[instrument(skip(args))]
async fn extract_command(args: ExtractArgs) -> anyhow::Result<()> {
    let client = firecrawl_client_from_env(30_000);
    let value = client.scrape().extract(&args.url, &args.selectors).await?;

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

/// Build the crawl service client from environment variables
fn firecrawl_client_from_env(timeout_ms: u64) -> firecrawl::Client {
    let base_url =
        std::env::var("FIRECRAWL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
    let api_key = std::env::var("FIRECRAWL_API_KEY").ok();
    firecrawl::Client::with_timeout_ms(base_url, api_key, timeout_ms)
}

/// Build the model client from environment variables
fn anthropic_client_from_env() -> anyhow::Result<anthropic::Client> {
    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .context("ANTHROPIC_API_KEY environment variable must be set")?;
    let model =
        std::env::var("ANTHROPIC_MODEL_NAME").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    Ok(anthropic::Client::new(api_key, model))
}

/// Token budget from the environment, with a sensible default
fn max_tokens_from_env() -> u32 {
    std::env::var("MAX_TOKENS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_TOKENS)
}

/// Print the color-coded end-of-run summary
fn print_summary(summary: &CrawlSummary, output_dir: &std::path::Path) -> anyhow::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    writeln!(&mut stdout)?;
    colored_line(
        &mut stdout,
        Color::Magenta,
        if summary.interrupted {
            "Crawl Summary (interrupted):"
        } else {
            "Crawl Summary:"
        },
    )?;
    colored_line(&mut stdout, Color::Green, &format!("  Saved: {} files", summary.saved))?;
    colored_line(
        &mut stdout,
        Color::Yellow,
        &format!("  Skipped: {} pages", summary.skipped),
    )?;
    colored_line(&mut stdout, Color::Red, &format!("  Errors: {} pages", summary.errors))?;
    colored_line(
        &mut stdout,
        Color::Blue,
        &format!("  Total URLs: {}", summary.visited),
    )?;
    colored_line(
        &mut stdout,
        Color::Blue,
        &format!(
            "  Time taken: {:.1}s ({:.1} pages/sec)",
            summary.elapsed.as_secs_f64(),
            summary.pages_per_second()
        ),
    )?;
    colored_line(
        &mut stdout,
        Color::Green,
        &format!("  Output directory: {}", output_dir.display()),
    )?;
    Ok(())
}

fn colored_line(stream: &mut StandardStream, color: Color, text: &str) -> std::io::Result<()> {
    stream.set_color(ColorSpec::new().set_fg(Some(color)))?;
    writeln!(stream, "{}", text)?;
    stream.reset()
}
