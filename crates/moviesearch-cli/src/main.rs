//! moviesearch - OMDb movie search CLI.

/// Application configuration (TOML).
mod config;
/// New search term notifications.
mod notify;

use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures::{StreamExt, TryStreamExt};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{API_KEY_ENV, AppConfig, resolve_config_path};
use crate::notify::{
    BackgroundDispatcher, ConfiguredNotifier, LogNotifier, NotifyOnCreate, WebhookNotifier,
};
use moviesearch_api::omdb::OmdbClient;
use moviesearch_db::SearchTermStore;

/// User-Agent sent to OMDb and the webhook.
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout for outbound HTTP calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config/data directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Show full details for one movie.
    Movie(MovieArgs),
    /// Search movies by title and record the search term.
    Search(SearchArgs),
    /// Saved search term operations.
    Terms(TermsCommand),
}

/// Arguments for the `movie` subcommand.
#[derive(clap::Args)]
struct MovieArgs {
    /// IMDb ID (e.g. "tt0133093").
    #[arg(long, required = true)]
    id: String,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search text (e.g. "the matrix").
    #[arg(long, required = true)]
    query: String,
    /// Stop after this many results (default: all pages).
    #[arg(long)]
    limit: Option<usize>,
}

/// Arguments for the `terms` subcommand.
#[derive(clap::Args)]
struct TermsCommand {
    /// Terms subcommand to run.
    #[command(subcommand)]
    command: TermsSubcommands,
}

/// Available terms subcommands.
#[derive(Subcommand)]
enum TermsSubcommands {
    /// List saved search terms, most recent first.
    List,
}

/// Builds an `OmdbClient` with the key from `OMDB_API_KEY` or the config file.
///
/// # Errors
///
/// Returns an error if no API key is configured, `omdb.base_url` is invalid,
/// or the client fails to build.
#[instrument(skip_all)]
fn build_omdb_client(config: &AppConfig) -> Result<OmdbClient> {
    let api_key = config
        .omdb
        .resolve_api_key(std::env::var(API_KEY_ENV).ok())?;

    let mut builder = OmdbClient::builder()
        .api_key(api_key)
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT);
    if let Some(ref base_url) = config.omdb.base_url {
        let url = Url::parse(base_url)
            .with_context(|| format!("invalid omdb.base_url: {base_url}"))?;
        builder = builder.base_url(url);
    }

    builder.build().context("failed to build OMDb client")
}

/// Selects the notifier for new search terms.
///
/// # Errors
///
/// Returns an error if `notify.webhook_url` is invalid or the HTTP client fails to build.
fn build_notifier(config: &AppConfig) -> Result<ConfiguredNotifier> {
    let Some(ref webhook_url) = config.notify.webhook_url else {
        return Ok(ConfiguredNotifier::Log(LogNotifier));
    };

    let url = Url::parse(webhook_url)
        .with_context(|| format!("invalid notify.webhook_url: {webhook_url}"))?;
    let http_client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("failed to build webhook HTTP client")?;

    Ok(ConfiguredNotifier::Webhook(WebhookNotifier::new(
        url,
        http_client,
    )))
}

/// Runs the `movie` subcommand.
///
/// # Errors
///
/// Returns an error if the client fails to build, the request fails, or the
/// response lacks a detail field.
#[instrument(skip_all)]
async fn run_movie(args: &MovieArgs, config: &AppConfig) -> Result<()> {
    let client = build_omdb_client(config)?;

    let movie = client
        .get_by_imdb_id(&args.id)
        .await
        .context("OMDb lookup request failed")?;

    if let Some(message) = movie.api_error() {
        tracing::warn!("OMDb: {message}");
    }

    tracing::info!("ID: {}", movie.imdb_id()?);
    tracing::info!("Title: {}", movie.title()?);
    tracing::info!("Year: {}", movie.year()?);
    tracing::info!("Runtime: {} min", movie.runtime_minutes()?);
    tracing::info!("Genres: {}", movie.genres()?.join(", "));
    tracing::info!("Plot: {}", movie.plot()?);

    Ok(())
}

/// Runs the `search` subcommand.
///
/// Saves the term first (first-time terms fire a background notification),
/// then streams results page by page.
///
/// # Errors
///
/// Returns an error if the client or database fails, or any page request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&PathBuf>, config: &AppConfig) -> Result<()> {
    let client = build_omdb_client(config)?;
    let dispatcher = Arc::new(BackgroundDispatcher::new(build_notifier(config)?)?);

    let mut store = SearchTermStore::open(dir).context("failed to open database")?;
    store.register(NotifyOnCreate::new(Arc::clone(&dispatcher)));
    let saved = store
        .save(&args.query)
        .context("failed to save search term")?;

    let result = print_search_results(&client, &saved.term, args.limit).await;
    dispatcher.shutdown().await;
    result
}

/// Streams search results, stopping after `limit` items when given.
async fn print_search_results(client: &OmdbClient, term: &str, limit: Option<usize>) -> Result<()> {
    let stream = client
        .search(term)
        .into_stream()
        .take(limit.unwrap_or(usize::MAX));
    let mut stream = pin!(stream);

    let mut count: usize = 0;
    tracing::info!("ID\t\tYear\tTitle");
    while let Some(movie) = stream
        .try_next()
        .await
        .context("OMDb search request failed")?
    {
        tracing::info!(
            "{}\t{}\t{}",
            movie.imdb_id()?,
            movie.year()?,
            movie.title()?,
        );
        count = count.saturating_add(1);
    }
    tracing::info!("Total: {count} movies");

    Ok(())
}

/// Runs the `terms list` subcommand.
///
/// # Errors
///
/// Returns an error if the database fails.
#[instrument(skip_all)]
fn run_terms_list(dir: Option<&PathBuf>) -> Result<()> {
    let store = SearchTermStore::open(dir).context("failed to open database")?;
    let terms = store.list().context("failed to load search terms")?;

    if terms.is_empty() {
        tracing::info!("No search terms saved yet. Run `search` first.");
        return Ok(());
    }

    tracing::info!("LastSearch\t\t\tTerm");
    for term in &terms {
        tracing::info!("{}\t{}", term.last_search, term.term);
    }
    tracing::info!("Total: {} terms", terms.len());

    Ok(())
}

/// Installs the tracing subscriber (`RUST_LOG`, default `info`).
fn init_tracing() {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if config loading or subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config_path =
        resolve_config_path(cli.dir.as_ref()).context("failed to resolve config path")?;
    let config = AppConfig::load(&config_path).context("failed to load config")?;

    match cli.command {
        Commands::Movie(args) => run_movie(&args, &config).await,
        Commands::Search(args) => run_search(&args, cli.dir.as_ref(), &config).await,
        Commands::Terms(terms) => match terms.command {
            TermsSubcommands::List => run_terms_list(cli.dir.as_ref()),
        },
    }
}
