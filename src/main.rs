//! # distill
//!
//! Submits a URL or a piece of text to the processing pipeline, waits for it
//! to reach a terminal state and prints the result as JSON.
//!
//! ```bash
//! GEMINI_API_KEY=... distill url https://example.com/article
//! cat notes.txt | distill text
//! DATABASE_URL=postgres://... distill recent --limit 5
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use distill::{
    config::Config,
    entities::ContentSource,
    insights::GeminiClient,
    pipeline::{ContentResult, ListenerRegistry, LoggingListener, Orchestrator},
    repositories::{ContentStore, MemoryContentStore, PgContentStore},
};
use std::{sync::Arc, time::Duration};
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Parser)]
#[command(
    name = "distill",
    version,
    about = "Extract the article from a page or text and summarize it"
)]
struct Cli {
    /// How often to poll for the item's status, in milliseconds.
    #[arg(long, global = true, default_value_t = 250)]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page, extract its main content and summarize it.
    Url { url: String },

    /// Summarize text given as an argument, or read from stdin when omitted.
    Text { text: Option<String> },

    /// Show the most recently submitted items.
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn open_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    let Some(database_url) = config.database_url() else {
        info!("DATABASE_URL not set, results are kept in memory only");
        return Ok(Arc::new(MemoryContentStore::new()));
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run migrations")?;

    Ok(Arc::new(PgContentStore::new(pool)))
}

async fn read_stdin() -> Result<String> {
    let mut text = String::new();
    tokio::io::stdin()
        .read_to_string(&mut text)
        .await
        .context("failed to read text from stdin")?;
    Ok(text)
}

async fn wait_for_result(
    orchestrator: &Orchestrator,
    id: Uuid,
    poll_interval: Duration,
) -> Result<ContentResult> {
    loop {
        let result = orchestrator.get_result(id).await?;
        if result.status.is_terminal() {
            return Ok(result);
        }
        tokio::time::sleep(poll_interval).await;
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::from_env()?;
    let store = open_store(&config).await?;
    let generator = Arc::new(GeminiClient::from_config(&config)?);

    let mut listeners = ListenerRegistry::new();
    listeners.register(LoggingListener);

    let orchestrator = Orchestrator::new(
        store,
        generator,
        listeners,
        config.orchestrator_config(),
    )?;

    let source = match cli.command {
        Commands::Url { url } => ContentSource::Url(url),
        Commands::Text { text: Some(text) } => ContentSource::Text(text),
        Commands::Text { text: None } => ContentSource::Text(read_stdin().await?),
        Commands::Recent { limit } => {
            let recent = orchestrator.list_recent(limit).await?;
            orchestrator.shutdown().await;
            return print_json(&recent);
        }
    };

    let id = orchestrator.submit(source).await?;
    let poll_interval = Duration::from_millis(cli.poll_interval_ms.max(1));

    let result = tokio::select! {
        result = wait_for_result(&orchestrator, id, poll_interval) => result?,
        _ = tokio::signal::ctrl_c() => {
            warn!(content_id = %id, "interrupted, waiting for the item to finish");
            orchestrator.shutdown().await;
            orchestrator.get_result(id).await?
        }
    };

    orchestrator.shutdown().await;
    print_json(&result)?;

    if result.error_message.is_some() {
        bail!("processing failed");
    }
    Ok(())
}
