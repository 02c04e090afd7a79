//! # Smart Search server binary
//!
//! Starts the HTTP backend: loads configuration from the environment,
//! connects to the OpenSearch cluster (failing fast if it is unreachable),
//! and serves the search and details endpoints.
//!
//! ## Usage
//!
//! ```bash
//! smart-search [--bind 0.0.0.0:8000]
//! ```
//!
//! ## Environment
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | `OPENSEARCH_HOST` | `localhost` | Backend hostname |
//! | `OPENSEARCH_PORT` | `9200` | Backend port |
//! | `USE_AWS` | `false` | Sign requests with AWS SigV4 |
//! | `VERIFY_CERTS` | `false` | Verify TLS certificates |
//! | `OPENSEARCH_USERNAME` | `admin` | Basic-auth username |
//! | `OPENSEARCH_PASSWORD` | `admin` | Basic-auth password |
//! | `SEARCH_ALIAS` | `smart_search_alias` | Type-ahead alias |
//! | `SEARCH_FIELDS` | `*` | Fields queried by type-ahead |
//! | `SEARCH_INDEX_TYPES` | `member_1=member,plan_1=plan` | Index classification |
//! | `INDEX_TYPE_FALLBACK` | `plan` | Type for unmapped indices |
//! | `EVENTS_INDEX` | `member_communication_events` | Communication events index |
//! | `ML_MODEL_ID` | (fixed model id) | Summarization model |
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use smart_search::backend::OpenSearchClient;
use smart_search::config::load_config;
use smart_search::server::{run_server, AppState};
use smart_search::summarize::MlSummarizer;

/// Smart Search — type-ahead search and record summarization over OpenSearch.
#[derive(Parser)]
#[command(
    name = "smart-search",
    about = "Type-ahead search and record-summarization backend over OpenSearch",
    version
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Arc::new(load_config()?);

    // Fail fast: the process never serves traffic with a dead backend handle.
    let client = Arc::new(OpenSearchClient::connect(&config.backend).await?);
    let summarizer = Arc::new(MlSummarizer::new(client.clone(), &config.summarizer));

    let state = AppState {
        config,
        backend: client,
        summarizer,
    };

    run_server(&cli.bind, state).await
}
