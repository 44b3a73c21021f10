//! Site Search - command-line host for the search core
//!
//! Reads one query per line from stdin and prints render events as JSON
//! lines on stdout. Logs go to stderr.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use site_search::models::paginate;
use site_search::orchestrator::{RenderEvent, RenderSink};
use site_search::tasks::WARMUP_INITIAL_DELAY;
use site_search::token::{FileStorage, MemoryStorage, SharedStorage};
use site_search::{
    spawn_cleanup_task, spawn_warmup_task, Config, HttpUpstream, RequestCoordinator, ResultCache,
    SearchOrchestrator, SystemClock, TokenStore,
};

/// Prints events as JSON lines, trimming results to the first page.
struct StdoutSink {
    per_page: usize,
}

impl RenderSink for StdoutSink {
    fn render(&self, event: RenderEvent) {
        let line = match &event {
            RenderEvent::Results {
                query,
                records,
                cached,
            } => {
                let page = paginate(records, 1, self.per_page);
                serde_json::json!({
                    "event": "results",
                    "query": query,
                    "cached": cached,
                    "total": records.len(),
                    "total_pages": page.total_pages,
                    "records": page.items,
                })
            }
            other => match serde_json::to_value(other) {
                Ok(value) => value,
                Err(e) => {
                    warn!(error = %e, "failed to encode render event");
                    return;
                }
            },
        };

        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{line}").and_then(|_| stdout.flush()) {
            warn!(error = %e, "failed to write to stdout");
        }
    }
}

/// Main entry point for the site search host.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build upstream client, visitor storage, token store, cache and coordinator
/// 4. Start background cleanup and warm-up tasks
/// 5. Search each stdin line until EOF, Ctrl+C or SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "site_search=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting site search");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        base_url = %config.base_url,
        site_name = %config.site_name,
        mode = %config.mode,
        max_entries = config.max_entries,
        cache_ttl = ?config.cache_ttl,
        "configuration loaded"
    );

    let clock = Arc::new(SystemClock);
    let upstream = Arc::new(HttpUpstream::from_config(&config).context("building HTTP client")?);
    let storage: SharedStorage = match &config.storage_path {
        Some(path) => Arc::new(FileStorage::open(path).context("opening visitor storage")?),
        None => Arc::new(MemoryStorage::new()),
    };

    let tokens = Arc::new(TokenStore::new(
        upstream.clone(),
        storage,
        clock.clone(),
        config.site_name.clone(),
        config.user_agent.clone(),
    ));
    let cache = Arc::new(RwLock::new(ResultCache::new(
        config.max_entries,
        config.cache_ttl,
        config.eviction,
        clock,
    )));
    let coordinator = Arc::new(RequestCoordinator::new(
        upstream,
        config.site_params(),
        config.retry_policy(),
    ));
    let orchestrator = SearchOrchestrator::new(
        cache.clone(),
        coordinator.clone(),
        tokens.clone(),
        Arc::new(StdoutSink {
            per_page: config.items_per_page,
        }),
        config.mode,
        config.debounce_policy(),
    );

    let mut background: Vec<JoinHandle<()>> = Vec::new();
    if !config.cleanup_interval.is_zero() {
        background.push(spawn_cleanup_task(cache, config.cleanup_interval));
    }
    if !config.warmup_interval.is_zero() {
        background.push(spawn_warmup_task(
            coordinator,
            tokens,
            config.mode,
            WARMUP_INITIAL_DELAY,
            config.warmup_interval,
        ));
    }

    tokio::select! {
        result = read_queries(&orchestrator) => result?,
        _ = shutdown_signal() => {}
    }

    for handle in background {
        handle.abort();
    }
    info!("Site search shutdown complete");
    Ok(())
}

/// Searches each stdin line in turn until EOF.
async fn read_queries(orchestrator: &SearchOrchestrator) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        orchestrator.search_now(&line).await;
    }
    info!("stdin closed");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
