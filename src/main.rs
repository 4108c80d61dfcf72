mod api;
mod cli;
mod config;
mod coordinator;
mod db;
mod discovery;
mod error;
mod fetcher;
mod types;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::routes::{router, ApiState};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::coordinator::Coordinator;
use crate::db::{MemoryStore, RecordStore, SqliteStore};
use crate::discovery::discover_targets;
use crate::error::Result;
use crate::fetcher::HttpFetcher;

/// Failures listed individually at the end of a run; the rest are counted.
const MAX_FAILURES_LISTED: usize = 20;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let cfg = match load_config(&cli.command) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    let result = match cli.command {
        Commands::Scrape { dry_run, .. } => run_scrape(cfg, dry_run).await,
        Commands::Serve { .. } => run_serve(cfg).await,
    };
    if let Err(e) = result {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

/// Environment first, then command-line flags on top.
fn load_config(command: &Commands) -> Result<Config> {
    let cfg = Config::from_env()?;
    match command {
        Commands::Scrape {
            max_workers, leagues, ..
        } => cfg.with_max_workers(*max_workers)?.with_leagues(leagues.clone()),
        Commands::Serve { port } => Ok(cfg.with_port(*port)),
    }
}

async fn run_scrape(cfg: Config, dry_run: bool) -> Result<()> {
    let memory = dry_run.then(|| Arc::new(MemoryStore::new()));
    let store: Arc<dyn RecordStore> = match &memory {
        Some(m) => {
            info!("Dry run: records are kept in memory only");
            Arc::clone(m) as Arc<dyn RecordStore>
        }
        None => Arc::new(SqliteStore::new(db::connect(&cfg).await?)),
    };
    let fetcher = Arc::new(HttpFetcher::new(&cfg)?);

    // --- Discovery: leagues -> squads -> players ---
    let (targets, stats) = discover_targets(&fetcher, store.as_ref(), &cfg.league_urls, cfg.max_workers).await?;
    info!(
        "Discovery complete: {} players ({} links) from {} teams ({} of {} leagues ok, {} squads failed, {} duplicate links)",
        targets.len(),
        stats.player_links,
        stats.teams,
        stats.leagues_ok,
        stats.leagues_ok + stats.leagues_failed,
        stats.squads_failed,
        stats.duplicate_players,
    );

    // --- Player run ---
    let coordinator = Coordinator::new(fetcher, Arc::clone(&store), cfg.max_workers);
    let summary = coordinator.run(targets).await;

    info!(
        "Run finished in {:.1}s: {} of {} players scraped (fetch p50={}us p95={}us p99={}us)",
        summary.elapsed.as_secs_f64(),
        summary.succeeded,
        summary.total(),
        summary.p50_fetch_us.unwrap_or(0),
        summary.p95_fetch_us.unwrap_or(0),
        summary.p99_fetch_us.unwrap_or(0),
    );
    for (target, reason) in summary.failures.iter().take(MAX_FAILURES_LISTED) {
        warn!(player = %target, "[FAILED] {}: {reason}", target.url);
    }
    if summary.failures.len() > MAX_FAILURES_LISTED {
        warn!("... and {} more failures", summary.failures.len() - MAX_FAILURES_LISTED);
    }
    if let Some(m) = memory {
        if m.is_empty() {
            warn!("Dry run kept no players");
        } else {
            info!("Dry run kept {} players in memory", m.len());
        }
    }

    Ok(())
}

async fn run_serve(cfg: Config) -> Result<()> {
    let pool = db::connect(&cfg).await?;

    let app = router(ApiState { pool });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
