use clap::{Parser, Subcommand};

use crate::config::DEFAULT_MAX_WORKERS;

/// Scrape football player profiles and season stats, and serve them.
#[derive(Parser, Debug)]
#[command(name = "footgraph", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover players from the league pages and scrape each one.
    Scrape {
        /// Player pages fetched at the same time.
        #[arg(short = 'w', long, visible_alias = "max_workers", default_value_t = DEFAULT_MAX_WORKERS)]
        max_workers: usize,
        /// League overview URL to walk instead of the default five. Repeatable.
        #[arg(short, long = "league", value_name = "URL")]
        leagues: Vec<String>,
        /// Keep results in memory; nothing is written to the database.
        #[arg(long)]
        dry_run: bool,
    },
    /// Serve the stored players over a read-only JSON API.
    Serve {
        /// Listen port. Overrides API_PORT.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scrape_defaults_and_repeated_leagues() {
        let cli = Cli::parse_from([
            "footgraph",
            "scrape",
            "--league",
            "https://a.example/leagues/1/overview/x",
            "--league",
            "https://a.example/leagues/2/overview/y",
        ]);
        match cli.command {
            Commands::Scrape {
                max_workers,
                leagues,
                dry_run,
            } => {
                assert_eq!(max_workers, DEFAULT_MAX_WORKERS);
                assert_eq!(leagues.len(), 2);
                assert!(!dry_run);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn underscore_worker_flag_is_accepted() {
        let cli = Cli::parse_from(["footgraph", "scrape", "--max_workers", "8", "--dry-run"]);
        assert!(matches!(
            cli.command,
            Commands::Scrape {
                max_workers: 8,
                dry_run: true,
                ..
            }
        ));
    }

    #[test]
    fn serve_takes_a_port() {
        let cli = Cli::parse_from(["footgraph", "serve", "--port", "8080"]);
        assert!(matches!(cli.command, Commands::Serve { port: Some(8080) }));
    }
}
