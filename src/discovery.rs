use std::collections::HashSet;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{error, info, warn};

use crate::coordinator::pool::fan_out;
use crate::db::RecordStore;
use crate::error::{AppError, Result};
use crate::fetcher::HttpFetcher;
use crate::types::{ScrapeTarget, TeamLink};

#[derive(Debug, Default)]
pub struct DiscoveryStats {
    pub leagues_ok: usize,
    pub leagues_failed: usize,
    pub teams: usize,
    pub squads_failed: usize,
    pub player_links: usize,
    pub duplicate_players: usize,
}

/// Walk league overview pages, then squad pages, and return one target per
/// distinct player. Clubs are saved as they are found.
///
/// Errors only when a whole stage comes back empty; single pages that fail are
/// logged and skipped.
pub async fn discover_targets(
    fetcher: &Arc<HttpFetcher>,
    store: &dyn RecordStore,
    league_urls: &[String],
    max_workers: usize,
) -> Result<(Vec<ScrapeTarget>, DiscoveryStats)> {
    let mut stats = DiscoveryStats::default();

    info!("Starting to scrape team links...");
    let league_pages: Vec<_> = stream::iter(league_urls.iter().cloned())
        .map(|url| {
            let fetcher = Arc::clone(fetcher);
            async move {
                let result = fetcher.fetch_league(&url).await;
                (url, result)
            }
        })
        .buffered(max_workers.max(1))
        .collect()
        .await;

    let mut teams: Vec<TeamLink> = Vec::new();
    for (url, result) in league_pages {
        match result {
            Ok(found) => {
                stats.leagues_ok += 1;
                info!(league = %url, teams = found.len(), "Found {} teams", found.len());
                teams.extend(found);
            }
            Err(e) => {
                stats.leagues_failed += 1;
                error!(league = %url, "Error while scraping team links: {e}");
            }
        }
    }

    for team in &teams {
        if let Err(e) = store.save_club(team).await {
            warn!(club = %team.club, league = %team.league, "Failed to save club: {e}");
        }
    }
    stats.teams = teams.len();
    info!("Found {} team links.", teams.len());
    if teams.is_empty() {
        return Err(AppError::Discovery("no team links found".to_string()));
    }

    info!("Starting to scrape player links with {} workers...", max_workers);
    let squad_fetcher = Arc::clone(fetcher);
    let squads = fan_out(teams, max_workers, move |team: TeamLink| {
        let fetcher = Arc::clone(&squad_fetcher);
        async move { fetcher.fetch_squad(&team).await }
    })
    .await;

    let mut player_links: Vec<String> = Vec::new();
    for (team, result) in squads {
        match result {
            Ok(Ok(links)) => {
                info!(club = %team.club, "Found {} players for team", links.len());
                player_links.extend(links);
            }
            Ok(Err(e)) => {
                stats.squads_failed += 1;
                error!(club = %team.club, "Error scraping team {}: {e}", team.squad_url);
            }
            Err(e) => {
                stats.squads_failed += 1;
                error!(club = %team.club, "Error processing team {}: {e}", team.squad_url);
            }
        }
    }
    stats.player_links = player_links.len();

    let targets = build_targets(&player_links, &mut stats);
    info!("Found {} player links", targets.len());
    if targets.is_empty() {
        return Err(AppError::Discovery("no player links found".to_string()));
    }
    Ok((targets, stats))
}

/// One target per distinct FotMob id, numbered in discovery order. A player
/// listed by two squads (mid-season transfer) is scraped once.
fn build_targets(links: &[String], stats: &mut DiscoveryStats) -> Vec<ScrapeTarget> {
    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(links.len());
    for link in links {
        let Some(target) = ScrapeTarget::from_player_url(link, targets.len() + 1) else {
            warn!(link = %link, "Player link without an id, skipped");
            continue;
        };
        if !seen.insert(target.fotmob_id) {
            stats.duplicate_players += 1;
            continue;
        }
        targets.push(target);
    }
    targets
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::Config;
    use crate::db::MemoryStore;

    fn league_page(title: &str, teams: &[(&str, &str)]) -> String {
        let links: String = teams
            .iter()
            .map(|(href, name)| format!(r#"<a href="{href}"><span class="TeamName">{name}</span></a>"#))
            .collect();
        format!(
            r#"<html><body><h2 class="css-4ow769-TeamOrLeagueName">{title}</h2>
               <div class="css-x-TableContainer">{links}</div></body></html>"#
        )
    }

    fn squad_page(players: &[&str]) -> String {
        let links: String = players
            .iter()
            .map(|href| format!(r#"<a class="css-9pqpod-SquadPlayerLink" href="{href}">p</a>"#))
            .collect();
        format!("<html><body>{links}</body></html>")
    }

    async fn mount(server: &MockServer, at: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn fetcher() -> Arc<HttpFetcher> {
        Arc::new(HttpFetcher::new(&Config::for_tests()).unwrap())
    }

    #[tokio::test]
    async fn walks_leagues_and_squads_into_unique_targets() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/leagues/47/overview/premier-league",
            league_page(
                "Premier League",
                &[("/teams/1/overview/arsenal", "Arsenal"), ("/teams/2/overview/chelsea", "Chelsea")],
            ),
        )
        .await;
        mount(
            &server,
            "/teams/1/squad/arsenal",
            squad_page(&["/players/10/saka", "/players/11/saliba"]),
        )
        .await;
        // Chelsea lists a player Arsenal already had.
        mount(
            &server,
            "/teams/2/squad/chelsea",
            squad_page(&["/players/20/palmer", "/players/11/saliba"]),
        )
        .await;

        let store = MemoryStore::new();
        let leagues = vec![format!("{}/leagues/47/overview/premier-league", server.uri())];
        let (targets, stats) = discover_targets(&fetcher(), &store, &leagues, 2).await.unwrap();

        let mut ids: Vec<i64> = targets.iter().map(|t| t.fotmob_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![10, 11, 20]);
        let mut indexes: Vec<usize> = targets.iter().map(|t| t.index).collect();
        indexes.sort_unstable();
        assert_eq!(indexes, vec![1, 2, 3]);

        assert_eq!(stats.teams, 2);
        assert_eq!(stats.duplicate_players, 1);
        assert_eq!(store.club_count(), 2);
    }

    #[tokio::test]
    async fn failing_squad_is_skipped_not_fatal() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/leagues/1/overview/x",
            league_page("League X", &[("/teams/1/overview/a", "A"), ("/teams/2/overview/b", "B")]),
        )
        .await;
        mount(&server, "/teams/1/squad/a", squad_page(&["/players/10/p"])).await;
        Mock::given(method("GET"))
            .and(path("/teams/2/squad/b"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let leagues = vec![format!("{}/leagues/1/overview/x", server.uri())];
        let (targets, stats) = discover_targets(&fetcher(), &MemoryStore::new(), &leagues, 3).await.unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(stats.squads_failed, 1);
    }

    #[tokio::test]
    async fn unreachable_source_is_a_discovery_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let leagues = vec![format!("{}/leagues/1/overview/x", server.uri())];
        let err = discover_targets(&fetcher(), &MemoryStore::new(), &leagues, 3).await.unwrap_err();
        assert!(matches!(err, AppError::Discovery(_)));
    }

    #[test]
    fn targets_are_deduplicated_by_id() {
        let mut stats = DiscoveryStats::default();
        let links = vec![
            "https://www.fotmob.com/players/1/a".to_string(),
            "https://www.fotmob.com/players/1/a".to_string(),
            "https://www.fotmob.com/players/no-id".to_string(),
            "https://www.fotmob.com/players/2/b".to_string(),
        ];
        let targets = build_targets(&links, &mut stats);
        assert_eq!(targets.iter().map(|t| (t.fotmob_id, t.index)).collect::<Vec<_>>(), vec![(1, 1), (2, 2)]);
        assert_eq!(stats.duplicate_players, 1);
    }
}
