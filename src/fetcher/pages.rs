//! Markup parsers for league overview, squad and player pages.
//!
//! The site ships generated class names (`css-zt63wq-PlayerNameCSS`), so every
//! selector matches on the stable suffix with `[class*=...]`.

use std::collections::HashSet;
use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::FetchError;
use crate::fetcher::values::{
    parse_leading_int, parse_market_value, parse_shirt_number, parse_stat_value, strip_loan_suffix,
};
use crate::types::{fields_for_label, PlayerProfile, PlayerRecord, PlayerStats, ScrapeTarget, TeamLink};

fn sel(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static LEAGUE_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("[class*='TeamOrLeagueName']"));
static TABLE_CONTAINER: LazyLock<Selector> = LazyLock::new(|| sel("[class*='TableContainer']"));
static TABLE_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[href]"));
static TEAM_NAME: LazyLock<Selector> = LazyLock::new(|| sel("[class*='TeamName']"));

static SQUAD_PLAYER_LINK: LazyLock<Selector> = LazyLock::new(|| sel("a[class*='SquadPlayerLink'][href]"));

static PLAYER_NAME: LazyLock<Selector> = LazyLock::new(|| sel("[class*='PlayerNameCSS']"));
static PLAYER_TEAM: LazyLock<Selector> = LazyLock::new(|| sel("[class*='TeamCSS']"));
static PLAYER_POSITIONS: LazyLock<Selector> = LazyLock::new(|| sel("[class*='PositionsCSS']"));
static BIO_STAT: LazyLock<Selector> = LazyLock::new(|| sel("[class*='PlayerBioStatCSS']"));
static BIO_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("[class*='StatTitleCSS']"));
static BIO_VALUE: LazyLock<Selector> = LazyLock::new(|| sel("[class*='StatValueCSS']"));
static STAT_ITEM: LazyLock<Selector> = LazyLock::new(|| sel("[class*='StatItemCSS']"));
static STAT_TITLE: LazyLock<Selector> = LazyLock::new(|| sel("[class*='StatTitle']"));
static STAT_VALUE: LazyLock<Selector> = LazyLock::new(|| sel("[class*='StatValue']"));

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(text_of).filter(|t| !t.is_empty())
}

/// Resolve `href` against the page it was found on and keep it only when its
/// path starts with `path_prefix`.
fn resolve_link(base: &Url, href: &str, path_prefix: &str) -> Option<Url> {
    let url = base.join(href).ok()?;
    url.path().starts_with(path_prefix).then_some(url)
}

fn base_url(page_url: &str) -> Result<Url, FetchError> {
    Url::parse(page_url).map_err(|e| FetchError::parse(page_url, format!("invalid page URL: {e}")))
}

/// League overview → one `TeamLink` per team in the standings table.
/// Team links point at the squad page (`overview` rewritten to `squad`).
pub fn parse_league_page(body: &str, page_url: &str) -> Result<Vec<TeamLink>, FetchError> {
    let base = base_url(page_url)?;
    let doc = Html::parse_document(body);
    let root = doc.root_element();

    let league = first_text(root, &LEAGUE_TITLE)
        .ok_or_else(|| FetchError::parse(page_url, "missing league title"))?;
    let table = root
        .select(&TABLE_CONTAINER)
        .next()
        .ok_or_else(|| FetchError::parse(page_url, "missing standings table"))?;

    let mut seen = HashSet::new();
    let mut teams = Vec::new();
    for link in table.select(&TABLE_LINK) {
        let Some(href) = link.value().attr("href") else { continue };
        let Some(url) = resolve_link(&base, href, "/teams/") else { continue };
        let squad_url = url.as_str().replace("overview", "squad");
        if !seen.insert(squad_url.clone()) {
            continue;
        }
        let club = first_text(link, &TEAM_NAME).unwrap_or_else(|| "Unknown Team".to_string());
        teams.push(TeamLink {
            league: league.clone(),
            club,
            squad_url,
        });
    }
    Ok(teams)
}

/// Squad page → player page URLs, in page order, without duplicates.
pub fn parse_squad_page(body: &str, page_url: &str) -> Result<Vec<String>, FetchError> {
    let base = base_url(page_url)?;
    let doc = Html::parse_document(body);

    let mut seen = HashSet::new();
    let links: Vec<String> = doc
        .select(&SQUAD_PLAYER_LINK)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(&base, href, "/players/"))
        .map(|u| u.to_string())
        .filter(|u| seen.insert(u.clone()))
        .collect();

    if links.is_empty() {
        return Err(FetchError::parse(page_url, "no player links on squad page"));
    }
    Ok(links)
}

/// Player page → profile plus season stats. Only the player name is required;
/// a page without a stats section yields `stats: None`.
pub fn parse_player_page(body: &str, target: &ScrapeTarget) -> Result<PlayerRecord, FetchError> {
    let doc = Html::parse_document(body);
    let root = doc.root_element();

    let name = first_text(root, &PLAYER_NAME)
        .ok_or_else(|| FetchError::parse(&target.url, "missing player name"))?;
    let club = first_text(root, &PLAYER_TEAM).map(|c| strip_loan_suffix(&c).to_string());
    let position = root
        .select(&PLAYER_POSITIONS)
        .map(text_of)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    let mut profile = PlayerProfile {
        fotmob_id: target.fotmob_id,
        name,
        club,
        position,
        country: None,
        shirt_number: None,
        age: None,
        height: None,
        market_value: None,
    };

    for field in root.select(&BIO_STAT) {
        let (Some(title), Some(value)) = (first_text(field, &BIO_TITLE), first_text(field, &BIO_VALUE)) else {
            continue;
        };
        match title.as_str() {
            "Height" => profile.height = parse_leading_int(&value),
            "Shirt" => profile.shirt_number = parse_shirt_number(&value),
            "Country" => profile.country = Some(value),
            "Market value" => profile.market_value = parse_market_value(&value),
            // Preferred foot is shown but not stored.
            "Preferred foot" => {}
            // The age cell is titled with the birth date.
            _ if value.contains("years") => profile.age = parse_leading_int(&value),
            _ => {}
        }
    }

    let mut stats = PlayerStats::new();
    let mut has_stats_section = false;
    for item in root.select(&STAT_ITEM) {
        has_stats_section = true;
        let (Some(title), Some(value)) = (first_text(item, &STAT_TITLE), first_text(item, &STAT_VALUE)) else {
            continue;
        };
        let Some(parsed) = parse_stat_value(&value) else { continue };
        for f in fields_for_label(&title) {
            stats.set(f.key, parsed);
        }
    }

    Ok(PlayerRecord {
        profile,
        stats: has_stats_section.then_some(stats),
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const LEAGUE_PAGE: &str = r#"
        <html><body>
          <h1 class="css-4ow769-TeamOrLeagueName">Premier League</h1>
          <div class="TableContainer">
            <a href="/teams/9825/overview/arsenal"><span class="TeamName">Arsenal</span></a>
            <a href="https://www.fotmob.com/teams/8456/overview/manchester-city"><span class="TeamName">Man City</span></a>
            <a href="/teams/9825/overview/arsenal"><span class="TeamName">Arsenal</span></a>
            <a href="/leagues/47/matches">Fixtures</a>
          </div>
        </body></html>
    "#;

    pub const SQUAD_PAGE: &str = r#"
        <html><body>
          <a class="css-9pqpod-SquadPlayerLink" href="/players/961995/bukayo-saka">Saka</a>
          <a class="css-9pqpod-SquadPlayerLink" href="/players/1083323/william-saliba">Saliba</a>
          <a class="css-9pqpod-SquadPlayerLink" href="/players/961995/bukayo-saka">Saka</a>
          <a class="css-other" href="/players/1/not-in-squad">Other</a>
        </body></html>
    "#;

    pub const PLAYER_PAGE: &str = r#"
        <html><body>
          <h1 class="css-zt63wq-PlayerNameCSS">Bukayo Saka</h1>
          <div class="css-14k6s2u-TeamCSS">Arsenal</div>
          <div class="css-1g41csj-PositionsCSS">Right Winger</div>
          <div class="css-1g41csj-PositionsCSS">Left Winger</div>
          <div class="css-1-PlayerBioStatCSS">
            <span class="css-10h4hmz-StatTitleCSS">Height</span><span class="css-to3w1c-StatValueCSS">178 cm</span>
          </div>
          <div class="css-1-PlayerBioStatCSS">
            <span class="css-10h4hmz-StatTitleCSS">Shirt</span><span class="css-to3w1c-StatValueCSS">7</span>
          </div>
          <div class="css-1-PlayerBioStatCSS">
            <span class="css-10h4hmz-StatTitleCSS">Sep 5, 2001</span><span class="css-to3w1c-StatValueCSS">24 years</span>
          </div>
          <div class="css-1-PlayerBioStatCSS">
            <span class="css-10h4hmz-StatTitleCSS">Preferred foot</span><span class="css-to3w1c-StatValueCSS">Left</span>
          </div>
          <div class="css-1-PlayerBioStatCSS">
            <span class="css-10h4hmz-StatTitleCSS">Country</span><span class="css-to3w1c-StatValueCSS">England</span>
          </div>
          <div class="css-1-PlayerBioStatCSS">
            <span class="css-10h4hmz-StatTitleCSS">Market value</span><span class="css-to3w1c-StatValueCSS">€150M</span>
          </div>
          <div class="css-1v73fp6-StatItemCSS">
            <span class="css-2duihq-StatTitle">Goals</span><span class="css-jb6lgd-StatValue">12</span>
          </div>
          <div class="css-1v73fp6-StatItemCSS">
            <span class="css-2duihq-StatTitle">Expected goals (xG)</span><span class="css-jb6lgd-StatValue">10,42</span>
          </div>
          <div class="css-1v73fp6-StatItemCSS">
            <span class="css-2duihq-StatTitle">Pass accuracy</span><span class="css-jb6lgd-StatValue">81.5%</span>
          </div>
          <div class="css-1v73fp6-StatItemCSS">
            <span class="css-2duihq-StatTitle">Some new stat</span><span class="css-jb6lgd-StatValue">3</span>
          </div>
        </body></html>
    "#;

    pub const PLAYER_PAGE_NO_STATS: &str = r#"
        <html><body>
          <h1 class="css-zt63wq-PlayerNameCSS">Ethan Nwaneri</h1>
          <div class="css-14k6s2u-TeamCSS">Marseille (on loan)</div>
        </body></html>
    "#;
}
