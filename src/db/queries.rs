//! Read side of the store, used by the HTTP API.

use std::collections::BTreeSet;

use serde::Serialize;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::db::models::{ClubRow, LeagueRow, PlayerRow, ScatterRow};
use crate::error::Result;
use crate::types::{PlayerStats, StatField, STAT_FIELDS};

pub const AGE_MAX: i64 = 100;
pub const HEIGHT_MAX: i64 = 250;
/// Millions of euros.
pub const MARKET_VALUE_MAX_M: i64 = 500;

const PLAYER_SELECT: &str = r#"
    SELECT p.id, p.fotmob_id, p.name, c.name AS club, l.name AS league,
           p.position, p.country, p.shirt_number, p.age, p.height,
           p.market_value, p.updated_at
    FROM players p
    LEFT JOIN clubs c ON c.id = p.club_id
    LEFT JOIN leagues l ON l.id = c.league_id
    WHERE 1 = 1"#;

/// Player filter. Bounds left at their defaults are not applied, so players
/// with unknown age, height or value still show up in an unfiltered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerFilter {
    pub league_ids: Vec<i64>,
    pub club_ids: Vec<i64>,
    pub countries: Vec<String>,
    /// Case-insensitive substring match on any.
    pub positions: Vec<String>,
    pub min_age: i64,
    pub max_age: i64,
    pub min_height: i64,
    pub max_height: i64,
    pub min_market_value_m: i64,
    pub max_market_value_m: i64,
}

impl Default for PlayerFilter {
    fn default() -> Self {
        Self {
            league_ids: Vec::new(),
            club_ids: Vec::new(),
            countries: Vec::new(),
            positions: Vec::new(),
            min_age: 0,
            max_age: AGE_MAX,
            min_height: 0,
            max_height: HEIGHT_MAX,
            min_market_value_m: 0,
            max_market_value_m: MARKET_VALUE_MAX_M,
        }
    }
}

/// `LIKE` pattern matching `needle` anywhere, case-insensitively. `%` and `_`
/// typed by the user match themselves.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    for c in needle.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("%{escaped}%")
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, f: &PlayerFilter) {
    if !f.league_ids.is_empty() {
        qb.push(" AND c.league_id IN (");
        let mut ids = qb.separated(", ");
        for id in &f.league_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    if !f.club_ids.is_empty() {
        qb.push(" AND p.club_id IN (");
        let mut ids = qb.separated(", ");
        for id in &f.club_ids {
            ids.push_bind(*id);
        }
        ids.push_unseparated(")");
    }
    if !f.countries.is_empty() {
        qb.push(" AND p.country IN (");
        let mut names = qb.separated(", ");
        for c in &f.countries {
            names.push_bind(c.clone());
        }
        names.push_unseparated(")");
    }
    if !f.positions.is_empty() {
        qb.push(" AND (");
        for (i, pos) in f.positions.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("LOWER(p.position) LIKE ")
                .push_bind(contains_pattern(pos))
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }

    if f.min_age > 0 {
        qb.push(" AND p.age >= ").push_bind(f.min_age);
    }
    if f.max_age < AGE_MAX {
        qb.push(" AND p.age <= ").push_bind(f.max_age);
    }
    if f.min_height > 0 {
        qb.push(" AND p.height >= ").push_bind(f.min_height);
    }
    if f.max_height < HEIGHT_MAX {
        qb.push(" AND p.height <= ").push_bind(f.max_height);
    }
    if f.min_market_value_m > 0 {
        qb.push(" AND p.market_value >= ").push_bind(f.min_market_value_m * 1_000_000);
    }
    if f.max_market_value_m < MARKET_VALUE_MAX_M {
        qb.push(" AND p.market_value <= ").push_bind(f.max_market_value_m * 1_000_000);
    }
}

pub async fn list_players(pool: &SqlitePool, filter: &PlayerFilter) -> Result<Vec<PlayerRow>> {
    let mut qb = QueryBuilder::<Sqlite>::new(PLAYER_SELECT);
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY p.name");
    Ok(qb.build_query_as::<PlayerRow>().fetch_all(pool).await?)
}

/// Players with stats, carrying the two requested stat columns.
/// Column names come from the static stat table, never from input.
pub async fn scatter_rows(
    pool: &SqlitePool,
    filter: &PlayerFilter,
    x: &StatField,
    y: &StatField,
) -> Result<Vec<ScatterRow>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        r#"
        SELECT p.name, c.name AS club, p.position, p.country, p.age, p.market_value,
               s.{x} AS x_value, s.{y} AS y_value
        FROM players p
        JOIN player_stats s ON s.player_id = p.id
        LEFT JOIN clubs c ON c.id = p.club_id
        LEFT JOIN leagues l ON l.id = c.league_id
        WHERE 1 = 1"#,
        x = x.key,
        y = y.key,
    ));
    push_filters(&mut qb, filter);
    qb.push(" ORDER BY p.name");
    Ok(qb.build_query_as::<ScatterRow>().fetch_all(pool).await?)
}

pub async fn find_player(pool: &SqlitePool, fotmob_id: i64) -> Result<Option<(PlayerRow, Option<PlayerStats>)>> {
    let row: Option<PlayerRow> = sqlx::query_as(&format!("{PLAYER_SELECT} AND p.fotmob_id = ?"))
        .bind(fotmob_id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else { return Ok(None) };
    let stats = load_stats(pool, row.id).await?;
    Ok(Some((row, stats)))
}

pub async fn load_stats(pool: &SqlitePool, player_id: i64) -> Result<Option<PlayerStats>> {
    let Some(row) = sqlx::query("SELECT * FROM player_stats WHERE player_id = ?")
        .bind(player_id)
        .fetch_optional(pool)
        .await?
    else {
        return Ok(None);
    };

    let mut stats = PlayerStats::new();
    for field in STAT_FIELDS {
        if let Some(v) = row.try_get::<Option<f64>, _>(field.key)? {
            stats.set(field.key, v);
        }
    }
    Ok(Some(stats))
}

pub async fn list_leagues(pool: &SqlitePool) -> Result<Vec<LeagueRow>> {
    Ok(sqlx::query_as("SELECT id, name, country FROM leagues ORDER BY name")
        .fetch_all(pool)
        .await?)
}

pub async fn list_clubs(pool: &SqlitePool) -> Result<Vec<ClubRow>> {
    Ok(sqlx::query_as("SELECT id, name, league_id, founded_year FROM clubs ORDER BY name")
        .fetch_all(pool)
        .await?)
}

pub async fn list_countries(pool: &SqlitePool) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar(
        "SELECT DISTINCT country FROM players WHERE country IS NOT NULL AND country != '' ORDER BY country",
    )
    .fetch_all(pool)
    .await?)
}

/// Distinct primary positions: the first entry of each player's position list.
pub async fn list_primary_positions(pool: &SqlitePool) -> Result<Vec<String>> {
    let raw: Vec<String> = sqlx::query_scalar("SELECT position FROM players WHERE position != ''")
        .fetch_all(pool)
        .await?;
    let unique: BTreeSet<String> = raw
        .iter()
        .filter_map(|p| p.split(',').next())
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    Ok(unique.into_iter().collect())
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TableCounts {
    pub leagues: i64,
    pub clubs: i64,
    pub players: i64,
    pub player_stats: i64,
}

pub async fn table_counts(pool: &SqlitePool) -> Result<TableCounts> {
    let count = |table: &'static str| async move {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
    };
    Ok(TableCounts {
        leagues: count("leagues").await?,
        clubs: count("clubs").await?,
        players: count("players").await?,
        player_stats: count("player_stats").await?,
    })
}
