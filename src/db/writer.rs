use std::sync::{Arc, LazyLock};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::db::store::RecordStore;
use crate::error::Result;
use crate::types::{PlayerRecord, PlayerStats, TeamLink, STAT_FIELDS};

/// Stats upsert over every stat column. A column the page did not show keeps
/// its previous value.
static STATS_UPSERT: LazyLock<String> = LazyLock::new(|| {
    let columns: Vec<&str> = STAT_FIELDS.iter().map(|f| f.key).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let updates = columns
        .iter()
        .map(|c| format!("{c} = COALESCE(excluded.{c}, player_stats.{c})"))
        .collect::<Vec<_>>()
        .join(",\n    ");
    format!(
        "INSERT INTO player_stats (player_id, {}) VALUES (?, {placeholders})\n\
         ON CONFLICT(player_id) DO UPDATE SET\n    {updates}",
        columns.join(", "),
    )
});

/// SQLite-backed `RecordStore`. Each save runs in its own transaction, so a
/// worker never leaves a player without the stats it was scraped with.
///
/// Writes from this process are serialized on `write_lock`. A save reads the
/// club before it writes, and two such deferred transactions upgrading at
/// once would otherwise see SQLITE_BUSY without waiting.
#[derive(Clone)]
pub struct SqliteStore {
    pool: sqlx::SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl SqliteStore {
    pub fn new(pool: sqlx::SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }

    async fn write_stats(
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        player_id: i64,
        stats: &PlayerStats,
    ) -> Result<()> {
        let mut query = sqlx::query(STATS_UPSERT.as_str()).bind(player_id);
        for field in STAT_FIELDS {
            query = query.bind(stats.get(field.key));
        }
        query.execute(&mut **tx).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn save(&self, record: &PlayerRecord) -> Result<()> {
        let p = &record.profile;
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        // Clubs are matched by name alone; the player page does not say which league.
        let club_id: Option<i64> = match &p.club {
            Some(club) => {
                let id = sqlx::query_scalar::<_, i64>("SELECT id FROM clubs WHERE name = ? ORDER BY id LIMIT 1")
                    .bind(club)
                    .fetch_optional(&mut *tx)
                    .await?;
                if id.is_none() {
                    info!(fotmob_id = p.fotmob_id, club = %club, "{club} not found, saving player without club");
                }
                id
            }
            None => None,
        };

        let player_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO players (
                fotmob_id, name, club_id, position, country,
                shirt_number, age, height, market_value, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(fotmob_id) DO UPDATE SET
                name = excluded.name,
                club_id = excluded.club_id,
                position = excluded.position,
                country = excluded.country,
                shirt_number = excluded.shirt_number,
                age = excluded.age,
                height = excluded.height,
                market_value = excluded.market_value,
                updated_at = excluded.updated_at
            RETURNING id
            "#,
        )
        .bind(p.fotmob_id)
        .bind(&p.name)
        .bind(club_id)
        .bind(&p.position)
        .bind(&p.country)
        .bind(p.shirt_number)
        .bind(p.age)
        .bind(p.height)
        .bind(p.market_value)
        .bind(now_secs())
        .fetch_one(&mut *tx)
        .await?;

        if let Some(stats) = &record.stats {
            Self::write_stats(&mut tx, player_id, stats).await?;
        }

        tx.commit().await?;
        debug!(fotmob_id = p.fotmob_id, player_id, "player saved");
        Ok(())
    }

    async fn save_club(&self, team: &TeamLink) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO leagues (name) VALUES (?) ON CONFLICT(name) DO NOTHING")
            .bind(&team.league)
            .execute(&mut *tx)
            .await?;
        let league_id: i64 = sqlx::query_scalar("SELECT id FROM leagues WHERE name = ?")
            .bind(&team.league)
            .fetch_one(&mut *tx)
            .await?;
        sqlx::query("INSERT INTO clubs (name, league_id) VALUES (?, ?) ON CONFLICT(name, league_id) DO NOTHING")
            .bind(&team.club)
            .bind(league_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
