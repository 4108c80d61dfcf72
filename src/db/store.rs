use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::types::{PlayerRecord, TeamLink};

/// Persistence capability handed to discovery and the coordinator.
/// Both operations are upserts: saving the same key twice keeps one entry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Upsert a player (and its stats) keyed by FotMob id.
    async fn save(&self, record: &PlayerRecord) -> Result<()>;

    /// Upsert a league and a club in it.
    async fn save_club(&self, team: &TeamLink) -> Result<()>;
}

/// In-memory store for `--dry-run` and tests.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<i64, PlayerRecord>,
    clubs: Mutex<HashSet<(String, String)>>,
    save_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, fotmob_id: i64) -> Option<PlayerRecord> {
        self.records.get(&fotmob_id).map(|r| r.value().clone())
    }

    #[cfg(test)]
    pub fn fotmob_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.records.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    #[cfg(test)]
    /// Number of `save` calls, including overwrites.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::Relaxed)
    }

    #[cfg(test)]
    pub fn club_count(&self) -> usize {
        self.clubs.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save(&self, record: &PlayerRecord) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::Relaxed);
        self.records.insert(record.fotmob_id(), record.clone());
        Ok(())
    }

    async fn save_club(&self, team: &TeamLink) -> Result<()> {
        if let Ok(mut clubs) = self.clubs.lock() {
            clubs.insert((team.league.clone(), team.club.clone()));
        }
        Ok(())
    }
}
