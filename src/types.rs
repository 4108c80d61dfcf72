use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// A club found on a league overview page, with the squad page to walk next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLink {
    pub league: String,
    pub club: String,
    pub squad_url: String,
}

// ---------------------------------------------------------------------------
// ScrapeTarget
// ---------------------------------------------------------------------------

/// One player page to fetch. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScrapeTarget {
    pub fotmob_id: i64,
    pub slug: String,
    pub url: String,
    /// 1-based position in the run, for progress logs.
    pub index: usize,
}

impl ScrapeTarget {
    /// Build a target from a player link: `.../players/<id>/<slug>`.
    /// Returns None when the link has no numeric id segment.
    pub fn from_player_url(url: &str, index: usize) -> Option<Self> {
        let trimmed = url.split(|c| c == '?' || c == '#').next().unwrap_or(url).trim_end_matches('/');
        let mut segments = trimmed.rsplit('/');
        let slug = segments.next()?.to_string();
        let fotmob_id = segments.next()?.parse::<i64>().ok()?;
        Some(Self {
            fotmob_id,
            slug,
            url: url.to_string(),
            index,
        })
    }
}

impl std::fmt::Display for ScrapeTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.fotmob_id, self.slug)
    }
}

// ---------------------------------------------------------------------------
// PlayerRecord
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub fotmob_id: i64,
    pub name: String,
    pub club: Option<String>,
    /// All listed positions, joined by ", ".
    pub position: String,
    pub country: Option<String>,
    pub shirt_number: Option<i64>,
    pub age: Option<i64>,
    /// Centimetres.
    pub height: Option<i64>,
    /// Euros.
    pub market_value: Option<i64>,
}

/// Season statistics keyed by field name (see [`STAT_FIELDS`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerStats {
    values: BTreeMap<String, f64>,
}

impl PlayerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignores keys that are not stat fields.
    pub fn set(&mut self, field: &str, value: f64) {
        if stat_field(field).is_some() {
            self.values.insert(field.to_string(), value);
        }
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The stored form of a successful scrape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub profile: PlayerProfile,
    /// None when the page had no stats section.
    pub stats: Option<PlayerStats>,
}

impl PlayerRecord {
    pub fn fotmob_id(&self) -> i64 {
        self.profile.fotmob_id
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Exactly one per dispatched target.
#[derive(Debug, Clone)]
pub enum ScrapeOutcome {
    Success {
        target: ScrapeTarget,
        elapsed: Duration,
    },
    Failure {
        target: ScrapeTarget,
        error: String,
    },
}

/// Completion report for one coordinator run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// (target, error description) for every failure.
    pub failures: Vec<(ScrapeTarget, String)>,
    pub elapsed: Duration,
    pub p50_fetch_us: Option<u64>,
    pub p95_fetch_us: Option<u64>,
    pub p99_fetch_us: Option<u64>,
}

impl RunSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

// ---------------------------------------------------------------------------
// Stat field table
// ---------------------------------------------------------------------------

/// One stat column: field name, label as it appears on the player page,
/// display label for axis choices, and stat group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatField {
    pub key: &'static str,
    pub page_label: &'static str,
    pub display: &'static str,
    pub group: &'static str,
}

const fn field(
    key: &'static str,
    page_label: &'static str,
    display: &'static str,
    group: &'static str,
) -> StatField {
    StatField { key, page_label, display, group }
}

/// Every stat column, in storage order. Page labels are not unique:
/// goalkeeper distribution reuses the outfield passing labels.
pub const STAT_FIELDS: &[StatField] = &[
    // Shooting
    field("goals", "Goals", "Goals", "shooting"),
    field("expected_goals", "Expected goals (xG)", "Expected Goals", "shooting"),
    field("xg_on_target", "xG on target (xGOT)", "xG on Target", "shooting"),
    field("penalty_goals", "Penalty goals", "Penalty Goals", "shooting"),
    field("non_penalty_xg", "Non-penalty xG", "Non-Penalty xG", "shooting"),
    field("shots", "Shots", "Shots", "shooting"),
    field("shots_on_target", "Shots on target", "Shots on Target", "shooting"),
    // Passing
    field("assists", "Assists", "Assists", "passing"),
    field("expected_assists", "Expected assists (xA)", "Expected Assists", "passing"),
    field("successful_passes", "Successful passes", "Successful Passes", "passing"),
    field("pass_accuracy", "Pass accuracy", "Pass Accuracy", "passing"),
    field("accurate_long_balls", "Accurate long balls", "Accurate Long Balls", "passing"),
    field("long_ball_accuracy", "Long ball accuracy", "Long Ball Accuracy", "passing"),
    field("chances_created", "Chances created", "Chances Created", "passing"),
    field("successful_crosses", "Successful crosses", "Successful Crosses", "passing"),
    field("cross_accuracy", "Cross accuracy", "Cross Accuracy", "passing"),
    // Possession
    field("successful_dribbles", "Successful dribbles", "Successful Dribbles", "possession"),
    field("dribble_success", "Dribble success", "Dribble Success", "possession"),
    field("touches", "Touches", "Touches", "possession"),
    field("touches_in_opposition_box", "Touches in opposition box", "Touches in Opposition Box", "possession"),
    field("dispossessed", "Dispossessed", "Dispossessed", "possession"),
    field("fouls_won", "Fouls won", "Fouls Won", "possession"),
    field("penalties_awarded", "Penalties awarded", "Penalties Awarded", "possession"),
    // Defending
    field("tackles_won", "Tackles won", "Tackles Won", "defending"),
    field("tackles_won_percentage", "Tackles won %", "Tackles Won Percentage", "defending"),
    field("duels_won", "Duels won", "Duels Won", "defending"),
    field("duels_won_percentage", "Duels won %", "Duels Won Percentage", "defending"),
    field("aerial_duels_won", "Aerial duels won", "Aerial Duels Won", "defending"),
    field("aerial_duels_won_percentage", "Aerial duels won %", "Aerial Duels Won Percentage", "defending"),
    field("interceptions", "Interceptions", "Interceptions", "defending"),
    field("blocked", "Blocked", "Blocked", "defending"),
    field("fouls_committed", "Fouls committed", "Fouls Committed", "defending"),
    field("recoveries", "Recoveries", "Recoveries", "defending"),
    field("possession_won_final_3rd", "Possession won final 3rd", "Possession Won Final 3rd", "defending"),
    field("dribbled_past", "Dribbled past", "Dribbled Past", "defending"),
    // Discipline
    field("yellow_cards", "Yellow cards", "Yellow Cards", "discipline"),
    field("red_cards", "Red cards", "Red Cards", "discipline"),
    // Goalkeeping
    field("saves", "Saves", "Saves", "goalkeeping"),
    field("save_percentage", "Save percentage", "Save Percentage", "goalkeeping"),
    field("goals_conceded", "Goals conceded", "Goals Conceded", "goalkeeping"),
    field("goals_prevented", "Goals prevented", "Goals Prevented", "goalkeeping"),
    field("clean_sheets", "Clean sheets", "Clean Sheets", "goalkeeping"),
    field("error_led_to_goal", "Error led to goal", "Error Led to Goal", "goalkeeping"),
    field("high_claim", "High claim", "High Claim", "goalkeeping"),
    // Goalkeeper distribution
    field("gk_pass_accuracy", "Pass accuracy", "GK Pass Accuracy", "distribution"),
    field("gk_accurate_long_balls", "Accurate long balls", "GK Accurate Long Balls", "distribution"),
    field("gk_long_ball_accuracy", "Long ball accuracy", "GK Long Ball Accuracy", "distribution"),
];

pub fn stat_field(key: &str) -> Option<&'static StatField> {
    STAT_FIELDS.iter().find(|f| f.key == key)
}

/// All fields filled by a page label.
pub fn fields_for_label(label: &str) -> impl Iterator<Item = &'static StatField> + '_ {
    STAT_FIELDS.iter().filter(move |f| f.page_label == label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_from_player_url() {
        let t = ScrapeTarget::from_player_url("https://www.fotmob.com/players/961995/bukayo-saka", 4).unwrap();
        assert_eq!(t.fotmob_id, 961995);
        assert_eq!(t.slug, "bukayo-saka");
        assert_eq!(t.index, 4);
        assert_eq!(t.to_string(), "961995/bukayo-saka");
    }

    #[test]
    fn target_from_url_without_id_is_none() {
        assert!(ScrapeTarget::from_player_url("https://www.fotmob.com/players/bukayo-saka", 1).is_none());
    }

    #[test]
    fn stat_table_has_unique_keys_and_shared_labels() {
        assert_eq!(STAT_FIELDS.len(), 47);
        let mut keys: Vec<_> = STAT_FIELDS.iter().map(|f| f.key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), STAT_FIELDS.len());

        let pass: Vec<_> = fields_for_label("Pass accuracy").map(|f| f.key).collect();
        assert_eq!(pass, vec!["pass_accuracy", "gk_pass_accuracy"]);
    }

    #[test]
    fn stats_ignore_unknown_fields() {
        let mut stats = PlayerStats::new();
        stats.set("goals", 12.0);
        stats.set("not_a_stat", 1.0);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.get("goals"), Some(12.0));
    }
}
