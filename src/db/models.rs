/// Database row types matching `migrations/`. Used with `sqlx::query_as`.
use serde::Serialize;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeagueRow {
    pub id: i64,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClubRow {
    pub id: i64,
    pub name: String,
    pub league_id: i64,
    pub founded_year: Option<i64>,
}

/// A player joined with its club and league names.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PlayerRow {
    #[serde(skip)]
    pub id: i64,
    pub fotmob_id: i64,
    pub name: String,
    pub club: Option<String>,
    pub league: Option<String>,
    pub position: String,
    pub country: Option<String>,
    pub shirt_number: Option<i64>,
    pub age: Option<i64>,
    pub height: Option<i64>,
    pub market_value: Option<i64>,
    pub updated_at: i64,
}

/// A player with the two stat columns picked for a scatter plot.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScatterRow {
    pub name: String,
    pub club: Option<String>,
    pub position: String,
    pub country: Option<String>,
    pub age: Option<i64>,
    pub market_value: Option<i64>,
    pub x_value: Option<f64>,
    pub y_value: Option<f64>,
}
