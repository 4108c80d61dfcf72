use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{ClubRow, LeagueRow, PlayerRow};
use crate::db::queries::{self, PlayerFilter, TableCounts, AGE_MAX, HEIGHT_MAX, MARKET_VALUE_MAX_M};
use crate::error::AppError;
use crate::types::{stat_field, PlayerStats, StatField, STAT_FIELDS};

const DEFAULT_SCATTER_X: &str = "expected_goals";
const DEFAULT_SCATTER_Y: &str = "goals";

#[derive(Clone)]
pub struct ApiState {
    pub pool: sqlx::SqlitePool,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(get_health))
        .route("/filters", get(get_filters))
        .route("/players", get(get_players))
        .route("/players/:fotmob_id", get(get_player))
        .route("/scatter", get(get_scatter))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Query param structs
// ---------------------------------------------------------------------------

/// Comma lists and numeric bounds shared by `/players` and `/scatter`.
#[derive(Debug, Default, Deserialize)]
pub struct FilterQuery {
    pub league: Option<String>,
    pub club: Option<String>,
    pub country: Option<String>,
    pub position: Option<String>,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub min_height: Option<i64>,
    pub max_height: Option<i64>,
    pub min_market_value: Option<i64>,
    pub max_market_value: Option<i64>,
}

/// Axis choice for `/scatter`. The filters come from a second `FilterQuery`
/// extractor over the same query string.
#[derive(Debug, Deserialize)]
pub struct ScatterQuery {
    pub x: Option<String>,
    pub y: Option<String>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ids that are not plain digits are dropped rather than rejected.
fn split_ids(raw: Option<&str>) -> Vec<i64> {
    split_list(raw)
        .iter()
        .filter(|s| s.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|s| s.parse().ok())
        .collect()
}

impl FilterQuery {
    pub fn to_filter(&self) -> PlayerFilter {
        let d = PlayerFilter::default();
        let bound = |v: Option<i64>, default: i64, max: i64| v.unwrap_or(default).clamp(0, max);
        PlayerFilter {
            league_ids: split_ids(self.league.as_deref()),
            club_ids: split_ids(self.club.as_deref()),
            countries: split_list(self.country.as_deref()),
            positions: split_list(self.position.as_deref()),
            min_age: bound(self.min_age, d.min_age, AGE_MAX),
            max_age: bound(self.max_age, d.max_age, AGE_MAX),
            min_height: bound(self.min_height, d.min_height, HEIGHT_MAX),
            max_height: bound(self.max_height, d.max_height, HEIGHT_MAX),
            min_market_value_m: bound(self.min_market_value, d.min_market_value_m, MARKET_VALUE_MAX_M),
            max_market_value_m: bound(self.max_market_value, d.max_market_value_m, MARKET_VALUE_MAX_M),
        }
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub counts: TableCounts,
}

#[derive(Serialize)]
pub struct StatChoice {
    pub key: &'static str,
    pub display: &'static str,
    pub group: &'static str,
}

#[derive(Serialize)]
pub struct FiltersResponse {
    pub leagues: Vec<LeagueRow>,
    pub clubs: Vec<ClubRow>,
    pub countries: Vec<String>,
    pub positions: Vec<String>,
    pub stat_fields: Vec<StatChoice>,
}

#[derive(Serialize)]
pub struct PlayerDetailResponse {
    #[serde(flatten)]
    pub player: PlayerRow,
    pub stats: Option<PlayerStats>,
}

#[derive(Debug, Serialize)]
pub struct ScatterPoint {
    pub name: String,
    pub club: Option<String>,
    pub country: Option<String>,
    pub position: String,
    pub age: Option<i64>,
    pub market_value: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize)]
pub struct ScatterResponse {
    pub title: String,
    pub x_field: &'static str,
    pub y_field: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<ScatterPoint>,
}

fn market_value_label(value: Option<i64>) -> String {
    match value {
        Some(v) => format!("€{:.1}M", v as f64 / 1_000_000.0),
        None => "Unknown".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_health(State(state): State<ApiState>) -> Result<Json<HealthResponse>, AppError> {
    let counts = queries::table_counts(&state.pool).await?;
    Ok(Json(HealthResponse { status: "ok", counts }))
}

async fn get_filters(State(state): State<ApiState>) -> Result<Json<FiltersResponse>, AppError> {
    let stat_fields = STAT_FIELDS
        .iter()
        .map(|f| StatChoice {
            key: f.key,
            display: f.display,
            group: f.group,
        })
        .collect();

    Ok(Json(FiltersResponse {
        leagues: queries::list_leagues(&state.pool).await?,
        clubs: queries::list_clubs(&state.pool).await?,
        countries: queries::list_countries(&state.pool).await?,
        positions: queries::list_primary_positions(&state.pool).await?,
        stat_fields,
    }))
}

async fn get_players(
    State(state): State<ApiState>,
    Query(params): Query<FilterQuery>,
) -> Result<Json<Vec<PlayerRow>>, AppError> {
    let rows = queries::list_players(&state.pool, &params.to_filter()).await?;
    Ok(Json(rows))
}

async fn get_player(
    State(state): State<ApiState>,
    Path(fotmob_id): Path<i64>,
) -> Result<Json<PlayerDetailResponse>, AppError> {
    let (player, stats) = queries::find_player(&state.pool, fotmob_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("player {fotmob_id}")))?;
    Ok(Json(PlayerDetailResponse { player, stats }))
}

fn scatter_axis(key: Option<&str>, default: &'static str) -> Result<&'static StatField, AppError> {
    let key = key.filter(|k| !k.is_empty()).unwrap_or(default);
    stat_field(key).ok_or_else(|| AppError::BadRequest(format!("unknown stat field: {key}")))
}

async fn get_scatter(
    State(state): State<ApiState>,
    Query(axes): Query<ScatterQuery>,
    Query(filter): Query<FilterQuery>,
) -> Result<Json<ScatterResponse>, AppError> {
    let x = scatter_axis(axes.x.as_deref(), DEFAULT_SCATTER_X)?;
    let y = scatter_axis(axes.y.as_deref(), DEFAULT_SCATTER_Y)?;

    let rows = queries::scatter_rows(&state.pool, &filter.to_filter(), x, y).await?;
    let points = rows
        .into_iter()
        .filter_map(|r| {
            let (px, py) = (r.x_value?, r.y_value?);
            if px < 0.0 || py < 0.0 {
                return None;
            }
            Some(ScatterPoint {
                name: r.name,
                club: r.club,
                country: r.country,
                position: r.position,
                age: r.age,
                market_value: market_value_label(r.market_value),
                x: px,
                y: py,
            })
        })
        .collect();

    Ok(Json(ScatterResponse {
        title: format!("{} vs {}", x.display, y.display),
        x_field: x.key,
        y_field: y.key,
        x_label: x.display,
        y_label: y.display,
        points,
    }))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::db::{memory_pool, RecordStore, SqliteStore};
    use crate::types::{PlayerProfile, PlayerRecord, TeamLink};

    fn profile(id: i64, name: &str, club: &str, value: Option<i64>) -> PlayerProfile {
        PlayerProfile {
            fotmob_id: id,
            name: name.to_string(),
            club: Some(club.to_string()),
            position: "Striker".to_string(),
            country: Some("Norway".to_string()),
            shirt_number: Some(9),
            age: Some(25),
            height: Some(195),
            market_value: value,
        }
    }

    fn stats(pairs: &[(&str, f64)]) -> Option<PlayerStats> {
        let mut s = PlayerStats::new();
        for (k, v) in pairs {
            s.set(k, *v);
        }
        Some(s)
    }

    async fn app() -> Router {
        let store = SqliteStore::new(memory_pool().await);
        store
            .save_club(&TeamLink {
                league: "Premier League".to_string(),
                club: "Man City".to_string(),
                squad_url: String::new(),
            })
            .await
            .unwrap();
        let records = [
            PlayerRecord {
                profile: profile(1, "Erling Haaland", "Man City", Some(180_000_000)),
                stats: stats(&[("goals", 22.0), ("expected_goals", 20.4)]),
            },
            PlayerRecord {
                profile: profile(2, "Only Goals", "Man City", None),
                stats: stats(&[("goals", 3.0)]),
            },
            PlayerRecord {
                profile: profile(3, "Negative", "Man City", None),
                stats: stats(&[("goals", 1.0), ("expected_goals", -0.5)]),
            },
            PlayerRecord {
                profile: profile(4, "No Stats", "Man City", None),
                stats: None,
            },
        ];
        for r in &records {
            store.save(r).await.unwrap();
        }
        router(ApiState {
            pool: store.pool().clone(),
        })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let (status, body) = get(app().await, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["counts"]["players"], 4);
        assert_eq!(body["counts"]["player_stats"], 3);
    }

    #[tokio::test]
    async fn player_detail_and_missing_player() {
        let (status, body) = get(app().await, "/players/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Erling Haaland");
        assert_eq!(body["club"], "Man City");
        assert_eq!(body["stats"]["goals"], 22.0);

        let (status, _) = get(app().await, "/players/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn players_list_applies_market_value_bound() {
        let (_, body) = get(app().await, "/players?min_market_value=100").await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Erling Haaland"]);
    }

    #[tokio::test]
    async fn scatter_skips_missing_and_negative_values() {
        let (status, body) = get(app().await, "/scatter").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["x_field"], "expected_goals");
        assert_eq!(body["y_field"], "goals");
        let points = body["points"].as_array().unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0]["name"], "Erling Haaland");
        assert_eq!(points[0]["market_value"], "€180.0M");
        assert_eq!(points[0]["x"], 20.4);
    }

    #[tokio::test]
    async fn scatter_rejects_unknown_field() {
        let (status, _) = get(app().await, "/scatter?x=not_a_stat").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn filters_list_dropdown_choices() {
        let (_, body) = get(app().await, "/filters").await;
        assert_eq!(body["leagues"][0]["name"], "Premier League");
        assert_eq!(body["countries"], serde_json::json!(["Norway"]));
        assert_eq!(body["positions"], serde_json::json!(["Striker"]));
        assert_eq!(body["stat_fields"].as_array().unwrap().len(), STAT_FIELDS.len());
    }

    #[test]
    fn filter_query_parses_lists_and_clamps() {
        let q = FilterQuery {
            league: Some("1, 2,abc,".to_string()),
            position: Some("Winger,Back".to_string()),
            max_age: Some(400),
            min_height: Some(-5),
            ..FilterQuery::default()
        };
        let f = q.to_filter();
        assert_eq!(f.league_ids, vec![1, 2]);
        assert_eq!(f.positions, vec!["Winger", "Back"]);
        assert_eq!(f.max_age, AGE_MAX);
        assert_eq!(f.min_height, 0);
        assert_eq!(market_value_label(Some(12_500_000)), "€12.5M");
        assert_eq!(market_value_label(None), "Unknown");
    }
}
