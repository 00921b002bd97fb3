pub mod client;
pub mod stats;
pub mod stream;

use serde::{Deserialize, Deserializer, Serialize};

pub use stats::{LineupOrder, aggregate};

/// Upstream sends `null` for fields it has not filled in yet; treat that the
/// same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ---------------------------------------------------------------------------
// Domain types. These match the remote JSON shapes one-to-one (camelCase)
// ---------------------------------------------------------------------------

/// A single match. Replaced wholesale on every live snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Game {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub season: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub day: u32,

    #[serde(deserialize_with = "null_as_default")]
    pub away_team: String,
    #[serde(deserialize_with = "null_as_default")]
    pub away_team_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub away_team_nickname: String,
    #[serde(deserialize_with = "null_as_default")]
    pub away_team_emoji: String,
    pub away_batter: Option<String>,
    pub away_batter_name: Option<String>,

    #[serde(deserialize_with = "null_as_default")]
    pub home_team: String,
    #[serde(deserialize_with = "null_as_default")]
    pub home_team_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub home_team_nickname: String,
    #[serde(deserialize_with = "null_as_default")]
    pub home_team_emoji: String,
    pub home_batter: Option<String>,
    pub home_batter_name: Option<String>,

    #[serde(deserialize_with = "null_as_default")]
    pub base_runners: Vec<String>,
    /// Game statsheet id. Empty until the upstream service allocates one.
    #[serde(deserialize_with = "null_as_default")]
    pub statsheet: String,
    #[serde(deserialize_with = "null_as_default")]
    pub game_complete: bool,
}

impl Game {
    pub fn statsheet_id(&self) -> Option<&str> {
        Some(self.statsheet.as_str()).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Team {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// Batting order; index = lineup slot.
    #[serde(deserialize_with = "null_as_default")]
    pub lineup: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub rotation: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub nickname: String,
    #[serde(deserialize_with = "null_as_default")]
    pub shorthand: String,
    #[serde(deserialize_with = "null_as_default")]
    pub emoji: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slogan: String,
    #[serde(deserialize_with = "null_as_default")]
    pub win_streak: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameStatsheet {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub away_team_runs_by_inning: Vec<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub home_team_runs_by_inning: Vec<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub away_team_stats: String,
    #[serde(deserialize_with = "null_as_default")]
    pub home_team_stats: String,
}

impl GameStatsheet {
    /// Team statsheet ids in (away, home) order, skipping blanks.
    pub fn team_statsheet_ids(&self) -> impl Iterator<Item = &str> {
        [self.away_team_stats.as_str(), self.home_team_stats.as_str()]
            .into_iter()
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamStatsheet {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub team: String,
    /// Player statsheet fragment ids; a player may be listed more than once.
    #[serde(deserialize_with = "null_as_default")]
    pub player_stats: Vec<String>,
}

/// One raw per-player statistics fragment, or (after [`aggregate`]) the sum of
/// every fragment sharing a `player_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStatsheet {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub player_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub team: String,
    #[serde(deserialize_with = "null_as_default")]
    pub team_id: String,

    #[serde(deserialize_with = "null_as_default")]
    pub at_bats: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub caught_stealing: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub doubles: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub earned_runs: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub ground_into_dp: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub hit_batters: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub hit_by_pitch: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub hits: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub hits_allowed: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub home_runs: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub losses: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub outs_recorded: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pitches_thrown: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub quadruples: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub rbis: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub runs: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub stolen_bases: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub strikeouts: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub struckouts: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub triples: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub walks: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub walks_issued: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub wins: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationData {
    #[serde(deserialize_with = "null_as_default")]
    pub season: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub day: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeasonDayCount {
    #[serde(deserialize_with = "null_as_default")]
    pub day_count: u32,
}
