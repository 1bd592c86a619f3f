//! Upstream provider seam.
//!
//! The pipeline only ever asks the upstream for "the records of endpoint X
//! matching filter F". [`cfbd::CfbdClient`] answers over HTTP; tests use a
//! scripted double.

pub mod cfbd;
#[cfg(test)]
pub mod scripted;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::UpstreamError;

/// Read-only query operations exposed by the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    Conferences,
    Venues,
    PlayTypes,
    PlayStatTypes,
    DraftTeams,
    DraftPositions,
    FieldGoalExpectedPoints,
    Teams,
    Calendar,
    Games,
    Drives,
    Plays,
    PlayStats,
    GameTeamStats,
    GamePlayerStats,
    GameWeather,
    GameMedia,
    BettingLines,
    TeamRecords,
    TeamTalent,
    TeamAts,
    SpRatings,
    SrsRatings,
    EloRatings,
    FpiRatings,
    Rankings,
    Recruits,
    DraftPicks,
    ReturningProduction,
    ConferenceSpRatings,
    AdjustedTeamMetrics,
    PassingWepa,
    RushingWepa,
    KickingPaar,
    TransferPortal,
    PlayerSeasonStats,
    TeamSeasonStats,
    TeamRecruitingRankings,
    WinProbability,
    AdvancedBoxScore,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Conferences => "/conferences",
            Endpoint::Venues => "/venues",
            Endpoint::PlayTypes => "/plays/types",
            Endpoint::PlayStatTypes => "/plays/stats/types",
            Endpoint::DraftTeams => "/draft/teams",
            Endpoint::DraftPositions => "/draft/positions",
            Endpoint::FieldGoalExpectedPoints => "/metrics/fg/ep",
            Endpoint::Teams => "/teams",
            Endpoint::Calendar => "/calendar",
            Endpoint::Games => "/games",
            Endpoint::Drives => "/drives",
            Endpoint::Plays => "/plays",
            Endpoint::PlayStats => "/plays/stats",
            Endpoint::GameTeamStats => "/games/teams",
            Endpoint::GamePlayerStats => "/games/players",
            Endpoint::GameWeather => "/games/weather",
            Endpoint::GameMedia => "/games/media",
            Endpoint::BettingLines => "/lines",
            Endpoint::TeamRecords => "/records",
            Endpoint::TeamTalent => "/talent",
            Endpoint::TeamAts => "/ats/team",
            Endpoint::SpRatings => "/ratings/sp",
            Endpoint::SrsRatings => "/ratings/srs",
            Endpoint::EloRatings => "/ratings/elo",
            Endpoint::FpiRatings => "/ratings/fpi",
            Endpoint::Rankings => "/rankings",
            Endpoint::Recruits => "/recruiting/players",
            Endpoint::DraftPicks => "/draft/picks",
            Endpoint::ReturningProduction => "/player/returning",
            Endpoint::ConferenceSpRatings => "/ratings/sp/conferences",
            Endpoint::AdjustedTeamMetrics => "/wepa/team/season",
            Endpoint::PassingWepa => "/wepa/players/passing",
            Endpoint::RushingWepa => "/wepa/players/rushing",
            Endpoint::KickingPaar => "/wepa/players/kicking",
            Endpoint::TransferPortal => "/player/portal",
            Endpoint::PlayerSeasonStats => "/stats/player/season",
            Endpoint::TeamSeasonStats => "/stats/season",
            Endpoint::TeamRecruitingRankings => "/recruiting/teams",
            Endpoint::WinProbability => "/metrics/wp",
            Endpoint::AdvancedBoxScore => "/game/box/advanced",
        }
    }

    /// Query parameter carrying the single-game filter. The box score
    /// endpoint names it `id`, everything else `gameId`.
    fn game_param(self) -> &'static str {
        match self {
            Endpoint::AdvancedBoxScore => "id",
            _ => "gameId",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Filter record passed with a query. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Filter {
    pub year: Option<i32>,
    pub week: Option<i32>,
    pub season_type: Option<String>,
    pub game_id: Option<i64>,
}

impl Filter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    pub fn period(year: i32, week: i32, season_type: impl Into<String>) -> Self {
        Self {
            year: Some(year),
            week: Some(week),
            season_type: Some(season_type.into()),
            game_id: None,
        }
    }

    pub fn game(game_id: i64) -> Self {
        Self {
            game_id: Some(game_id),
            ..Self::default()
        }
    }

    pub fn query_pairs(&self, endpoint: Endpoint) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        if let Some(y) = self.year {
            out.push(("year", y.to_string()));
        }
        if let Some(w) = self.week {
            out.push(("week", w.to_string()));
        }
        if let Some(st) = &self.season_type {
            out.push(("seasonType", st.clone()));
        }
        if let Some(id) = self.game_id {
            out.push((endpoint.game_param(), id.to_string()));
        }
        out
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(y) = self.year {
            parts.push(format!("year={y}"));
        }
        if let Some(w) = self.week {
            parts.push(format!("week={w}"));
        }
        if let Some(st) = &self.season_type {
            parts.push(format!("season_type={st}"));
        }
        if let Some(id) = self.game_id {
            parts.push(format!("game_id={id}"));
        }
        if parts.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&parts.join(","))
        }
    }
}

#[async_trait]
pub trait Upstream: Send + Sync + 'static {
    /// Raw JSON body for `endpoint` filtered by `filter`.
    async fn fetch(&self, endpoint: Endpoint, filter: &Filter) -> Result<Value, UpstreamError>;
}

/// Splits a response body into individual records: arrays yield their
/// elements, a lone object is one record, `null` is none.
pub fn records(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_renders_only_set_fields() {
        assert!(Filter::none().query_pairs(Endpoint::Venues).is_empty());
        assert_eq!(
            Filter::period(2024, 3, "regular").query_pairs(Endpoint::Plays),
            vec![
                ("year", "2024".to_string()),
                ("week", "3".to_string()),
                ("seasonType", "regular".to_string()),
            ]
        );
        assert_eq!(Filter::period(2024, 3, "regular").to_string(), "year=2024,week=3,season_type=regular");
        assert_eq!(Filter::none().to_string(), "none");
    }

    #[test]
    fn game_filter_uses_endpoint_param_name() {
        assert_eq!(
            Filter::game(401).query_pairs(Endpoint::WinProbability),
            vec![("gameId", "401".to_string())]
        );
        assert_eq!(
            Filter::game(401).query_pairs(Endpoint::AdvancedBoxScore),
            vec![("id", "401".to_string())]
        );
    }

    #[test]
    fn records_normalizes_body_shapes() {
        assert_eq!(records(json!([{"id": 1}, {"id": 2}])).len(), 2);
        assert_eq!(records(json!({"gameInfo": {}})).len(), 1);
        assert!(records(Value::Null).is_empty());
    }
}
