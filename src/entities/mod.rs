//! Upstream record shapes, their store rows, and the phase plan.
//!
//! Source structs mirror the upstream JSON (camelCase, every field optional).
//! Transforms copy fields across as-is; a record is dropped only when a key
//! column is missing.

pub mod fanout;
pub mod game_detail;
pub mod metrics;
pub mod reference;
pub mod season;
pub mod spine;

use crate::database_ops::{Store, TableDef};
use crate::orchestrator::Phase;
use crate::provider::{Endpoint, Upstream};
use crate::task::{BulkTask, FanoutTask, PeriodTask};

/// Every entity table in creation order.
pub fn tables() -> Vec<TableDef> {
    vec![
        TableDef::of::<reference::ConferenceRow>(),
        TableDef::of::<reference::VenueRow>(),
        TableDef::of::<reference::PlayTypeRow>(),
        TableDef::of::<reference::PlayStatTypeRow>(),
        TableDef::of::<reference::DraftTeamRow>(),
        TableDef::of::<reference::DraftPositionRow>(),
        TableDef::of::<reference::FieldGoalEpRow>(),
        TableDef::of::<reference::TeamRow>(),
        TableDef::of::<spine::CalendarWeekRow>(),
        TableDef::of::<spine::GameRow>(),
        TableDef::of::<game_detail::DriveRow>(),
        TableDef::of::<game_detail::PlayRow>(),
        TableDef::of::<game_detail::PlayStatRow>(),
        TableDef::of::<game_detail::GameTeamStatsRow>(),
        TableDef::of::<game_detail::GamePlayerStatsRow>(),
        TableDef::of::<game_detail::GameWeatherRow>(),
        TableDef::of::<game_detail::GameMediaRow>(),
        TableDef::of::<game_detail::BettingGameRow>(),
        TableDef::of::<season::TeamRecordRow>(),
        TableDef::of::<season::TeamTalentRow>(),
        TableDef::of::<season::TeamAtsRow>(),
        TableDef::of::<season::TeamSpRow>(),
        TableDef::of::<season::TeamSrsRow>(),
        TableDef::of::<season::TeamEloRow>(),
        TableDef::of::<season::TeamFpiRow>(),
        TableDef::of::<season::PollWeekRow>(),
        TableDef::of::<season::RecruitRow>(),
        TableDef::of::<season::DraftPickRow>(),
        TableDef::of::<season::ReturningProductionRow>(),
        TableDef::of::<season::PlayerTransferRow>(),
        TableDef::of::<season::TeamRecruitingRankRow>(),
        TableDef::of::<metrics::ConferenceSpRow>(),
        TableDef::of::<metrics::AdjustedTeamMetricsRow>(),
        TableDef::of::<metrics::PlayerWepaRow>(),
        TableDef::of::<metrics::KickerPaarRow>(),
        TableDef::of::<metrics::PlayerSeasonStatRow>(),
        TableDef::of::<metrics::TeamSeasonStatRow>(),
        TableDef::of::<fanout::PlayWinProbabilityRow>(),
        TableDef::of::<fanout::AdvancedBoxScoreRow>(),
    ]
}

/// Reference data, then the season spine, then everything keyed off games.
pub fn plan<S: Store, U: Upstream>() -> Vec<Phase<S, U>> {
    use fanout::*;
    use game_detail::*;
    use metrics::*;
    use reference::*;
    use season::*;
    use spine::*;

    vec![
        Phase::new("reference")
            .task(BulkTask::<ConferenceSource>::once("conferences", Endpoint::Conferences))
            .task(BulkTask::<VenueSource>::once("venues", Endpoint::Venues))
            .task(BulkTask::<PlayTypeSource>::once("play_types", Endpoint::PlayTypes))
            .task(BulkTask::<PlayStatTypeSource>::once("play_stat_types", Endpoint::PlayStatTypes))
            .task(BulkTask::<DraftTeamSource>::once("draft_teams", Endpoint::DraftTeams))
            .task(BulkTask::<DraftPositionSource>::once("draft_positions", Endpoint::DraftPositions))
            .task(BulkTask::<FieldGoalEpSource>::once("field_goal_ep", Endpoint::FieldGoalExpectedPoints))
            .task(BulkTask::<TeamSource>::once("teams", Endpoint::Teams)),
        Phase::new("spine")
            .task(BulkTask::<CalendarWeekSource>::per_year("calendar", Endpoint::Calendar))
            .task(BulkTask::<GameSource>::per_year("games", Endpoint::Games)),
        Phase::new("detail")
            .task(BulkTask::<DriveSource>::per_year("drives", Endpoint::Drives))
            .task(PeriodTask::<PlaySource>::new("plays", Endpoint::Plays))
            .task(PeriodTask::<PlayStatSource>::new("play_stats", Endpoint::PlayStats))
            .task(BulkTask::<GameTeamStatsSource>::per_year("game_team_stats", Endpoint::GameTeamStats))
            .task(BulkTask::<GamePlayerStatsSource>::per_year("game_player_stats", Endpoint::GamePlayerStats))
            .task(BulkTask::<GameWeatherSource>::per_year("game_weather", Endpoint::GameWeather))
            .task(BulkTask::<GameMediaSource>::per_year("game_media", Endpoint::GameMedia))
            .task(BulkTask::<BettingGameSource>::per_year("betting_lines", Endpoint::BettingLines))
            .task(BulkTask::<TeamRecordSource>::per_year("team_records", Endpoint::TeamRecords))
            .task(BulkTask::<TeamTalentSource>::per_year("team_talent", Endpoint::TeamTalent))
            .task(BulkTask::<TeamAtsSource>::per_year("team_ats", Endpoint::TeamAts))
            .task(BulkTask::<TeamSpSource>::per_year("sp_ratings", Endpoint::SpRatings))
            .task(BulkTask::<TeamSrsSource>::per_year("srs_ratings", Endpoint::SrsRatings))
            .task(BulkTask::<TeamEloSource>::per_year("elo_ratings", Endpoint::EloRatings))
            .task(BulkTask::<TeamFpiSource>::per_year("fpi_ratings", Endpoint::FpiRatings))
            .task(BulkTask::<PollWeekSource>::per_year("rankings", Endpoint::Rankings))
            .task(BulkTask::<RecruitSource>::per_year("recruits", Endpoint::Recruits))
            .task(BulkTask::<DraftPickSource>::per_year("draft_picks", Endpoint::DraftPicks))
            .task(BulkTask::<ReturningProductionSource>::per_year(
                "returning_production",
                Endpoint::ReturningProduction,
            ))
            .task(BulkTask::<PlayerTransferSource>::per_year("transfer_portal", Endpoint::TransferPortal))
            .task(BulkTask::<TeamRecruitingRankSource>::per_year(
                "recruiting_rankings",
                Endpoint::TeamRecruitingRankings,
            ))
            .task(BulkTask::<ConferenceSpSource>::per_year("conference_sp", Endpoint::ConferenceSpRatings))
            .task(BulkTask::<AdjustedTeamMetricsSource>::per_year(
                "adjusted_team_metrics",
                Endpoint::AdjustedTeamMetrics,
            ))
            .task(BulkTask::<PassingWepaSource>::per_year("wepa_passing", Endpoint::PassingWepa))
            .task(BulkTask::<RushingWepaSource>::per_year("wepa_rushing", Endpoint::RushingWepa))
            .task(BulkTask::<KickerPaarSource>::per_year("wepa_kicking", Endpoint::KickingPaar))
            .task(BulkTask::<PlayerSeasonStatSource>::per_year("player_season_stats", Endpoint::PlayerSeasonStats))
            .task(BulkTask::<TeamSeasonStatSource>::per_year("team_season_stats", Endpoint::TeamSeasonStats))
            .task(FanoutTask::<PlayWinProbabilitySource>::new("win_probability", Endpoint::WinProbability))
            .task(FanoutTask::<AdvancedBoxScoreSource>::new("advanced_box_scores", Endpoint::AdvancedBoxScore)),
    ]
}

/// Lenient field decoders for identifiers the upstream sends as either
/// numbers or strings.
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        Ok(opt_i64(d)?.and_then(|v| i32::try_from(v).ok()))
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::memory::MemoryStore;
    use crate::provider::scripted::ScriptedUpstream;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn every_table_is_created_once() {
        let names: Vec<&str> = tables().iter().map(|t| t.name).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
        assert!(names.contains(&"calendar_weeks"));
    }

    #[test]
    fn plan_has_three_ordered_phases_with_unique_task_names() {
        let phases = plan::<MemoryStore, ScriptedUpstream>();
        let names: Vec<&str> = phases.iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["reference", "spine", "detail"]);
        let tasks: Vec<&str> = phases.iter().flat_map(|p| p.task_names()).collect();
        let unique: HashSet<&str> = tasks.iter().copied().collect();
        assert_eq!(tasks.len(), unique.len());
        assert!(phases[1].task_names().contains(&"games"));
        assert!(phases[2].task_names().contains(&"win_probability"));
        for name in ["conference_sp", "wepa_passing", "wepa_rushing", "transfer_portal", "recruiting_rankings"] {
            assert!(phases[2].task_names().contains(&name), "{name} missing from detail");
        }
    }

    #[derive(Deserialize)]
    struct Ids {
        #[serde(default, deserialize_with = "de::opt_string")]
        a: Option<String>,
        #[serde(default, deserialize_with = "de::opt_i64")]
        b: Option<i64>,
        #[serde(default, deserialize_with = "de::opt_f64")]
        c: Option<f64>,
    }

    #[test]
    fn lenient_decoders_accept_numbers_and_strings() {
        let v: Ids = serde_json::from_value(json!({"a": 12, "b": "401", "c": "1.5"})).unwrap();
        assert_eq!(v.a.as_deref(), Some("12"));
        assert_eq!(v.b, Some(401));
        assert_eq!(v.c, Some(1.5));
        let v: Ids = serde_json::from_value(json!({"b": 401.0})).unwrap();
        assert_eq!(v.a, None);
        assert_eq!(v.b, Some(401));
        assert_eq!(v.c, None);
    }
}
