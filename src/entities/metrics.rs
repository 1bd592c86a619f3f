//! Advanced per-season metrics: conference SP+, opponent-adjusted team
//! efficiency, weighted player EPA and season stat lines.

use serde::Deserialize;
use serde_json::Value;

use super::de;
use crate::database_ops::store_row;
use crate::provider::Filter;
use crate::task::Transform;

store_row! {
    pub struct ConferenceSpRow => "conference_sp", key(year, conference), chunk 200;
    {
        year: i32 = "INTEGER",
        conference: String = "TEXT",
        rating: Option<f64> = "DOUBLE PRECISION",
        second_order_wins: Option<f64> = "DOUBLE PRECISION",
        sos: Option<f64> = "DOUBLE PRECISION",
        offense: Option<Value> = "JSONB",
        defense: Option<Value> = "JSONB",
        special_teams: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceSpSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub year: Option<i32>,
    pub conference: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub second_order_wins: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub sos: Option<f64>,
    pub offense: Option<Value>,
    pub defense: Option<Value>,
    pub special_teams: Option<Value>,
}

impl Transform for ConferenceSpSource {
    type Row = ConferenceSpRow;

    fn into_row(self, filter: &Filter) -> Option<ConferenceSpRow> {
        Some(ConferenceSpRow {
            year: self.year.or(filter.year)?,
            conference: self.conference?,
            rating: self.rating,
            second_order_wins: self.second_order_wins,
            sos: self.sos,
            offense: self.offense,
            defense: self.defense,
            special_teams: self.special_teams,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EpaSplit {
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub passing: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rushing: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownSplit {
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub standard_downs: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub passing_downs: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RushYards {
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub line_yards: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub second_level_yards: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub open_field_yards: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub highlight_yards: Option<f64>,
}

store_row! {
    /// Opponent-adjusted efficiency; the nested upstream splits are flattened
    /// into one column each.
    pub struct AdjustedTeamMetricsRow => "adjusted_team_metrics", key(year, team_id), chunk 500;
    {
        year: i32 = "INTEGER",
        team_id: i32 = "INTEGER",
        team: Option<String> = "TEXT",
        conference: Option<String> = "TEXT",
        epa_total: Option<f64> = "DOUBLE PRECISION",
        epa_passing: Option<f64> = "DOUBLE PRECISION",
        epa_rushing: Option<f64> = "DOUBLE PRECISION",
        epa_allowed_total: Option<f64> = "DOUBLE PRECISION",
        epa_allowed_passing: Option<f64> = "DOUBLE PRECISION",
        epa_allowed_rushing: Option<f64> = "DOUBLE PRECISION",
        success_rate_total: Option<f64> = "DOUBLE PRECISION",
        success_rate_standard_downs: Option<f64> = "DOUBLE PRECISION",
        success_rate_passing_downs: Option<f64> = "DOUBLE PRECISION",
        success_rate_allowed_total: Option<f64> = "DOUBLE PRECISION",
        success_rate_allowed_standard_downs: Option<f64> = "DOUBLE PRECISION",
        success_rate_allowed_passing_downs: Option<f64> = "DOUBLE PRECISION",
        rushing_line_yards: Option<f64> = "DOUBLE PRECISION",
        rushing_second_level_yards: Option<f64> = "DOUBLE PRECISION",
        rushing_open_field_yards: Option<f64> = "DOUBLE PRECISION",
        rushing_highlight_yards: Option<f64> = "DOUBLE PRECISION",
        rushing_allowed_line_yards: Option<f64> = "DOUBLE PRECISION",
        rushing_allowed_second_level_yards: Option<f64> = "DOUBLE PRECISION",
        rushing_allowed_open_field_yards: Option<f64> = "DOUBLE PRECISION",
        rushing_allowed_highlight_yards: Option<f64> = "DOUBLE PRECISION",
        explosiveness: Option<f64> = "DOUBLE PRECISION",
        explosiveness_allowed: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustedTeamMetricsSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub team_id: Option<i32>,
    pub team: Option<String>,
    pub conference: Option<String>,
    pub epa: Option<EpaSplit>,
    pub epa_allowed: Option<EpaSplit>,
    pub success_rate: Option<DownSplit>,
    pub success_rate_allowed: Option<DownSplit>,
    pub rushing: Option<RushYards>,
    pub rushing_allowed: Option<RushYards>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub explosiveness: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub explosiveness_allowed: Option<f64>,
}

impl Transform for AdjustedTeamMetricsSource {
    type Row = AdjustedTeamMetricsRow;

    fn into_row(self, filter: &Filter) -> Option<AdjustedTeamMetricsRow> {
        let epa = self.epa.unwrap_or_default();
        let epa_allowed = self.epa_allowed.unwrap_or_default();
        let sr = self.success_rate.unwrap_or_default();
        let sr_allowed = self.success_rate_allowed.unwrap_or_default();
        let rush = self.rushing.unwrap_or_default();
        let rush_allowed = self.rushing_allowed.unwrap_or_default();
        Some(AdjustedTeamMetricsRow {
            year: self.year.or(filter.year)?,
            team_id: self.team_id?,
            team: self.team,
            conference: self.conference,
            epa_total: epa.total,
            epa_passing: epa.passing,
            epa_rushing: epa.rushing,
            epa_allowed_total: epa_allowed.total,
            epa_allowed_passing: epa_allowed.passing,
            epa_allowed_rushing: epa_allowed.rushing,
            success_rate_total: sr.total,
            success_rate_standard_downs: sr.standard_downs,
            success_rate_passing_downs: sr.passing_downs,
            success_rate_allowed_total: sr_allowed.total,
            success_rate_allowed_standard_downs: sr_allowed.standard_downs,
            success_rate_allowed_passing_downs: sr_allowed.passing_downs,
            rushing_line_yards: rush.line_yards,
            rushing_second_level_yards: rush.second_level_yards,
            rushing_open_field_yards: rush.open_field_yards,
            rushing_highlight_yards: rush.highlight_yards,
            rushing_allowed_line_yards: rush_allowed.line_yards,
            rushing_allowed_second_level_yards: rush_allowed.second_level_yards,
            rushing_allowed_open_field_yards: rush_allowed.open_field_yards,
            rushing_allowed_highlight_yards: rush_allowed.highlight_yards,
            explosiveness: self.explosiveness,
            explosiveness_allowed: self.explosiveness_allowed,
        })
    }
}

store_row! {
    /// Passing and rushing WEPA share a table; `play_type` tells them apart.
    pub struct PlayerWepaRow => "player_weighted_epa", key(year, athlete_id, play_type), chunk 500;
    {
        year: i32 = "INTEGER",
        athlete_id: String = "TEXT",
        play_type: String = "TEXT",
        athlete_name: Option<String> = "TEXT",
        position: Option<String> = "TEXT",
        team: Option<String> = "TEXT",
        conference: Option<String> = "TEXT",
        wepa: Option<f64> = "DOUBLE PRECISION",
        plays: Option<i32> = "INTEGER",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WepaFields {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub athlete_id: Option<String>,
    pub athlete_name: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
    pub conference: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub wepa: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub plays: Option<i32>,
}

impl WepaFields {
    fn into_row(self, play_type: &str, filter: &Filter) -> Option<PlayerWepaRow> {
        Some(PlayerWepaRow {
            year: self.year.or(filter.year)?,
            athlete_id: self.athlete_id?,
            play_type: play_type.to_string(),
            athlete_name: self.athlete_name,
            position: self.position,
            team: self.team,
            conference: self.conference,
            wepa: self.wepa,
            plays: self.plays,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct PassingWepaSource(pub WepaFields);

impl Transform for PassingWepaSource {
    type Row = PlayerWepaRow;

    fn into_row(self, filter: &Filter) -> Option<PlayerWepaRow> {
        self.0.into_row("passing", filter)
    }
}

#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub struct RushingWepaSource(pub WepaFields);

impl Transform for RushingWepaSource {
    type Row = PlayerWepaRow;

    fn into_row(self, filter: &Filter) -> Option<PlayerWepaRow> {
        self.0.into_row("rushing", filter)
    }
}

store_row! {
    pub struct KickerPaarRow => "kicker_paar", key(year, athlete_id), chunk 500;
    {
        year: i32 = "INTEGER",
        athlete_id: String = "TEXT",
        athlete_name: Option<String> = "TEXT",
        team: Option<String> = "TEXT",
        conference: Option<String> = "TEXT",
        paar: Option<f64> = "DOUBLE PRECISION",
        attempts: Option<i32> = "INTEGER",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickerPaarSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub athlete_id: Option<String>,
    pub athlete_name: Option<String>,
    pub team: Option<String>,
    pub conference: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub paar: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub attempts: Option<i32>,
}

impl Transform for KickerPaarSource {
    type Row = KickerPaarRow;

    fn into_row(self, filter: &Filter) -> Option<KickerPaarRow> {
        Some(KickerPaarRow {
            year: self.year.or(filter.year)?,
            athlete_id: self.athlete_id?,
            athlete_name: self.athlete_name,
            team: self.team,
            conference: self.conference,
            paar: self.paar,
            attempts: self.attempts,
        })
    }
}

store_row! {
    /// One stat line per player, category and stat type. The value is kept
    /// as text because the upstream mixes counts, averages and "long" marks.
    pub struct PlayerSeasonStatRow => "player_stats", key(season, player_id, category, stat_type), chunk 1000;
    {
        season: i32 = "INTEGER",
        player_id: String = "TEXT",
        category: String = "TEXT",
        stat_type: String = "TEXT",
        stat: Option<String> = "TEXT",
        player: Option<String> = "TEXT",
        position: Option<String> = "TEXT",
        team: Option<String> = "TEXT",
        conference: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSeasonStatSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub season: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub player_id: Option<String>,
    pub category: Option<String>,
    pub stat_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub stat: Option<String>,
    pub player: Option<String>,
    pub position: Option<String>,
    pub team: Option<String>,
    pub conference: Option<String>,
}

impl Transform for PlayerSeasonStatSource {
    type Row = PlayerSeasonStatRow;

    fn into_row(self, filter: &Filter) -> Option<PlayerSeasonStatRow> {
        Some(PlayerSeasonStatRow {
            season: self.season.or(filter.year)?,
            player_id: self.player_id?,
            category: self.category?,
            stat_type: self.stat_type?,
            stat: self.stat,
            player: self.player,
            position: self.position,
            team: self.team,
            conference: self.conference,
        })
    }
}

store_row! {
    /// `stat_value` is JSON since the upstream sends numbers or strings.
    pub struct TeamSeasonStatRow => "team_stats", key(season, team, stat_name), chunk 1000;
    {
        season: i32 = "INTEGER",
        team: String = "TEXT",
        stat_name: String = "TEXT",
        conference: Option<String> = "TEXT",
        stat_value: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSeasonStatSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub season: Option<i32>,
    pub team: Option<String>,
    pub stat_name: Option<String>,
    pub conference: Option<String>,
    pub stat_value: Option<Value>,
}

impl Transform for TeamSeasonStatSource {
    type Row = TeamSeasonStatRow;

    fn into_row(self, filter: &Filter) -> Option<TeamSeasonStatRow> {
        Some(TeamSeasonStatRow {
            season: self.season.or(filter.year)?,
            team: self.team?,
            stat_name: self.stat_name?,
            conference: self.conference,
            stat_value: self.stat_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::UpsertRow;
    use serde_json::json;

    #[test]
    fn conference_sp_keeps_unit_breakdowns_as_json() {
        let src: ConferenceSpSource = serde_json::from_value(json!({
            "conference": "SEC",
            "rating": 14.2,
            "secondOrderWins": null,
            "offense": {"rating": 33.1, "success": 0.47},
            "specialTeams": {"rating": 0.3}
        }))
        .unwrap();
        let row = src.into_row(&Filter::year(2024)).unwrap();
        assert_eq!(row.year, 2024);
        assert_eq!(row.conference, "SEC");
        assert_eq!(row.second_order_wins, None);
        assert_eq!(row.offense, Some(json!({"rating": 33.1, "success": 0.47})));
        assert_eq!(row.defense, None);
    }

    #[test]
    fn adjusted_metrics_flatten_nested_splits() {
        let src: AdjustedTeamMetricsSource = serde_json::from_value(json!({
            "year": 2024,
            "teamId": "333",
            "team": "Alabama",
            "epa": {"total": 0.21, "passing": 0.33, "rushing": 0.1},
            "successRateAllowed": {"standardDowns": 0.41},
            "rushing": {"lineYards": 3.1, "highlightYards": "1.7"},
            "explosiveness": 1.2
        }))
        .unwrap();
        let row = src.into_row(&Filter::year(2024)).unwrap();
        assert_eq!(row.team_id, 333);
        assert_eq!(row.epa_passing, Some(0.33));
        assert_eq!(row.epa_allowed_total, None);
        assert_eq!(row.success_rate_allowed_standard_downs, Some(0.41));
        assert_eq!(row.rushing_line_yards, Some(3.1));
        assert_eq!(row.rushing_highlight_yards, Some(1.7));
        assert_eq!(row.rushing_allowed_line_yards, None);
        assert_eq!(row.explosiveness, Some(1.2));
    }

    #[test]
    fn passing_and_rushing_wepa_do_not_collide() {
        let raw = json!({
            "year": 2024,
            "athleteId": 4432577,
            "athleteName": "Q. Back",
            "wepa": 0.31,
            "plays": 402
        });
        let pass: PassingWepaSource = serde_json::from_value(raw.clone()).unwrap();
        let rush: RushingWepaSource = serde_json::from_value(raw).unwrap();
        let pass = pass.into_row(&Filter::year(2024)).unwrap();
        let rush = rush.into_row(&Filter::year(2024)).unwrap();
        assert_eq!(pass.athlete_id, "4432577");
        assert_eq!(pass.play_type, "passing");
        assert_eq!(rush.play_type, "rushing");
        assert_ne!(pass.key(), rush.key());
        assert_eq!(pass.plays, Some(402));
    }

    #[test]
    fn kicker_without_athlete_is_dropped() {
        let src: KickerPaarSource =
            serde_json::from_value(json!({"year": 2024, "team": "Texas", "paar": 4.5})).unwrap();
        assert!(src.into_row(&Filter::year(2024)).is_none());
        let src: KickerPaarSource = serde_json::from_value(
            json!({"athleteId": "55", "paar": "4.5", "attempts": 22}),
        )
        .unwrap();
        let row = src.into_row(&Filter::year(2023)).unwrap();
        assert_eq!(row.year, 2023);
        assert_eq!(row.paar, Some(4.5));
        assert_eq!(row.attempts, Some(22));
    }

    #[test]
    fn player_stat_value_is_text_and_not_part_of_the_key() {
        let line = |stat: Value| {
            let src: PlayerSeasonStatSource = serde_json::from_value(json!({
                "season": 2024,
                "playerId": 4870001,
                "player": "W. Receiver",
                "category": "receiving",
                "statType": "YDS",
                "stat": stat
            }))
            .unwrap();
            src.into_row(&Filter::year(2024)).unwrap()
        };
        let before = line(json!(812));
        let after = line(json!("845"));
        assert_eq!(before.player_id, "4870001");
        assert_eq!(before.stat.as_deref(), Some("812"));
        assert_eq!(before.key(), after.key());
    }

    #[test]
    fn team_stat_requires_a_name() {
        let src: TeamSeasonStatSource = serde_json::from_value(json!({
            "season": 2024,
            "team": "Oregon",
            "statName": "possessionTime",
            "statValue": "31:12"
        }))
        .unwrap();
        let row = src.into_row(&Filter::year(2024)).unwrap();
        assert_eq!(row.stat_value, Some(json!("31:12")));
        let src: TeamSeasonStatSource =
            serde_json::from_value(json!({"season": 2024, "team": "Oregon", "statValue": 12})).unwrap();
        assert!(src.into_row(&Filter::year(2024)).is_none());
    }
}
