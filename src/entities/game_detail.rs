//! Per-game detail fetched in bulk: by year, or by (year, week, season type)
//! for plays and play stats.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::de;
use crate::database_ops::store_row;
use crate::provider::Filter;
use crate::task::Transform;

#[derive(Debug, Default, Deserialize)]
pub struct Clock {
    pub minutes: Option<i32>,
    pub seconds: Option<i32>,
}

store_row! {
    pub struct DriveRow => "drives", key(id), chunk 500;
    {
        id: String = "TEXT",
        game_id: Option<i64> = "BIGINT",
        offense: Option<String> = "TEXT",
        offense_conference: Option<String> = "TEXT",
        defense: Option<String> = "TEXT",
        defense_conference: Option<String> = "TEXT",
        drive_number: Option<i32> = "INTEGER",
        scoring: Option<bool> = "BOOLEAN",
        start_period: Option<i32> = "INTEGER",
        start_yardline: Option<i32> = "INTEGER",
        start_yards_to_goal: Option<i32> = "INTEGER",
        start_time_minutes: Option<i32> = "INTEGER",
        start_time_seconds: Option<i32> = "INTEGER",
        end_period: Option<i32> = "INTEGER",
        end_yardline: Option<i32> = "INTEGER",
        end_yards_to_goal: Option<i32> = "INTEGER",
        end_time_minutes: Option<i32> = "INTEGER",
        end_time_seconds: Option<i32> = "INTEGER",
        plays: Option<i32> = "INTEGER",
        yards: Option<i32> = "INTEGER",
        drive_result: Option<String> = "TEXT",
        is_home_offense: Option<bool> = "BOOLEAN",
        start_offense_score: Option<i32> = "INTEGER",
        start_defense_score: Option<i32> = "INTEGER",
        end_offense_score: Option<i32> = "INTEGER",
        end_defense_score: Option<i32> = "INTEGER",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveSource {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub game_id: Option<i64>,
    pub offense: Option<String>,
    pub offense_conference: Option<String>,
    pub defense: Option<String>,
    pub defense_conference: Option<String>,
    pub drive_number: Option<i32>,
    pub scoring: Option<bool>,
    pub start_period: Option<i32>,
    pub start_yardline: Option<i32>,
    pub start_yards_to_goal: Option<i32>,
    pub start_time: Option<Clock>,
    pub end_period: Option<i32>,
    pub end_yardline: Option<i32>,
    pub end_yards_to_goal: Option<i32>,
    pub end_time: Option<Clock>,
    pub plays: Option<i32>,
    pub yards: Option<i32>,
    pub drive_result: Option<String>,
    pub is_home_offense: Option<bool>,
    pub start_offense_score: Option<i32>,
    pub start_defense_score: Option<i32>,
    pub end_offense_score: Option<i32>,
    pub end_defense_score: Option<i32>,
}

impl Transform for DriveSource {
    type Row = DriveRow;

    fn into_row(self, _: &Filter) -> Option<DriveRow> {
        let start = self.start_time.unwrap_or_default();
        let end = self.end_time.unwrap_or_default();
        Some(DriveRow {
            id: self.id?,
            game_id: self.game_id,
            offense: self.offense,
            offense_conference: self.offense_conference,
            defense: self.defense,
            defense_conference: self.defense_conference,
            drive_number: self.drive_number,
            scoring: self.scoring,
            start_period: self.start_period,
            start_yardline: self.start_yardline,
            start_yards_to_goal: self.start_yards_to_goal,
            start_time_minutes: start.minutes,
            start_time_seconds: start.seconds,
            end_period: self.end_period,
            end_yardline: self.end_yardline,
            end_yards_to_goal: self.end_yards_to_goal,
            end_time_minutes: end.minutes,
            end_time_seconds: end.seconds,
            plays: self.plays,
            yards: self.yards,
            drive_result: self.drive_result,
            is_home_offense: self.is_home_offense,
            start_offense_score: self.start_offense_score,
            start_defense_score: self.start_defense_score,
            end_offense_score: self.end_offense_score,
            end_defense_score: self.end_defense_score,
        })
    }
}

store_row! {
    pub struct PlayRow => "plays", key(id), chunk 500;
    {
        id: String = "TEXT",
        drive_id: Option<String> = "TEXT",
        game_id: Option<i64> = "BIGINT",
        season: Option<i32> = "INTEGER",
        week: Option<i32> = "INTEGER",
        season_type: Option<String> = "TEXT",
        drive_number: Option<i32> = "INTEGER",
        play_number: Option<i32> = "INTEGER",
        offense: Option<String> = "TEXT",
        offense_conference: Option<String> = "TEXT",
        offense_score: Option<i32> = "INTEGER",
        defense: Option<String> = "TEXT",
        defense_conference: Option<String> = "TEXT",
        defense_score: Option<i32> = "INTEGER",
        home: Option<String> = "TEXT",
        away: Option<String> = "TEXT",
        period: Option<i32> = "INTEGER",
        clock_minutes: Option<i32> = "INTEGER",
        clock_seconds: Option<i32> = "INTEGER",
        offense_timeouts: Option<i32> = "INTEGER",
        defense_timeouts: Option<i32> = "INTEGER",
        yardline: Option<i32> = "INTEGER",
        yards_to_goal: Option<i32> = "INTEGER",
        down: Option<i32> = "INTEGER",
        distance: Option<i32> = "INTEGER",
        yards_gained: Option<i32> = "INTEGER",
        scoring: Option<bool> = "BOOLEAN",
        play_type: Option<String> = "TEXT",
        play_text: Option<String> = "TEXT",
        ppa: Option<f64> = "DOUBLE PRECISION",
        wallclock: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaySource {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub drive_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub game_id: Option<i64>,
    pub drive_number: Option<i32>,
    pub play_number: Option<i32>,
    pub offense: Option<String>,
    pub offense_conference: Option<String>,
    pub offense_score: Option<i32>,
    pub defense: Option<String>,
    pub defense_conference: Option<String>,
    pub defense_score: Option<i32>,
    pub home: Option<String>,
    pub away: Option<String>,
    pub period: Option<i32>,
    pub clock: Option<Clock>,
    pub offense_timeouts: Option<i32>,
    pub defense_timeouts: Option<i32>,
    pub yardline: Option<i32>,
    pub yards_to_goal: Option<i32>,
    pub down: Option<i32>,
    pub distance: Option<i32>,
    pub yards_gained: Option<i32>,
    pub scoring: Option<bool>,
    pub play_type: Option<String>,
    pub play_text: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub ppa: Option<f64>,
    pub wallclock: Option<String>,
}

impl Transform for PlaySource {
    type Row = PlayRow;

    fn into_row(self, filter: &Filter) -> Option<PlayRow> {
        let clock = self.clock.unwrap_or_default();
        Some(PlayRow {
            id: self.id?,
            drive_id: self.drive_id,
            game_id: self.game_id,
            season: filter.year,
            week: filter.week,
            season_type: filter.season_type.clone(),
            drive_number: self.drive_number,
            play_number: self.play_number,
            offense: self.offense,
            offense_conference: self.offense_conference,
            offense_score: self.offense_score,
            defense: self.defense,
            defense_conference: self.defense_conference,
            defense_score: self.defense_score,
            home: self.home,
            away: self.away,
            period: self.period,
            clock_minutes: clock.minutes,
            clock_seconds: clock.seconds,
            offense_timeouts: self.offense_timeouts,
            defense_timeouts: self.defense_timeouts,
            yardline: self.yardline,
            yards_to_goal: self.yards_to_goal,
            down: self.down,
            distance: self.distance,
            yards_gained: self.yards_gained,
            scoring: self.scoring,
            play_type: self.play_type,
            play_text: self.play_text,
            ppa: self.ppa,
            wallclock: self.wallclock,
        })
    }
}

store_row! {
    pub struct PlayStatRow => "play_stats", key(play_id, athlete_id, stat_type), chunk 500;
    {
        play_id: String = "TEXT",
        athlete_id: String = "TEXT",
        stat_type: String = "TEXT",
        game_id: Option<i64> = "BIGINT",
        season: Option<i32> = "INTEGER",
        week: Option<i32> = "INTEGER",
        season_type: Option<String> = "TEXT",
        team: Option<String> = "TEXT",
        conference: Option<String> = "TEXT",
        opponent: Option<String> = "TEXT",
        team_score: Option<i32> = "INTEGER",
        opponent_score: Option<i32> = "INTEGER",
        drive_id: Option<String> = "TEXT",
        period: Option<i32> = "INTEGER",
        clock_minutes: Option<i32> = "INTEGER",
        clock_seconds: Option<i32> = "INTEGER",
        yards_to_goal: Option<i32> = "INTEGER",
        down: Option<i32> = "INTEGER",
        distance: Option<i32> = "INTEGER",
        athlete_name: Option<String> = "TEXT",
        stat: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayStatSource {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub game_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub season: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub week: Option<i32>,
    pub team: Option<String>,
    pub conference: Option<String>,
    pub opponent: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub team_score: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub opponent_score: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub drive_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub play_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub period: Option<i32>,
    pub clock: Option<Clock>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub yards_to_goal: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub down: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub distance: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub athlete_id: Option<String>,
    pub athlete_name: Option<String>,
    pub stat_type: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub stat: Option<f64>,
}

impl Transform for PlayStatSource {
    type Row = PlayStatRow;

    fn into_row(self, filter: &Filter) -> Option<PlayStatRow> {
        let clock = self.clock.unwrap_or_default();
        Some(PlayStatRow {
            play_id: self.play_id?,
            athlete_id: self.athlete_id?,
            stat_type: self.stat_type?,
            game_id: self.game_id,
            season: self.season.or(filter.year),
            week: self.week.or(filter.week),
            season_type: filter.season_type.clone(),
            team: self.team,
            conference: self.conference,
            opponent: self.opponent,
            team_score: self.team_score,
            opponent_score: self.opponent_score,
            drive_id: self.drive_id,
            period: self.period,
            clock_minutes: clock.minutes,
            clock_seconds: clock.seconds,
            yards_to_goal: self.yards_to_goal,
            down: self.down,
            distance: self.distance,
            athlete_name: self.athlete_name,
            stat: self.stat,
        })
    }
}

store_row! {
    /// Team box score per game; the nested category/stat list stays as JSON.
    pub struct GameTeamStatsRow => "game_team_stats", key(game_id), chunk 50;
    {
        game_id: i64 = "BIGINT",
        season: Option<i32> = "INTEGER",
        teams: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
pub struct GameTeamStatsSource {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub id: Option<i64>,
    pub teams: Option<Value>,
}

impl Transform for GameTeamStatsSource {
    type Row = GameTeamStatsRow;

    fn into_row(self, filter: &Filter) -> Option<GameTeamStatsRow> {
        Some(GameTeamStatsRow {
            game_id: self.id?,
            season: filter.year,
            teams: self.teams,
        })
    }
}

store_row! {
    pub struct GamePlayerStatsRow => "game_player_stats", key(game_id), chunk 20;
    {
        game_id: i64 = "BIGINT",
        season: Option<i32> = "INTEGER",
        teams: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
pub struct GamePlayerStatsSource {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub id: Option<i64>,
    pub teams: Option<Value>,
}

impl Transform for GamePlayerStatsSource {
    type Row = GamePlayerStatsRow;

    fn into_row(self, filter: &Filter) -> Option<GamePlayerStatsRow> {
        Some(GamePlayerStatsRow {
            game_id: self.id?,
            season: filter.year,
            teams: self.teams,
        })
    }
}

store_row! {
    pub struct GameWeatherRow => "game_weather", key(game_id), chunk 500;
    {
        game_id: i64 = "BIGINT",
        season: Option<i32> = "INTEGER",
        week: Option<i32> = "INTEGER",
        season_type: Option<String> = "TEXT",
        start_time: Option<DateTime<Utc>> = "TIMESTAMPTZ",
        game_indoors: Option<bool> = "BOOLEAN",
        home_team: Option<String> = "TEXT",
        home_conference: Option<String> = "TEXT",
        away_team: Option<String> = "TEXT",
        away_conference: Option<String> = "TEXT",
        venue_id: Option<i32> = "INTEGER",
        venue: Option<String> = "TEXT",
        temperature: Option<f64> = "DOUBLE PRECISION",
        dew_point: Option<f64> = "DOUBLE PRECISION",
        humidity: Option<f64> = "DOUBLE PRECISION",
        precipitation: Option<f64> = "DOUBLE PRECISION",
        snowfall: Option<f64> = "DOUBLE PRECISION",
        wind_direction: Option<f64> = "DOUBLE PRECISION",
        wind_speed: Option<f64> = "DOUBLE PRECISION",
        pressure: Option<f64> = "DOUBLE PRECISION",
        weather_condition_code: Option<f64> = "DOUBLE PRECISION",
        weather_condition: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameWeatherSource {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub id: Option<i64>,
    pub season: Option<i32>,
    pub week: Option<i32>,
    pub season_type: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub game_indoors: Option<bool>,
    pub home_team: Option<String>,
    pub home_conference: Option<String>,
    pub away_team: Option<String>,
    pub away_conference: Option<String>,
    pub venue_id: Option<i32>,
    pub venue: Option<String>,
    pub temperature: Option<f64>,
    pub dew_point: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub snowfall: Option<f64>,
    pub wind_direction: Option<f64>,
    pub wind_speed: Option<f64>,
    pub pressure: Option<f64>,
    pub weather_condition_code: Option<f64>,
    pub weather_condition: Option<String>,
}

impl Transform for GameWeatherSource {
    type Row = GameWeatherRow;

    fn into_row(self, filter: &Filter) -> Option<GameWeatherRow> {
        Some(GameWeatherRow {
            game_id: self.id?,
            season: self.season.or(filter.year),
            week: self.week,
            season_type: self.season_type,
            start_time: self.start_time,
            game_indoors: self.game_indoors,
            home_team: self.home_team,
            home_conference: self.home_conference,
            away_team: self.away_team,
            away_conference: self.away_conference,
            venue_id: self.venue_id,
            venue: self.venue,
            temperature: self.temperature,
            dew_point: self.dew_point,
            humidity: self.humidity,
            precipitation: self.precipitation,
            snowfall: self.snowfall,
            wind_direction: self.wind_direction,
            wind_speed: self.wind_speed,
            pressure: self.pressure,
            weather_condition_code: self.weather_condition_code,
            weather_condition: self.weather_condition,
        })
    }
}

store_row! {
    pub struct GameMediaRow => "game_media", key(game_id, media_type, outlet), chunk 500;
    {
        game_id: i64 = "BIGINT",
        media_type: String = "TEXT",
        outlet: String = "TEXT",
        season: Option<i32> = "INTEGER",
        week: Option<i32> = "INTEGER",
        season_type: Option<String> = "TEXT",
        start_time: Option<DateTime<Utc>> = "TIMESTAMPTZ",
        is_start_time_tbd: Option<bool> = "BOOLEAN",
        home_team: Option<String> = "TEXT",
        home_conference: Option<String> = "TEXT",
        away_team: Option<String> = "TEXT",
        away_conference: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMediaSource {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub id: Option<i64>,
    pub season: Option<i32>,
    pub week: Option<i32>,
    pub season_type: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    #[serde(rename = "isStartTimeTBD")]
    pub is_start_time_tbd: Option<bool>,
    pub home_team: Option<String>,
    pub home_conference: Option<String>,
    pub away_team: Option<String>,
    pub away_conference: Option<String>,
    pub media_type: Option<String>,
    pub outlet: Option<String>,
}

impl Transform for GameMediaSource {
    type Row = GameMediaRow;

    fn into_row(self, filter: &Filter) -> Option<GameMediaRow> {
        Some(GameMediaRow {
            game_id: self.id?,
            media_type: self.media_type?,
            outlet: self.outlet?,
            season: self.season.or(filter.year),
            week: self.week,
            season_type: self.season_type,
            start_time: self.start_time,
            is_start_time_tbd: self.is_start_time_tbd,
            home_team: self.home_team,
            home_conference: self.home_conference,
            away_team: self.away_team,
            away_conference: self.away_conference,
        })
    }
}

store_row! {
    /// One row per game; the per-provider lines stay as JSON.
    pub struct BettingGameRow => "betting_games", key(game_id), chunk 100;
    {
        game_id: i64 = "BIGINT",
        season: Option<i32> = "INTEGER",
        season_type: Option<String> = "TEXT",
        week: Option<i32> = "INTEGER",
        start_date: Option<DateTime<Utc>> = "TIMESTAMPTZ",
        home_team: Option<String> = "TEXT",
        home_conference: Option<String> = "TEXT",
        home_score: Option<i32> = "INTEGER",
        away_team: Option<String> = "TEXT",
        away_conference: Option<String> = "TEXT",
        away_score: Option<i32> = "INTEGER",
        lines: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BettingGameSource {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub id: Option<i64>,
    pub season: Option<i32>,
    pub season_type: Option<String>,
    pub week: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub home_team: Option<String>,
    pub home_conference: Option<String>,
    pub home_score: Option<i32>,
    pub away_team: Option<String>,
    pub away_conference: Option<String>,
    pub away_score: Option<i32>,
    pub lines: Option<Value>,
}

impl Transform for BettingGameSource {
    type Row = BettingGameRow;

    fn into_row(self, filter: &Filter) -> Option<BettingGameRow> {
        Some(BettingGameRow {
            game_id: self.id?,
            season: self.season.or(filter.year),
            season_type: self.season_type,
            week: self.week,
            start_date: self.start_date,
            home_team: self.home_team,
            home_conference: self.home_conference,
            home_score: self.home_score,
            away_team: self.away_team,
            away_conference: self.away_conference,
            away_score: self.away_score,
            lines: self.lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database_ops::UpsertRow;
    use serde_json::json;

    #[test]
    fn play_takes_period_from_query() {
        let src: PlaySource = serde_json::from_value(json!({
            "id": "401628374101849901",
            "driveId": "4016283741",
            "gameId": 401628374,
            "clock": {"minutes": 14, "seconds": 55},
            "playType": "Rush"
        }))
        .unwrap();
        let row = src.into_row(&Filter::period(2024, 1, "regular")).unwrap();
        assert_eq!(row.drive_id.as_deref(), Some("4016283741"));
        assert_eq!(row.season_type.as_deref(), Some("regular"));
        assert_eq!(row.clock_minutes, Some(14));
        assert_eq!(row.ppa, None);
    }

    #[test]
    fn play_stat_key_needs_all_three_parts() {
        let full = json!({
            "gameId": 401628374.0,
            "playId": "1",
            "athleteId": 4432,
            "statType": "Rush",
            "stat": 7
        });
        let src: PlayStatSource = serde_json::from_value(full).unwrap();
        let row = src.into_row(&Filter::period(2024, 1, "regular")).unwrap();
        assert_eq!(row.key(), "1\u{1f}4432\u{1f}Rush");
        assert_eq!(row.game_id, Some(401628374));
        assert_eq!(row.stat, Some(7.0));

        let partial: PlayStatSource =
            serde_json::from_value(json!({"playId": "1", "statType": "Rush"})).unwrap();
        assert!(partial.into_row(&Filter::none()).is_none());
    }

    #[test]
    fn media_rows_are_keyed_per_outlet() {
        let a: GameMediaSource = serde_json::from_value(
            json!({"id": 1, "mediaType": "tv", "outlet": "ESPN", "isStartTimeTBD": false}),
        )
        .unwrap();
        let b: GameMediaSource =
            serde_json::from_value(json!({"id": 1, "mediaType": "web", "outlet": "ESPN+"})).unwrap();
        let a = a.into_row(&Filter::year(2024)).unwrap();
        let b = b.into_row(&Filter::year(2024)).unwrap();
        assert_ne!(a.key(), b.key());
        assert_eq!(a.is_start_time_tbd, Some(false));
        assert_eq!(b.season, Some(2024));
    }
}
