//! Season calendar and games. Later phases read game ids back from here.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::de;
use crate::database_ops::store_row;
use crate::provider::Filter;
use crate::task::Transform;

store_row! {
    pub struct CalendarWeekRow => "calendar_weeks", key(season, season_type, week), chunk 500;
    {
        season: i32 = "INTEGER",
        season_type: String = "TEXT",
        week: i32 = "INTEGER",
        start_date: Option<DateTime<Utc>> = "TIMESTAMPTZ",
        end_date: Option<DateTime<Utc>> = "TIMESTAMPTZ",
        first_game_start: Option<DateTime<Utc>> = "TIMESTAMPTZ",
        last_game_start: Option<DateTime<Utc>> = "TIMESTAMPTZ",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWeekSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub season: Option<i32>,
    pub week: Option<i32>,
    pub season_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub first_game_start: Option<DateTime<Utc>>,
    pub last_game_start: Option<DateTime<Utc>>,
}

impl Transform for CalendarWeekSource {
    type Row = CalendarWeekRow;

    fn into_row(self, filter: &Filter) -> Option<CalendarWeekRow> {
        Some(CalendarWeekRow {
            season: self.season.or(filter.year)?,
            season_type: self.season_type?,
            week: self.week?,
            start_date: self.start_date,
            end_date: self.end_date,
            first_game_start: self.first_game_start,
            last_game_start: self.last_game_start,
        })
    }
}

store_row! {
    pub struct GameRow => "games", key(id), chunk 200;
    {
        id: i64 = "BIGINT",
        season: Option<i32> = "INTEGER",
        week: Option<i32> = "INTEGER",
        season_type: Option<String> = "TEXT",
        start_date: Option<DateTime<Utc>> = "TIMESTAMPTZ",
        start_time_tbd: Option<bool> = "BOOLEAN",
        completed: Option<bool> = "BOOLEAN",
        neutral_site: Option<bool> = "BOOLEAN",
        conference_game: Option<bool> = "BOOLEAN",
        attendance: Option<i32> = "INTEGER",
        venue_id: Option<i32> = "INTEGER",
        venue: Option<String> = "TEXT",
        home_id: Option<i32> = "INTEGER",
        home_team: Option<String> = "TEXT",
        home_conference: Option<String> = "TEXT",
        home_classification: Option<String> = "TEXT",
        home_points: Option<i32> = "INTEGER",
        home_line_scores: Option<Value> = "JSONB",
        home_postgame_win_probability: Option<f64> = "DOUBLE PRECISION",
        home_pregame_elo: Option<i32> = "INTEGER",
        home_postgame_elo: Option<i32> = "INTEGER",
        away_id: Option<i32> = "INTEGER",
        away_team: Option<String> = "TEXT",
        away_conference: Option<String> = "TEXT",
        away_classification: Option<String> = "TEXT",
        away_points: Option<i32> = "INTEGER",
        away_line_scores: Option<Value> = "JSONB",
        away_postgame_win_probability: Option<f64> = "DOUBLE PRECISION",
        away_pregame_elo: Option<i32> = "INTEGER",
        away_postgame_elo: Option<i32> = "INTEGER",
        excitement_index: Option<f64> = "DOUBLE PRECISION",
        highlights: Option<String> = "TEXT",
        notes: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSource {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub id: Option<i64>,
    pub season: Option<i32>,
    pub week: Option<i32>,
    pub season_type: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    #[serde(rename = "startTimeTBD")]
    pub start_time_tbd: Option<bool>,
    pub completed: Option<bool>,
    pub neutral_site: Option<bool>,
    pub conference_game: Option<bool>,
    pub attendance: Option<i32>,
    pub venue_id: Option<i32>,
    pub venue: Option<String>,
    pub home_id: Option<i32>,
    pub home_team: Option<String>,
    pub home_conference: Option<String>,
    pub home_classification: Option<String>,
    pub home_points: Option<i32>,
    pub home_line_scores: Option<Value>,
    pub home_postgame_win_probability: Option<f64>,
    pub home_pregame_elo: Option<i32>,
    pub home_postgame_elo: Option<i32>,
    pub away_id: Option<i32>,
    pub away_team: Option<String>,
    pub away_conference: Option<String>,
    pub away_classification: Option<String>,
    pub away_points: Option<i32>,
    pub away_line_scores: Option<Value>,
    pub away_postgame_win_probability: Option<f64>,
    pub away_pregame_elo: Option<i32>,
    pub away_postgame_elo: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub excitement_index: Option<f64>,
    pub highlights: Option<String>,
    pub notes: Option<String>,
}

impl Transform for GameSource {
    type Row = GameRow;

    fn into_row(self, filter: &Filter) -> Option<GameRow> {
        Some(GameRow {
            id: self.id?,
            season: self.season.or(filter.year),
            week: self.week,
            season_type: self.season_type,
            start_date: self.start_date,
            start_time_tbd: self.start_time_tbd,
            completed: self.completed,
            neutral_site: self.neutral_site,
            conference_game: self.conference_game,
            attendance: self.attendance,
            venue_id: self.venue_id,
            venue: self.venue,
            home_id: self.home_id,
            home_team: self.home_team,
            home_conference: self.home_conference,
            home_classification: self.home_classification,
            home_points: self.home_points,
            home_line_scores: self.home_line_scores,
            home_postgame_win_probability: self.home_postgame_win_probability,
            home_pregame_elo: self.home_pregame_elo,
            home_postgame_elo: self.home_postgame_elo,
            away_id: self.away_id,
            away_team: self.away_team,
            away_conference: self.away_conference,
            away_classification: self.away_classification,
            away_points: self.away_points,
            away_line_scores: self.away_line_scores,
            away_postgame_win_probability: self.away_postgame_win_probability,
            away_pregame_elo: self.away_pregame_elo,
            away_postgame_elo: self.away_postgame_elo,
            excitement_index: self.excitement_index,
            highlights: self.highlights,
            notes: self.notes,
        })
    }
}
