//! Data only available one game at a time.

use serde::Deserialize;
use serde_json::Value;

use super::de;
use crate::database_ops::store_row;
use crate::provider::Filter;
use crate::task::Transform;

store_row! {
    pub struct PlayWinProbabilityRow => "play_win_probability", key(game_id, play_id), chunk 500;
    {
        game_id: i64 = "BIGINT",
        play_id: String = "TEXT",
        play_text: Option<String> = "TEXT",
        home_id: Option<i32> = "INTEGER",
        home: Option<String> = "TEXT",
        away_id: Option<i32> = "INTEGER",
        away: Option<String> = "TEXT",
        spread: Option<f64> = "DOUBLE PRECISION",
        home_ball: Option<bool> = "BOOLEAN",
        home_score: Option<i32> = "INTEGER",
        away_score: Option<i32> = "INTEGER",
        yard_line: Option<i32> = "INTEGER",
        down: Option<i32> = "INTEGER",
        distance: Option<i32> = "INTEGER",
        home_win_probability: Option<f64> = "DOUBLE PRECISION",
        play_number: Option<i32> = "INTEGER",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayWinProbabilitySource {
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub game_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub play_id: Option<String>,
    pub play_text: Option<String>,
    pub home_id: Option<i32>,
    pub home: Option<String>,
    pub away_id: Option<i32>,
    pub away: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub spread: Option<f64>,
    pub home_ball: Option<bool>,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub yard_line: Option<i32>,
    pub down: Option<i32>,
    pub distance: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub home_win_probability: Option<f64>,
    pub play_number: Option<i32>,
}

impl Transform for PlayWinProbabilitySource {
    type Row = PlayWinProbabilityRow;

    fn into_row(self, filter: &Filter) -> Option<PlayWinProbabilityRow> {
        Some(PlayWinProbabilityRow {
            game_id: self.game_id.or(filter.game_id)?,
            play_id: self.play_id?,
            play_text: self.play_text,
            home_id: self.home_id,
            home: self.home,
            away_id: self.away_id,
            away: self.away,
            spread: self.spread,
            home_ball: self.home_ball,
            home_score: self.home_score,
            away_score: self.away_score,
            yard_line: self.yard_line,
            down: self.down,
            distance: self.distance,
            home_win_probability: self.home_win_probability,
            play_number: self.play_number,
        })
    }
}

store_row! {
    /// The box score comes back as one object per game and is stored whole.
    pub struct AdvancedBoxScoreRow => "advanced_box_scores", key(game_id), chunk 20;
    {
        game_id: i64 = "BIGINT",
        game_info: Option<Value> = "JSONB",
        teams: Option<Value> = "JSONB",
        players: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedBoxScoreSource {
    pub game_info: Option<Value>,
    pub teams: Option<Value>,
    pub players: Option<Value>,
}

impl Transform for AdvancedBoxScoreSource {
    type Row = AdvancedBoxScoreRow;

    fn into_row(self, filter: &Filter) -> Option<AdvancedBoxScoreRow> {
        Some(AdvancedBoxScoreRow {
            game_id: filter.game_id?,
            game_info: self.game_info,
            teams: self.teams,
            players: self.players,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn win_probability_falls_back_to_queried_game() {
        let src: PlayWinProbabilitySource = serde_json::from_value(json!({
            "playId": 401628374101849901u64,
            "homeWinProbability": 0.62,
            "homeBall": true
        }))
        .unwrap();
        let row = src.into_row(&Filter::game(401628374)).unwrap();
        assert_eq!(row.game_id, 401628374);
        assert_eq!(row.play_id, "401628374101849901");
        assert_eq!(row.home_win_probability, Some(0.62));
    }

    #[test]
    fn box_score_is_keyed_by_queried_game() {
        let src: AdvancedBoxScoreSource =
            serde_json::from_value(json!({"gameInfo": {"homeTeam": "Georgia"}, "teams": {}})).unwrap();
        let row = src.into_row(&Filter::game(7)).unwrap();
        assert_eq!(row.game_id, 7);
        assert_eq!(row.players, None);

        let src: AdvancedBoxScoreSource = serde_json::from_value(json!({})).unwrap();
        assert!(src.into_row(&Filter::none()).is_none());
    }
}
