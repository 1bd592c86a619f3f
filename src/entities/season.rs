//! Season-level team and player data, fetched once per year.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::de;
use crate::database_ops::store_row;
use crate::provider::Filter;
use crate::task::Transform;

store_row! {
    /// Win/loss splits stay as JSON objects.
    pub struct TeamRecordRow => "team_records", key(year, team), chunk 200;
    {
        year: i32 = "INTEGER",
        team: String = "TEXT",
        team_id: Option<i32> = "INTEGER",
        classification: Option<String> = "TEXT",
        conference: Option<String> = "TEXT",
        division: Option<String> = "TEXT",
        expected_wins: Option<f64> = "DOUBLE PRECISION",
        total: Option<Value> = "JSONB",
        conference_games: Option<Value> = "JSONB",
        home_games: Option<Value> = "JSONB",
        away_games: Option<Value> = "JSONB",
        neutral_site_games: Option<Value> = "JSONB",
        regular_season: Option<Value> = "JSONB",
        postseason: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecordSource {
    pub year: Option<i32>,
    pub team: Option<String>,
    pub team_id: Option<i32>,
    pub classification: Option<String>,
    pub conference: Option<String>,
    pub division: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub expected_wins: Option<f64>,
    pub total: Option<Value>,
    pub conference_games: Option<Value>,
    pub home_games: Option<Value>,
    pub away_games: Option<Value>,
    pub neutral_site_games: Option<Value>,
    pub regular_season: Option<Value>,
    pub postseason: Option<Value>,
}

impl Transform for TeamRecordSource {
    type Row = TeamRecordRow;

    fn into_row(self, filter: &Filter) -> Option<TeamRecordRow> {
        Some(TeamRecordRow {
            year: self.year.or(filter.year)?,
            team: self.team?,
            team_id: self.team_id,
            classification: self.classification,
            conference: self.conference,
            division: self.division,
            expected_wins: self.expected_wins,
            total: self.total,
            conference_games: self.conference_games,
            home_games: self.home_games,
            away_games: self.away_games,
            neutral_site_games: self.neutral_site_games,
            regular_season: self.regular_season,
            postseason: self.postseason,
        })
    }
}

store_row! {
    pub struct TeamTalentRow => "team_talent", key(year, team), chunk 500;
    {
        year: i32 = "INTEGER",
        team: String = "TEXT",
        talent: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamTalentSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub year: Option<i32>,
    pub team: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub talent: Option<f64>,
}

impl Transform for TeamTalentSource {
    type Row = TeamTalentRow;

    fn into_row(self, filter: &Filter) -> Option<TeamTalentRow> {
        Some(TeamTalentRow {
            year: self.year.or(filter.year)?,
            team: self.team?,
            talent: self.talent,
        })
    }
}

store_row! {
    pub struct TeamAtsRow => "team_ats", key(year, team_id), chunk 500;
    {
        year: i32 = "INTEGER",
        team_id: i32 = "INTEGER",
        team: Option<String> = "TEXT",
        conference: Option<String> = "TEXT",
        games: Option<i32> = "INTEGER",
        ats_wins: Option<i32> = "INTEGER",
        ats_losses: Option<i32> = "INTEGER",
        ats_pushes: Option<i32> = "INTEGER",
        avg_cover_margin: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAtsSource {
    pub year: Option<i32>,
    pub team_id: Option<i32>,
    pub team: Option<String>,
    pub conference: Option<String>,
    pub games: Option<i32>,
    pub ats_wins: Option<i32>,
    pub ats_losses: Option<i32>,
    pub ats_pushes: Option<i32>,
    pub avg_cover_margin: Option<f64>,
}

impl Transform for TeamAtsSource {
    type Row = TeamAtsRow;

    fn into_row(self, filter: &Filter) -> Option<TeamAtsRow> {
        Some(TeamAtsRow {
            year: self.year.or(filter.year)?,
            team_id: self.team_id?,
            team: self.team,
            conference: self.conference,
            games: self.games,
            ats_wins: self.ats_wins,
            ats_losses: self.ats_losses,
            ats_pushes: self.ats_pushes,
            avg_cover_margin: self.avg_cover_margin,
        })
    }
}

store_row! {
    pub struct TeamSpRow => "team_sp", key(year, team), chunk 200;
    {
        year: i32 = "INTEGER",
        team: String = "TEXT",
        conference: Option<String> = "TEXT",
        rating: Option<f64> = "DOUBLE PRECISION",
        ranking: Option<i32> = "INTEGER",
        second_order_wins: Option<f64> = "DOUBLE PRECISION",
        sos: Option<f64> = "DOUBLE PRECISION",
        offense: Option<Value> = "JSONB",
        defense: Option<Value> = "JSONB",
        special_teams: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSpSource {
    pub year: Option<i32>,
    pub team: Option<String>,
    pub conference: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rating: Option<f64>,
    pub ranking: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub second_order_wins: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub sos: Option<f64>,
    pub offense: Option<Value>,
    pub defense: Option<Value>,
    pub special_teams: Option<Value>,
}

impl Transform for TeamSpSource {
    type Row = TeamSpRow;

    fn into_row(self, filter: &Filter) -> Option<TeamSpRow> {
        Some(TeamSpRow {
            year: self.year.or(filter.year)?,
            team: self.team?,
            conference: self.conference,
            rating: self.rating,
            ranking: self.ranking,
            second_order_wins: self.second_order_wins,
            sos: self.sos,
            offense: self.offense,
            defense: self.defense,
            special_teams: self.special_teams,
        })
    }
}

store_row! {
    pub struct TeamSrsRow => "team_srs", key(year, team), chunk 500;
    {
        year: i32 = "INTEGER",
        team: String = "TEXT",
        conference: Option<String> = "TEXT",
        division: Option<String> = "TEXT",
        rating: Option<f64> = "DOUBLE PRECISION",
        ranking: Option<i32> = "INTEGER",
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamSrsSource {
    pub year: Option<i32>,
    pub team: Option<String>,
    pub conference: Option<String>,
    pub division: Option<String>,
    pub rating: Option<f64>,
    pub ranking: Option<i32>,
}

impl Transform for TeamSrsSource {
    type Row = TeamSrsRow;

    fn into_row(self, filter: &Filter) -> Option<TeamSrsRow> {
        Some(TeamSrsRow {
            year: self.year.or(filter.year)?,
            team: self.team?,
            conference: self.conference,
            division: self.division,
            rating: self.rating,
            ranking: self.ranking,
        })
    }
}

store_row! {
    pub struct TeamEloRow => "team_elo", key(year, team), chunk 500;
    {
        year: i32 = "INTEGER",
        team: String = "TEXT",
        conference: Option<String> = "TEXT",
        elo: Option<i32> = "INTEGER",
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamEloSource {
    pub year: Option<i32>,
    pub team: Option<String>,
    pub conference: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub elo: Option<i32>,
}

impl Transform for TeamEloSource {
    type Row = TeamEloRow;

    fn into_row(self, filter: &Filter) -> Option<TeamEloRow> {
        Some(TeamEloRow {
            year: self.year.or(filter.year)?,
            team: self.team?,
            conference: self.conference,
            elo: self.elo,
        })
    }
}

store_row! {
    pub struct TeamFpiRow => "team_fpi", key(year, team), chunk 200;
    {
        year: i32 = "INTEGER",
        team: String = "TEXT",
        conference: Option<String> = "TEXT",
        fpi: Option<f64> = "DOUBLE PRECISION",
        resume_ranks: Option<Value> = "JSONB",
        efficiencies: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamFpiSource {
    pub year: Option<i32>,
    pub team: Option<String>,
    pub conference: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub fpi: Option<f64>,
    pub resume_ranks: Option<Value>,
    pub efficiencies: Option<Value>,
}

impl Transform for TeamFpiSource {
    type Row = TeamFpiRow;

    fn into_row(self, filter: &Filter) -> Option<TeamFpiRow> {
        Some(TeamFpiRow {
            year: self.year.or(filter.year)?,
            team: self.team?,
            conference: self.conference,
            fpi: self.fpi,
            resume_ranks: self.resume_ranks,
            efficiencies: self.efficiencies,
        })
    }
}

store_row! {
    /// One row per poll week; the polls and their ranks stay as JSON.
    pub struct PollWeekRow => "poll_weeks", key(season, season_type, week), chunk 100;
    {
        season: i32 = "INTEGER",
        season_type: String = "TEXT",
        week: i32 = "INTEGER",
        polls: Option<Value> = "JSONB",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollWeekSource {
    pub season: Option<i32>,
    pub season_type: Option<String>,
    pub week: Option<i32>,
    pub polls: Option<Value>,
}

impl Transform for PollWeekSource {
    type Row = PollWeekRow;

    fn into_row(self, filter: &Filter) -> Option<PollWeekRow> {
        Some(PollWeekRow {
            season: self.season.or(filter.year)?,
            season_type: self.season_type?,
            week: self.week?,
            polls: self.polls,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hometown {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub fips_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub longitude: Option<f64>,
}

store_row! {
    pub struct RecruitRow => "recruits", key(id), chunk 500;
    {
        id: String = "TEXT",
        athlete_id: Option<String> = "TEXT",
        recruit_type: Option<String> = "TEXT",
        year: Option<i32> = "INTEGER",
        ranking: Option<i32> = "INTEGER",
        name: Option<String> = "TEXT",
        school: Option<String> = "TEXT",
        committed_to: Option<String> = "TEXT",
        position: Option<String> = "TEXT",
        height: Option<f64> = "DOUBLE PRECISION",
        weight: Option<i32> = "INTEGER",
        stars: Option<i32> = "INTEGER",
        rating: Option<f64> = "DOUBLE PRECISION",
        city: Option<String> = "TEXT",
        state_province: Option<String> = "TEXT",
        country: Option<String> = "TEXT",
        hometown_fips_code: Option<String> = "TEXT",
        hometown_latitude: Option<f64> = "DOUBLE PRECISION",
        hometown_longitude: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecruitSource {
    #[serde(default, deserialize_with = "de::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub athlete_id: Option<String>,
    pub recruit_type: Option<String>,
    pub year: Option<i32>,
    pub ranking: Option<i32>,
    pub name: Option<String>,
    pub school: Option<String>,
    pub committed_to: Option<String>,
    pub position: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub weight: Option<i32>,
    pub stars: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rating: Option<f64>,
    pub city: Option<String>,
    pub state_province: Option<String>,
    pub country: Option<String>,
    pub hometown_info: Option<Hometown>,
}

impl Transform for RecruitSource {
    type Row = RecruitRow;

    fn into_row(self, filter: &Filter) -> Option<RecruitRow> {
        let home = self.hometown_info.unwrap_or_default();
        Some(RecruitRow {
            id: self.id?,
            athlete_id: self.athlete_id,
            recruit_type: self.recruit_type,
            year: self.year.or(filter.year),
            ranking: self.ranking,
            name: self.name,
            school: self.school,
            committed_to: self.committed_to,
            position: self.position,
            height: self.height,
            weight: self.weight,
            stars: self.stars,
            rating: self.rating,
            city: self.city,
            state_province: self.state_province,
            country: self.country,
            hometown_fips_code: home.fips_code,
            hometown_latitude: home.latitude,
            hometown_longitude: home.longitude,
        })
    }
}

store_row! {
    pub struct DraftPickRow => "draft_picks", key(year, overall), chunk 500;
    {
        year: i32 = "INTEGER",
        overall: i32 = "INTEGER",
        round: Option<i32> = "INTEGER",
        pick: Option<i32> = "INTEGER",
        college_athlete_id: Option<i64> = "BIGINT",
        nfl_athlete_id: Option<i64> = "BIGINT",
        college_id: Option<i32> = "INTEGER",
        college_team: Option<String> = "TEXT",
        college_conference: Option<String> = "TEXT",
        nfl_team_id: Option<i32> = "INTEGER",
        nfl_team: Option<String> = "TEXT",
        name: Option<String> = "TEXT",
        position: Option<String> = "TEXT",
        height: Option<f64> = "DOUBLE PRECISION",
        weight: Option<i32> = "INTEGER",
        pre_draft_ranking: Option<i32> = "INTEGER",
        pre_draft_position_ranking: Option<i32> = "INTEGER",
        pre_draft_grade: Option<i32> = "INTEGER",
        hometown_fips_code: Option<String> = "TEXT",
        hometown_latitude: Option<f64> = "DOUBLE PRECISION",
        hometown_longitude: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPickSource {
    pub year: Option<i32>,
    pub overall: Option<i32>,
    pub round: Option<i32>,
    pub pick: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub college_athlete_id: Option<i64>,
    #[serde(default, deserialize_with = "de::opt_i64")]
    pub nfl_athlete_id: Option<i64>,
    pub college_id: Option<i32>,
    pub college_team: Option<String>,
    pub college_conference: Option<String>,
    pub nfl_team_id: Option<i32>,
    pub nfl_team: Option<String>,
    pub name: Option<String>,
    pub position: Option<String>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub weight: Option<i32>,
    pub pre_draft_ranking: Option<i32>,
    pub pre_draft_position_ranking: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub pre_draft_grade: Option<i32>,
    pub hometown_info: Option<Hometown>,
}

impl Transform for DraftPickSource {
    type Row = DraftPickRow;

    fn into_row(self, filter: &Filter) -> Option<DraftPickRow> {
        let home = self.hometown_info.unwrap_or_default();
        Some(DraftPickRow {
            year: self.year.or(filter.year)?,
            overall: self.overall?,
            round: self.round,
            pick: self.pick,
            college_athlete_id: self.college_athlete_id,
            nfl_athlete_id: self.nfl_athlete_id,
            college_id: self.college_id,
            college_team: self.college_team,
            college_conference: self.college_conference,
            nfl_team_id: self.nfl_team_id,
            nfl_team: self.nfl_team,
            name: self.name,
            position: self.position,
            height: self.height,
            weight: self.weight,
            pre_draft_ranking: self.pre_draft_ranking,
            pre_draft_position_ranking: self.pre_draft_position_ranking,
            pre_draft_grade: self.pre_draft_grade,
            hometown_fips_code: home.fips_code,
            hometown_latitude: home.latitude,
            hometown_longitude: home.longitude,
        })
    }
}

store_row! {
    pub struct ReturningProductionRow => "returning_production", key(season, team), chunk 500;
    {
        season: i32 = "INTEGER",
        team: String = "TEXT",
        conference: Option<String> = "TEXT",
        total_ppa: Option<f64> = "DOUBLE PRECISION",
        total_passing_ppa: Option<f64> = "DOUBLE PRECISION",
        total_receiving_ppa: Option<f64> = "DOUBLE PRECISION",
        total_rushing_ppa: Option<f64> = "DOUBLE PRECISION",
        percent_ppa: Option<f64> = "DOUBLE PRECISION",
        percent_passing_ppa: Option<f64> = "DOUBLE PRECISION",
        percent_receiving_ppa: Option<f64> = "DOUBLE PRECISION",
        percent_rushing_ppa: Option<f64> = "DOUBLE PRECISION",
        usage: Option<f64> = "DOUBLE PRECISION",
        passing_usage: Option<f64> = "DOUBLE PRECISION",
        receiving_usage: Option<f64> = "DOUBLE PRECISION",
        rushing_usage: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturningProductionSource {
    pub season: Option<i32>,
    pub team: Option<String>,
    pub conference: Option<String>,
    #[serde(rename = "totalPPA")]
    pub total_ppa: Option<f64>,
    #[serde(rename = "totalPassingPPA")]
    pub total_passing_ppa: Option<f64>,
    #[serde(rename = "totalReceivingPPA")]
    pub total_receiving_ppa: Option<f64>,
    #[serde(rename = "totalRushingPPA")]
    pub total_rushing_ppa: Option<f64>,
    #[serde(rename = "percentPPA")]
    pub percent_ppa: Option<f64>,
    #[serde(rename = "percentPassingPPA")]
    pub percent_passing_ppa: Option<f64>,
    #[serde(rename = "percentReceivingPPA")]
    pub percent_receiving_ppa: Option<f64>,
    #[serde(rename = "percentRushingPPA")]
    pub percent_rushing_ppa: Option<f64>,
    pub usage: Option<f64>,
    pub passing_usage: Option<f64>,
    pub receiving_usage: Option<f64>,
    pub rushing_usage: Option<f64>,
}

impl Transform for ReturningProductionSource {
    type Row = ReturningProductionRow;

    fn into_row(self, filter: &Filter) -> Option<ReturningProductionRow> {
        Some(ReturningProductionRow {
            season: self.season.or(filter.year)?,
            team: self.team?,
            conference: self.conference,
            total_ppa: self.total_ppa,
            total_passing_ppa: self.total_passing_ppa,
            total_receiving_ppa: self.total_receiving_ppa,
            total_rushing_ppa: self.total_rushing_ppa,
            percent_ppa: self.percent_ppa,
            percent_passing_ppa: self.percent_passing_ppa,
            percent_receiving_ppa: self.percent_receiving_ppa,
            percent_rushing_ppa: self.percent_rushing_ppa,
            usage: self.usage,
            passing_usage: self.passing_usage,
            receiving_usage: self.receiving_usage,
            rushing_usage: self.rushing_usage,
        })
    }
}

store_row! {
    /// Portal entries carry no upstream id; a player is identified by name
    /// and origin school within a season.
    pub struct PlayerTransferRow => "player_transfers", key(season, first_name, last_name, origin), chunk 500;
    {
        season: i32 = "INTEGER",
        first_name: String = "TEXT",
        last_name: String = "TEXT",
        origin: String = "TEXT",
        position: Option<String> = "TEXT",
        destination: Option<String> = "TEXT",
        transfer_date: Option<DateTime<Utc>> = "TIMESTAMPTZ",
        rating: Option<f64> = "DOUBLE PRECISION",
        stars: Option<i32> = "INTEGER",
        eligibility: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTransferSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub season: Option<i32>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub origin: Option<String>,
    pub position: Option<String>,
    pub destination: Option<String>,
    pub transfer_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub stars: Option<i32>,
    pub eligibility: Option<String>,
}

impl Transform for PlayerTransferSource {
    type Row = PlayerTransferRow;

    fn into_row(self, filter: &Filter) -> Option<PlayerTransferRow> {
        Some(PlayerTransferRow {
            season: self.season.or(filter.year)?,
            first_name: self.first_name?,
            last_name: self.last_name?,
            origin: self.origin?,
            position: self.position,
            destination: self.destination,
            transfer_date: self.transfer_date,
            rating: self.rating,
            stars: self.stars,
            eligibility: self.eligibility,
        })
    }
}

store_row! {
    pub struct TeamRecruitingRankRow => "team_recruiting_rankings", key(year, team), chunk 500;
    {
        year: i32 = "INTEGER",
        team: String = "TEXT",
        rank: Option<i32> = "INTEGER",
        points: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamRecruitingRankSource {
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub year: Option<i32>,
    pub team: Option<String>,
    #[serde(default, deserialize_with = "de::opt_i32")]
    pub rank: Option<i32>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    pub points: Option<f64>,
}

impl Transform for TeamRecruitingRankSource {
    type Row = TeamRecruitingRankRow;

    fn into_row(self, filter: &Filter) -> Option<TeamRecruitingRankRow> {
        Some(TeamRecruitingRankRow {
            year: self.year.or(filter.year)?,
            team: self.team?,
            rank: self.rank,
            points: self.points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn talent_accepts_string_scores() {
        let src: TeamTalentSource =
            serde_json::from_value(json!({"year": 2024, "team": "Georgia", "talent": "1012.45"})).unwrap();
        let row = src.into_row(&Filter::year(2024)).unwrap();
        assert_eq!(row.talent, Some(1012.45));
    }

    #[test]
    fn returning_production_reads_upper_case_ppa_fields() {
        let src: ReturningProductionSource = serde_json::from_value(json!({
            "season": 2024,
            "team": "Ohio State",
            "totalPPA": 512.3,
            "percentPassingPPA": 0.61,
            "rushingUsage": 0.4
        }))
        .unwrap();
        let row = src.into_row(&Filter::year(2024)).unwrap();
        assert_eq!(row.total_ppa, Some(512.3));
        assert_eq!(row.percent_passing_ppa, Some(0.61));
        assert_eq!(row.rushing_usage, Some(0.4));
        assert_eq!(row.usage, None);
    }

    #[test]
    fn recruit_flattens_hometown() {
        let src: RecruitSource = serde_json::from_value(json!({
            "id": 91234,
            "athleteId": "4870001",
            "name": "A. Player",
            "hometownInfo": {"fipsCode": "13121", "latitude": 33.7, "longitude": -84.4}
        }))
        .unwrap();
        let row = src.into_row(&Filter::year(2025)).unwrap();
        assert_eq!(row.id, "91234");
        assert_eq!(row.year, Some(2025));
        assert_eq!(row.hometown_fips_code.as_deref(), Some("13121"));
        assert_eq!(row.hometown_longitude, Some(-84.4));
    }

    #[test]
    fn records_without_a_team_are_dropped() {
        let src: TeamSrsSource = serde_json::from_value(json!({"year": 2024, "rating": 3.2})).unwrap();
        assert!(src.into_row(&Filter::year(2024)).is_none());
    }

    #[test]
    fn transfer_is_keyed_by_name_and_origin() {
        let src: PlayerTransferSource = serde_json::from_value(json!({
            "season": 2025,
            "firstName": "Sam",
            "lastName": "Runner",
            "position": "RB",
            "origin": "Colorado State",
            "destination": null,
            "transferDate": "2024-12-09T00:00:00.000Z",
            "rating": "0.87",
            "stars": 3,
            "eligibility": "Immediate"
        }))
        .unwrap();
        let row = src.into_row(&Filter::year(2025)).unwrap();
        assert_eq!(row.origin, "Colorado State");
        assert_eq!(row.destination, None);
        assert_eq!(row.rating, Some(0.87));
        assert_eq!(
            row.transfer_date.map(|d| d.to_rfc3339()),
            Some("2024-12-09T00:00:00+00:00".to_string())
        );

        let src: PlayerTransferSource =
            serde_json::from_value(json!({"season": 2025, "firstName": "No", "lastName": "Origin"})).unwrap();
        assert!(src.into_row(&Filter::year(2025)).is_none());
    }

    #[test]
    fn team_recruiting_rank_takes_year_from_query() {
        let src: TeamRecruitingRankSource =
            serde_json::from_value(json!({"rank": 1, "team": "Georgia", "points": "328.5"})).unwrap();
        let row = src.into_row(&Filter::year(2024)).unwrap();
        assert_eq!(row.year, 2024);
        assert_eq!(row.rank, Some(1));
        assert_eq!(row.points, Some(328.5));
    }
}
