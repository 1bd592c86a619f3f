//! Unfiltered reference data.

use serde::Deserialize;
use serde_json::Value;

use super::de;
use crate::database_ops::store_row;
use crate::provider::Filter;
use crate::task::Transform;

store_row! {
    pub struct ConferenceRow => "conferences", key(id), chunk 500;
    {
        id: i32 = "INTEGER",
        name: Option<String> = "TEXT",
        short_name: Option<String> = "TEXT",
        abbreviation: Option<String> = "TEXT",
        classification: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceSource {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub abbreviation: Option<String>,
    pub classification: Option<String>,
}

impl Transform for ConferenceSource {
    type Row = ConferenceRow;

    fn into_row(self, _: &Filter) -> Option<ConferenceRow> {
        Some(ConferenceRow {
            id: self.id?,
            name: self.name,
            short_name: self.short_name,
            abbreviation: self.abbreviation,
            classification: self.classification,
        })
    }
}

store_row! {
    pub struct VenueRow => "venues", key(id), chunk 500;
    {
        id: i32 = "INTEGER",
        name: Option<String> = "TEXT",
        city: Option<String> = "TEXT",
        state: Option<String> = "TEXT",
        zip: Option<String> = "TEXT",
        country_code: Option<String> = "TEXT",
        timezone: Option<String> = "TEXT",
        latitude: Option<f64> = "DOUBLE PRECISION",
        longitude: Option<f64> = "DOUBLE PRECISION",
        elevation: Option<String> = "TEXT",
        capacity: Option<i32> = "INTEGER",
        construction_year: Option<i32> = "INTEGER",
        grass: Option<bool> = "BOOLEAN",
        dome: Option<bool> = "BOOLEAN",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueSource {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub zip: Option<String>,
    pub country_code: Option<String>,
    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_string")]
    pub elevation: Option<String>,
    pub capacity: Option<i32>,
    pub construction_year: Option<i32>,
    pub grass: Option<bool>,
    pub dome: Option<bool>,
}

impl Transform for VenueSource {
    type Row = VenueRow;

    fn into_row(self, _: &Filter) -> Option<VenueRow> {
        Some(VenueRow {
            id: self.id?,
            name: self.name,
            city: self.city,
            state: self.state,
            zip: self.zip,
            country_code: self.country_code,
            timezone: self.timezone,
            latitude: self.latitude,
            longitude: self.longitude,
            elevation: self.elevation,
            capacity: self.capacity,
            construction_year: self.construction_year,
            grass: self.grass,
            dome: self.dome,
        })
    }
}

store_row! {
    pub struct PlayTypeRow => "play_types", key(id), chunk 500;
    {
        id: i32 = "INTEGER",
        text: Option<String> = "TEXT",
        abbreviation: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayTypeSource {
    pub id: Option<i32>,
    pub text: Option<String>,
    pub abbreviation: Option<String>,
}

impl Transform for PlayTypeSource {
    type Row = PlayTypeRow;

    fn into_row(self, _: &Filter) -> Option<PlayTypeRow> {
        Some(PlayTypeRow {
            id: self.id?,
            text: self.text,
            abbreviation: self.abbreviation,
        })
    }
}

store_row! {
    pub struct PlayStatTypeRow => "play_stat_types", key(id), chunk 500;
    {
        id: i32 = "INTEGER",
        name: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
pub struct PlayStatTypeSource {
    pub id: Option<i32>,
    pub name: Option<String>,
}

impl Transform for PlayStatTypeSource {
    type Row = PlayStatTypeRow;

    fn into_row(self, _: &Filter) -> Option<PlayStatTypeRow> {
        Some(PlayStatTypeRow {
            id: self.id?,
            name: self.name,
        })
    }
}

store_row! {
    pub struct DraftTeamRow => "draft_teams", key(location), chunk 500;
    {
        location: String = "TEXT",
        nickname: Option<String> = "TEXT",
        display_name: Option<String> = "TEXT",
        logo: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftTeamSource {
    pub location: Option<String>,
    pub nickname: Option<String>,
    pub display_name: Option<String>,
    pub logo: Option<String>,
}

impl Transform for DraftTeamSource {
    type Row = DraftTeamRow;

    fn into_row(self, _: &Filter) -> Option<DraftTeamRow> {
        Some(DraftTeamRow {
            location: self.location?,
            nickname: self.nickname,
            display_name: self.display_name,
            logo: self.logo,
        })
    }
}

store_row! {
    pub struct DraftPositionRow => "draft_positions", key(name), chunk 500;
    {
        name: String = "TEXT",
        abbreviation: Option<String> = "TEXT",
    }
}

#[derive(Debug, Deserialize)]
pub struct DraftPositionSource {
    pub name: Option<String>,
    pub abbreviation: Option<String>,
}

impl Transform for DraftPositionSource {
    type Row = DraftPositionRow;

    fn into_row(self, _: &Filter) -> Option<DraftPositionRow> {
        Some(DraftPositionRow {
            name: self.name?,
            abbreviation: self.abbreviation,
        })
    }
}

store_row! {
    pub struct FieldGoalEpRow => "field_goal_ep", key(yards_to_goal, distance), chunk 500;
    {
        yards_to_goal: i32 = "INTEGER",
        distance: i32 = "INTEGER",
        expected_points: Option<f64> = "DOUBLE PRECISION",
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGoalEpSource {
    pub yards_to_goal: Option<i32>,
    pub distance: Option<i32>,
    pub expected_points: Option<f64>,
}

impl Transform for FieldGoalEpSource {
    type Row = FieldGoalEpRow;

    fn into_row(self, _: &Filter) -> Option<FieldGoalEpRow> {
        Some(FieldGoalEpRow {
            yards_to_goal: self.yards_to_goal?,
            distance: self.distance?,
            expected_points: self.expected_points,
        })
    }
}

store_row! {
    pub struct TeamRow => "teams", key(id), chunk 200;
    {
        id: i32 = "INTEGER",
        school: Option<String> = "TEXT",
        mascot: Option<String> = "TEXT",
        abbreviation: Option<String> = "TEXT",
        alternate_names: Option<Value> = "JSONB",
        conference: Option<String> = "TEXT",
        division: Option<String> = "TEXT",
        classification: Option<String> = "TEXT",
        color: Option<String> = "TEXT",
        alternate_color: Option<String> = "TEXT",
        logos: Option<Value> = "JSONB",
        twitter: Option<String> = "TEXT",
        venue_id: Option<i32> = "INTEGER",
    }
}

#[derive(Debug, Deserialize)]
pub struct TeamLocation {
    pub id: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamSource {
    pub id: Option<i32>,
    pub school: Option<String>,
    pub mascot: Option<String>,
    pub abbreviation: Option<String>,
    pub alternate_names: Option<Value>,
    pub conference: Option<String>,
    pub division: Option<String>,
    pub classification: Option<String>,
    pub color: Option<String>,
    pub alternate_color: Option<String>,
    pub logos: Option<Value>,
    pub twitter: Option<String>,
    pub location: Option<TeamLocation>,
}

impl Transform for TeamSource {
    type Row = TeamRow;

    fn into_row(self, _: &Filter) -> Option<TeamRow> {
        Some(TeamRow {
            id: self.id?,
            school: self.school,
            mascot: self.mascot,
            abbreviation: self.abbreviation,
            alternate_names: self.alternate_names,
            conference: self.conference,
            division: self.division,
            classification: self.classification,
            color: self.color,
            alternate_color: self.alternate_color,
            logos: self.logos,
            twitter: self.twitter,
            venue_id: self.location.and_then(|l| l.id),
        })
    }
}
