use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-event feature toggles. Stored as a JSON object on the event row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct EventSettings {
    pub allow_late_registration: bool,
    pub auto_start_scoring: bool,
    pub show_leaderboard: bool,
    pub notification_enabled: bool,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    pub description: Option<String>,
    /// One of: draft, published, active, completed, cancelled
    pub status: String,

    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub duration: i32, // in minutes

    pub max_teams: i32,
    pub current_team_count: i32,
    pub registration_deadline: Option<DateTimeUtc>,

    /// IDs of the scenarios played in this event, as a JSON array.
    /// Scenarios are stored independently; a listed ID may no longer exist.
    #[sea_orm(column_type = "JsonBinary")]
    pub scenarios: serde_json::Value,
    /// One of: time, points, hybrid
    pub scoring_type: String,
    /// JSON object matching [`EventSettings`].
    #[sea_orm(column_type = "JsonBinary")]
    pub settings: serde_json::Value,

    pub created_by: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
