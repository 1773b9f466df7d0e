use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single team member. Stored as a JSON array on the team row.
///
/// Exactly one leader per team is enforced at request validation time only;
/// existing rows are not re-checked on later writes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TeamMember {
    pub name: String,
    pub email: String,
    /// One of: leader, member
    pub role: String,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Parent event. No foreign key: referential integrity is the caller's
    /// responsibility, and deleting an event leaves its teams in place.
    pub event_id: i32,

    pub name: String,
    /// JSON array of [`TeamMember`] objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub members: serde_json::Value,
    pub gcp_project_id: Option<String>,

    pub score: i32,
    /// JSON array of completed scenario IDs.
    #[sea_orm(column_type = "JsonBinary")]
    pub completed_scenarios: serde_json::Value,
    /// JSON array of completed-problem keys (`"<scenario_id>-<problem_id>"`,
    /// or the bare problem ID on legacy rows). NULL on rows created before
    /// problem-level tracking; always treated as empty when absent.
    #[sea_orm(column_type = "JsonBinary")]
    pub completed_problems: Option<serde_json::Value>,

    /// One of: registered, active, completed, disqualified.
    /// `disqualified` is reserved; no code path currently sets it.
    pub status: String,

    pub registered_at: DateTimeUtc,
    pub last_activity_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
