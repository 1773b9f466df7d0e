use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Gate controlling when a problem becomes visible to a team.
/// Enforced by the game console, never by progress tracking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ProblemUnlockCondition {
    /// One of: none, time, problem_completion
    #[serde(rename = "type")]
    pub kind: String,
    /// Minutes after the event start, for `time` conditions.
    pub time_minutes: Option<i32>,
    /// Problem IDs that must be completed first, for `problem_completion`.
    pub required_problem_ids: Option<Vec<String>>,
}

/// A gradeable task within a scenario. Stored as a JSON array on the
/// scenario row; IDs are assigned `problem_<index+1>` by array position at
/// create/update time and are NOT stable across reordering.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScenarioProblem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub score: i32,
    /// One of: automatic, manual, command. Descriptive only; this system
    /// never executes grading.
    pub grading_method: String,
    pub grading_command: Option<String>,
    pub order: i32,
    pub unlock_condition: Option<ProblemUnlockCondition>,
}

/// A staged hint. IDs are assigned `hint_<index+1>` by array position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScenarioHint {
    pub id: String,
    pub content: String,
    /// Points deducted when the hint is revealed.
    pub penalty: i32,
    pub unlock_after_minutes: Option<i32>,
}

/// Supporting material shown alongside a scenario.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ScenarioResource {
    /// One of: document, link, code, diagram
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub url: Option<String>,
    pub content: Option<String>,
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scenario")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    pub description: String,
    /// One of: beginner, intermediate, advanced, expert
    pub difficulty: String,
    /// One of: compute, storage, networking, security, database, analytics,
    /// ai-ml, devops, monitoring, other
    pub category: String,

    pub estimated_time_minutes: i32,
    pub max_score: i32,
    pub evaluation_points: i32,

    pub objectives: String,
    /// Comma-separated list of technologies exercised.
    pub technologies: String,
    /// Introduction shown on the game console.
    pub detailed_description: String,
    pub evaluation_criteria: Option<String>,

    /// JSON array of [`ScenarioProblem`] objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub problems: serde_json::Value,
    /// JSON array of [`ScenarioHint`] objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub hints: serde_json::Value,
    /// JSON array of [`ScenarioResource`] objects.
    #[sea_orm(column_type = "JsonBinary")]
    pub resources: serde_json::Value,

    /// One of: draft, published, archived
    pub status: String,
    /// JSON array of tag strings.
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: serde_json::Value,

    pub created_by: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Incremented on every update.
    pub version: i32,

    pub usage_count: i32,
    pub average_score: f64,
    pub average_completion_time: f64,
}

impl ActiveModelBehavior for ActiveModel {}
