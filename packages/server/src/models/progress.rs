use serde::{Deserialize, Serialize};

use super::shared::{validate_range, validate_text};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RecordProblemCompletionRequest {
    pub scenario_id: i32,
    /// Problem ID within the scenario (e.g. `problem_2`).
    pub problem_id: String,
    /// Points credited for this completion.
    pub score: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RecordScenarioCompletionRequest {
    pub scenario_id: i32,
}

pub fn validate_record_problem_completion(
    req: &RecordProblemCompletionRequest,
) -> Result<(), AppError> {
    validate_text("problem_id", &req.problem_id, 1, 100)?;
    validate_range("score", req.score, 0, 1000)
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProblemProgress {
    pub problem_id: String,
    pub title: String,
    pub score: i32,
    pub order: i32,
    pub completed: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScenarioProgress {
    pub scenario_id: i32,
    pub title: String,
    /// Whether the scenario has been recorded as completed.
    pub completed: bool,
    /// Whether every problem reports completed. The game console records
    /// scenario completion when this flips true after a submission.
    pub all_problems_completed: bool,
    pub problems: Vec<ProblemProgress>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamProgressResponse {
    pub team_id: i32,
    pub event_id: i32,
    pub score: i32,
    pub status: String,
    pub scenarios: Vec<ScenarioProgress>,
}
