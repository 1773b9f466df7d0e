use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_one_of, validate_range, validate_text};
use crate::entity::scenario::{
    self, ProblemUnlockCondition, ScenarioHint, ScenarioProblem, ScenarioResource,
};
use crate::error::AppError;

pub const DIFFICULTIES: &[&str] = &["beginner", "intermediate", "advanced", "expert"];
pub const CATEGORIES: &[&str] = &[
    "compute",
    "storage",
    "networking",
    "security",
    "database",
    "analytics",
    "ai-ml",
    "devops",
    "monitoring",
    "other",
];
pub const SCENARIO_STATUSES: &[&str] = &["draft", "published", "archived"];
pub const GRADING_METHODS: &[&str] = &["automatic", "manual", "command"];
pub const UNLOCK_CONDITION_KINDS: &[&str] = &["none", "time", "problem_completion"];

/// Problem definition as submitted; IDs are assigned server-side from the
/// array position.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ProblemInput {
    pub title: String,
    pub description: String,
    pub score: i32,
    pub grading_method: String,
    pub grading_command: Option<String>,
    pub order: i32,
    pub unlock_condition: Option<ProblemUnlockCondition>,
}

/// Hint definition as submitted; IDs are assigned server-side.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct HintInput {
    pub content: String,
    pub penalty: i32,
    pub unlock_after_minutes: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateScenarioRequest {
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub category: String,
    pub estimated_time_minutes: i32,
    pub max_score: i32,
    pub evaluation_points: i32,
    pub objectives: String,
    pub technologies: String,
    pub detailed_description: String,
    pub evaluation_criteria: Option<String>,
    pub problems: Vec<ProblemInput>,
    #[serde(default)]
    pub hints: Vec<HintInput>,
    #[serde(default)]
    pub resources: Vec<ScenarioResource>,
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct UpdateScenarioRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub category: Option<String>,
    pub estimated_time_minutes: Option<i32>,
    pub max_score: Option<i32>,
    pub evaluation_points: Option<i32>,
    pub objectives: Option<String>,
    pub technologies: Option<String>,
    pub detailed_description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub evaluation_criteria: Option<Option<String>>,
    /// Replaces the whole problem list; IDs are reassigned by position.
    pub problems: Option<Vec<ProblemInput>>,
    /// Replaces the whole hint list; IDs are reassigned by position.
    pub hints: Option<Vec<HintInput>>,
    pub resources: Option<Vec<ScenarioResource>>,
    pub status: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl UpdateScenarioRequest {
    /// True when no field is present (empty PATCH).
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.difficulty.is_none()
            && self.category.is_none()
            && self.estimated_time_minutes.is_none()
            && self.max_score.is_none()
            && self.evaluation_points.is_none()
            && self.objectives.is_none()
            && self.technologies.is_none()
            && self.detailed_description.is_none()
            && self.evaluation_criteria.is_none()
            && self.problems.is_none()
            && self.hints.is_none()
            && self.resources.is_none()
            && self.status.is_none()
            && self.tags.is_none()
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ScenarioListQuery {
    pub status: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RecordScenarioStatsRequest {
    /// Wall-clock completion time of one run, in minutes.
    pub completion_time_minutes: f64,
    /// Final score of the run.
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct ScenarioResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub difficulty: String,
    pub category: String,
    pub estimated_time_minutes: i32,
    pub max_score: i32,
    pub evaluation_points: i32,
    pub objectives: String,
    pub technologies: String,
    pub detailed_description: String,
    pub evaluation_criteria: Option<String>,
    pub problems: Vec<ScenarioProblem>,
    pub hints: Vec<ScenarioHint>,
    pub resources: Vec<ScenarioResource>,
    pub status: String,
    pub tags: Vec<String>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i32,
    pub usage_count: i32,
    pub average_score: f64,
    pub average_completion_time: f64,
}

impl From<scenario::Model> for ScenarioResponse {
    fn from(m: scenario::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            difficulty: m.difficulty,
            category: m.category,
            estimated_time_minutes: m.estimated_time_minutes,
            max_score: m.max_score,
            evaluation_points: m.evaluation_points,
            objectives: m.objectives,
            technologies: m.technologies,
            detailed_description: m.detailed_description,
            evaluation_criteria: m.evaluation_criteria,
            problems: serde_json::from_value(m.problems).unwrap_or_default(),
            hints: serde_json::from_value(m.hints).unwrap_or_default(),
            resources: serde_json::from_value(m.resources).unwrap_or_default(),
            status: m.status,
            tags: serde_json::from_value(m.tags).unwrap_or_default(),
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
            version: m.version,
            usage_count: m.usage_count,
            average_score: m.average_score,
            average_completion_time: m.average_completion_time,
        }
    }
}

/// Published-scenario counts keyed by category.
#[derive(Serialize, utoipa::ToSchema)]
pub struct CategoryCountsResponse {
    pub counts: BTreeMap<String, u64>,
}

// ---------------------------------------------------------------------------
// ID assignment
// ---------------------------------------------------------------------------

/// Assigns positional IDs (`problem_<index+1>`). IDs are not stable across
/// reorders or edits; completion keys written against an old layout keep
/// matching whatever problem now holds that ID.
pub fn assign_problem_ids(problems: Vec<ProblemInput>) -> Vec<ScenarioProblem> {
    problems
        .into_iter()
        .enumerate()
        .map(|(i, p)| ScenarioProblem {
            id: format!("problem_{}", i + 1),
            title: p.title,
            description: p.description,
            score: p.score,
            grading_method: p.grading_method,
            grading_command: p.grading_command,
            order: p.order,
            unlock_condition: p.unlock_condition,
        })
        .collect()
}

/// Assigns positional IDs (`hint_<index+1>`).
pub fn assign_hint_ids(hints: Vec<HintInput>) -> Vec<ScenarioHint> {
    hints
        .into_iter()
        .enumerate()
        .map(|(i, h)| ScenarioHint {
            id: format!("hint_{}", i + 1),
            content: h.content,
            penalty: h.penalty,
            unlock_after_minutes: h.unlock_after_minutes,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_create_scenario(req: &CreateScenarioRequest) -> Result<(), AppError> {
    validate_text("Title", &req.title, 1, 100)?;
    validate_text("Description", &req.description, 1, 2000)?;
    validate_one_of("difficulty", &req.difficulty, DIFFICULTIES)?;
    validate_one_of("category", &req.category, CATEGORIES)?;
    validate_range("estimated_time_minutes", req.estimated_time_minutes, 5, 480)?;
    validate_range("max_score", req.max_score, 1, 1000)?;
    validate_range("evaluation_points", req.evaluation_points, 1, 1000)?;
    validate_text("Objectives", &req.objectives, 1, 2000)?;
    validate_text("Technologies", &req.technologies, 1, 1000)?;
    validate_text("Detailed description", &req.detailed_description, 1, 5000)?;
    if let Some(ref criteria) = req.evaluation_criteria {
        validate_text("Evaluation criteria", criteria, 0, 2000)?;
    }
    validate_one_of("status", &req.status, SCENARIO_STATUSES)?;
    validate_problems(&req.problems, req.max_score)?;
    validate_hints(&req.hints)?;
    validate_resources(&req.resources)?;
    validate_tags(&req.tags)
}

/// `effective_max_score` is the max score after applying the patch, needed
/// for the problem score sum check when only one of the two fields changes.
pub fn validate_update_scenario(
    req: &UpdateScenarioRequest,
    effective_max_score: i32,
    effective_problem_scores: &[i32],
) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_text("Title", title, 1, 100)?;
    }
    if let Some(ref description) = req.description {
        validate_text("Description", description, 1, 2000)?;
    }
    if let Some(ref difficulty) = req.difficulty {
        validate_one_of("difficulty", difficulty, DIFFICULTIES)?;
    }
    if let Some(ref category) = req.category {
        validate_one_of("category", category, CATEGORIES)?;
    }
    if let Some(minutes) = req.estimated_time_minutes {
        validate_range("estimated_time_minutes", minutes, 5, 480)?;
    }
    if let Some(max_score) = req.max_score {
        validate_range("max_score", max_score, 1, 1000)?;
    }
    if let Some(points) = req.evaluation_points {
        validate_range("evaluation_points", points, 1, 1000)?;
    }
    if let Some(ref objectives) = req.objectives {
        validate_text("Objectives", objectives, 1, 2000)?;
    }
    if let Some(ref technologies) = req.technologies {
        validate_text("Technologies", technologies, 1, 1000)?;
    }
    if let Some(ref detailed) = req.detailed_description {
        validate_text("Detailed description", detailed, 1, 5000)?;
    }
    if let Some(Some(ref criteria)) = req.evaluation_criteria {
        validate_text("Evaluation criteria", criteria, 0, 2000)?;
    }
    if let Some(ref status) = req.status {
        validate_one_of("status", status, SCENARIO_STATUSES)?;
    }
    if let Some(ref problems) = req.problems {
        validate_problems(problems, effective_max_score)?;
    } else {
        // max_score may have shrunk below the existing problem total
        let total: i64 = effective_problem_scores.iter().map(|&s| s as i64).sum();
        if total > effective_max_score as i64 {
            return Err(AppError::Validation(
                "Problem scores sum exceeds max_score".into(),
            ));
        }
    }
    if let Some(ref hints) = req.hints {
        validate_hints(hints)?;
    }
    if let Some(ref resources) = req.resources {
        validate_resources(resources)?;
    }
    if let Some(ref tags) = req.tags {
        validate_tags(tags)?;
    }
    Ok(())
}

pub fn validate_scenario_list_query(query: &ScenarioListQuery) -> Result<(), AppError> {
    if let Some(ref status) = query.status {
        validate_one_of("status", status, SCENARIO_STATUSES)?;
    }
    if let Some(ref category) = query.category {
        validate_one_of("category", category, CATEGORIES)?;
    }
    if let Some(ref difficulty) = query.difficulty {
        validate_one_of("difficulty", difficulty, DIFFICULTIES)?;
    }
    Ok(())
}

pub fn validate_record_stats(req: &RecordScenarioStatsRequest) -> Result<(), AppError> {
    if !req.completion_time_minutes.is_finite() || req.completion_time_minutes < 0.0 {
        return Err(AppError::Validation(
            "completion_time_minutes must be a non-negative number".into(),
        ));
    }
    if !req.score.is_finite() || req.score < 0.0 {
        return Err(AppError::Validation(
            "score must be a non-negative number".into(),
        ));
    }
    Ok(())
}

fn validate_problems(problems: &[ProblemInput], max_score: i32) -> Result<(), AppError> {
    if problems.is_empty() || problems.len() > 20 {
        return Err(AppError::Validation(
            "Scenarios must have between 1 and 20 problems".into(),
        ));
    }
    let mut total: i64 = 0;
    for problem in problems {
        validate_text("Problem title", &problem.title, 1, 200)?;
        validate_text("Problem description", &problem.description, 1, 3000)?;
        validate_range("problem score", problem.score, 1, 1000)?;
        validate_one_of("grading_method", &problem.grading_method, GRADING_METHODS)?;
        if let Some(ref command) = problem.grading_command {
            validate_text("grading_command", command, 0, 500)?;
        }
        if problem.order < 1 {
            return Err(AppError::Validation("Problem order must be >= 1".into()));
        }
        if let Some(ref condition) = problem.unlock_condition {
            validate_unlock_condition(condition)?;
        }
        total += problem.score as i64;
    }
    if total > max_score as i64 {
        return Err(AppError::Validation(
            "Problem scores sum exceeds max_score".into(),
        ));
    }
    Ok(())
}

fn validate_unlock_condition(condition: &ProblemUnlockCondition) -> Result<(), AppError> {
    validate_one_of("unlock_condition.type", &condition.kind, UNLOCK_CONDITION_KINDS)?;
    match condition.kind.as_str() {
        "time" => {
            let minutes = condition.time_minutes.ok_or_else(|| {
                AppError::Validation("time unlock conditions require time_minutes".into())
            })?;
            validate_range("time_minutes", minutes, 0, 480)?;
        }
        "problem_completion" => {
            let ids = condition.required_problem_ids.as_deref().unwrap_or(&[]);
            if ids.is_empty() {
                return Err(AppError::Validation(
                    "problem_completion unlock conditions require required_problem_ids".into(),
                ));
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_hints(hints: &[HintInput]) -> Result<(), AppError> {
    if hints.len() > 10 {
        return Err(AppError::Validation("At most 10 hints are allowed".into()));
    }
    for hint in hints {
        validate_text("Hint content", &hint.content, 1, 1000)?;
        validate_range("hint penalty", hint.penalty, 0, 50)?;
        if let Some(minutes) = hint.unlock_after_minutes {
            validate_range("unlock_after_minutes", minutes, 0, 240)?;
        }
    }
    Ok(())
}

fn validate_resources(resources: &[ScenarioResource]) -> Result<(), AppError> {
    if resources.len() > 20 {
        return Err(AppError::Validation(
            "At most 20 resources are allowed".into(),
        ));
    }
    for resource in resources {
        validate_one_of(
            "resource type",
            &resource.kind,
            &["document", "link", "code", "diagram"],
        )?;
        validate_text("Resource title", &resource.title, 1, 100)?;
        if let Some(ref content) = resource.content {
            validate_text("Resource content", content, 0, 5000)?;
        }
        let has_url = resource.url.as_deref().is_some_and(|u| !u.trim().is_empty());
        let has_content = resource
            .content
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_url && !has_content {
            return Err(AppError::Validation(
                "Resources need a url or inline content".into(),
            ));
        }
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), AppError> {
    if tags.len() > 10 {
        return Err(AppError::Validation("At most 10 tags are allowed".into()));
    }
    if tags.iter().any(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Tags must not be empty".into()));
    }
    Ok(())
}
