use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::scenario::{self, ScenarioProblem};
use crate::entity::{event, team};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::progress::*;
use crate::models::team::TeamResponse;
use crate::state::AppState;
use crate::utils::progress;

use super::team::{find_team, find_team_for_update};

#[utoipa::path(
    post,
    path = "/{id}/progress/problems",
    tag = "Progress",
    operation_id = "recordProblemCompletion",
    summary = "Record a problem completion for a team",
    description = "Appends the scoped completion key `<scenario_id>-<problem_id>` and adds \
                   `score` to the team's cumulative score. Idempotent on the scoped key: \
                   repeating the call changes nothing. Requires `progress:record` permission.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = RecordProblemCompletionRequest,
    responses(
        (status = 200, description = "Updated team (unchanged when already completed)", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(
    skip(state, auth_user, payload),
    fields(team_id, scenario_id = payload.scenario_id, problem_id = %payload.problem_id)
)]
pub async fn record_problem_completion(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
    AppJson(payload): AppJson<RecordProblemCompletionRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("progress:record")?;
    validate_record_problem_completion(&payload)?;

    let txn = state.db.begin().await?;
    let team_model = find_team_for_update(&txn, team_id).await?;

    let key = progress::problem_key(payload.scenario_id, &payload.problem_id);
    let mut completed = progress::completed_problem_keys(&team_model);

    // Idempotence is keyed on the scoped form only. A legacy bare-ID entry
    // satisfies completion reads but does not suppress this write.
    if completed.iter().any(|k| *k == key) {
        return Ok(Json(team_model.into()));
    }

    completed.push(key);
    let new_score = team_model.score + payload.score;

    let mut active: team::ActiveModel = team_model.into();
    active.completed_problems = Set(Some(serde_json::json!(completed)));
    active.score = Set(new_score);
    active.last_activity_at = Set(Some(chrono::Utc::now()));

    let model = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(team_id, score = payload.score, "Recorded problem completion");

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/{id}/progress/scenarios",
    tag = "Progress",
    operation_id = "recordScenarioCompletion",
    summary = "Record a scenario completion for a team",
    description = "Appends the scenario to the team's completed set; repeat calls are no-ops. \
                   Whether every problem of the scenario is actually complete is the caller's \
                   check (the game console performs it right after a successful problem \
                   completion). Requires `progress:record` permission.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = RecordScenarioCompletionRequest,
    responses(
        (status = 200, description = "Updated team (unchanged when already completed)", body = TeamResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(team_id, scenario_id = payload.scenario_id))]
pub async fn record_scenario_completion(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
    AppJson(payload): AppJson<RecordScenarioCompletionRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("progress:record")?;

    let txn = state.db.begin().await?;
    let team_model = find_team_for_update(&txn, team_id).await?;

    let mut completed = progress::completed_scenario_ids(&team_model);
    if completed.contains(&payload.scenario_id) {
        return Ok(Json(team_model.into()));
    }

    completed.push(payload.scenario_id);

    let mut active: team::ActiveModel = team_model.into();
    active.completed_scenarios = Set(serde_json::json!(completed));
    active.last_activity_at = Set(Some(chrono::Utc::now()));

    let model = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(team_id, scenario_id = payload.scenario_id, "Recorded scenario completion");

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/progress",
    tag = "Progress",
    operation_id = "getTeamProgress",
    summary = "Per-problem completion state for a team",
    description = "Resolves the team's event and its scenarios, reporting completion per \
                   problem (legacy bare-ID entries count) plus an `all_problems_completed` \
                   roll-up per scenario. Scenario IDs that no longer resolve are omitted.",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Progress view", body = TeamProgressResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Team or parent event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(team_id))]
pub async fn get_team_progress(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
) -> Result<Json<TeamProgressResponse>, AppError> {
    let team_model = find_team(&state.db, team_id).await?;

    let event_model = event::Entity::find_by_id(team_model.event_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

    let scenario_ids: Vec<i32> = serde_json::from_value(event_model.scenarios).unwrap_or_default();
    let scenario_models = scenario::Entity::find()
        .filter(scenario::Column::Id.is_in(scenario_ids.clone()))
        .all(&state.db)
        .await?;
    let by_id: HashMap<i32, scenario::Model> =
        scenario_models.into_iter().map(|s| (s.id, s)).collect();

    let completed_scenarios = progress::completed_scenario_ids(&team_model);

    // Event ordering is preserved; deleted scenarios drop out.
    let scenarios: Vec<ScenarioProgress> = scenario_ids
        .iter()
        .filter_map(|sid| by_id.get(sid))
        .map(|s| {
            let problems: Vec<ScenarioProblem> =
                serde_json::from_value(s.problems.clone()).unwrap_or_default();
            let problems: Vec<ProblemProgress> = problems
                .into_iter()
                .map(|p| ProblemProgress {
                    completed: progress::is_problem_completed(&team_model, s.id, &p.id),
                    problem_id: p.id,
                    title: p.title,
                    score: p.score,
                    order: p.order,
                })
                .collect();
            let all_problems_completed =
                !problems.is_empty() && problems.iter().all(|p| p.completed);
            ScenarioProgress {
                scenario_id: s.id,
                title: s.title.clone(),
                completed: completed_scenarios.contains(&s.id),
                all_problems_completed,
                problems,
            }
        })
        .collect();

    Ok(Json(TeamProgressResponse {
        team_id: team_model.id,
        event_id: team_model.event_id,
        score: team_model.score,
        status: team_model.status,
        scenarios,
    }))
}
