use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::scenario::{self, ScenarioProblem};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::scenario::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Scenarios",
    operation_id = "createScenario",
    summary = "Create a new scenario",
    description = "Creates a scenario at version 1 with zeroed usage statistics. Problem and \
                   hint IDs are assigned from array position (`problem_1`, `problem_2`, ...). \
                   Requires `scenario:create` permission.",
    request_body = CreateScenarioRequest,
    responses(
        (status = 201, description = "Scenario created", body = ScenarioResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_scenario(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateScenarioRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("scenario:create")?;
    validate_create_scenario(&payload)?;

    let problems = assign_problem_ids(payload.problems);
    let hints = assign_hint_ids(payload.hints);

    let now = chrono::Utc::now();
    let new_scenario = scenario::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        difficulty: Set(payload.difficulty),
        category: Set(payload.category),
        estimated_time_minutes: Set(payload.estimated_time_minutes),
        max_score: Set(payload.max_score),
        evaluation_points: Set(payload.evaluation_points),
        objectives: Set(payload.objectives),
        technologies: Set(payload.technologies),
        detailed_description: Set(payload.detailed_description),
        evaluation_criteria: Set(payload.evaluation_criteria),
        problems: Set(serde_json::json!(problems)),
        hints: Set(serde_json::json!(hints)),
        resources: Set(serde_json::json!(payload.resources)),
        status: Set(payload.status),
        tags: Set(serde_json::json!(payload.tags)),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        version: Set(1),
        usage_count: Set(0),
        average_score: Set(0.0),
        average_completion_time: Set(0.0),
        ..Default::default()
    };

    let model = new_scenario.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(ScenarioResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Scenarios",
    operation_id = "listScenarios",
    summary = "List scenarios with optional filters",
    description = "Returns scenarios filtered by status, category, and/or difficulty, \
                   newest first.",
    params(ScenarioListQuery),
    responses(
        (status = 200, description = "List of scenarios", body = Vec<ScenarioResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_scenarios(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ScenarioListQuery>,
) -> Result<Json<Vec<ScenarioResponse>>, AppError> {
    validate_scenario_list_query(&query)?;

    let mut select = scenario::Entity::find();
    if let Some(ref status) = query.status {
        select = select.filter(scenario::Column::Status.eq(status));
    }
    if let Some(ref category) = query.category {
        select = select.filter(scenario::Column::Category.eq(category));
    }
    if let Some(ref difficulty) = query.difficulty {
        select = select.filter(scenario::Column::Difficulty.eq(difficulty));
    }

    let models = select
        .order_by_desc(scenario::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(
        models.into_iter().map(ScenarioResponse::from).collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Scenarios",
    operation_id = "scenarioCategoryCounts",
    summary = "Published-scenario counts per category",
    responses(
        (status = 200, description = "Counts keyed by category", body = CategoryCountsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn scenario_category_counts(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CategoryCountsResponse>, AppError> {
    let categories: Vec<String> = scenario::Entity::find()
        .filter(scenario::Column::Status.eq("published"))
        .select_only()
        .column(scenario::Column::Category)
        .into_tuple::<String>()
        .all(&state.db)
        .await?;

    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for category in categories {
        *counts.entry(category).or_insert(0) += 1;
    }

    Ok(Json(CategoryCountsResponse { counts }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Scenarios",
    operation_id = "getScenario",
    summary = "Get a scenario by ID",
    params(("id" = i32, Path, description = "Scenario ID")),
    responses(
        (status = 200, description = "Scenario details", body = ScenarioResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Scenario not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_scenario(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ScenarioResponse>, AppError> {
    let model = find_scenario(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Scenarios",
    operation_id = "updateScenario",
    summary = "Update an existing scenario",
    description = "Partially updates a scenario using PATCH semantics and increments the \
                   version counter. Supplied problem/hint lists replace the stored ones \
                   with IDs reassigned by position; completion keys recorded against an \
                   old layout keep matching whichever problem now holds that ID. Requires \
                   `scenario:edit` permission.",
    params(("id" = i32, Path, description = "Scenario ID")),
    request_body = UpdateScenarioRequest,
    responses(
        (status = 200, description = "Scenario updated", body = ScenarioResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Scenario not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_scenario(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateScenarioRequest>,
) -> Result<Json<ScenarioResponse>, AppError> {
    auth_user.require_permission("scenario:edit")?;

    if payload.is_empty() {
        let existing = find_scenario(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_scenario_for_update(&txn, id).await?;

    let effective_max_score = payload.max_score.unwrap_or(existing.max_score);
    let existing_problem_scores: Vec<i32> =
        serde_json::from_value::<Vec<ScenarioProblem>>(existing.problems.clone())
            .unwrap_or_default()
            .iter()
            .map(|p| p.score)
            .collect();
    validate_update_scenario(&payload, effective_max_score, &existing_problem_scores)?;

    let new_version = existing.version + 1;
    let mut active: scenario::ActiveModel = existing.into();

    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(difficulty) = payload.difficulty {
        active.difficulty = Set(difficulty);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(minutes) = payload.estimated_time_minutes {
        active.estimated_time_minutes = Set(minutes);
    }
    if let Some(max_score) = payload.max_score {
        active.max_score = Set(max_score);
    }
    if let Some(points) = payload.evaluation_points {
        active.evaluation_points = Set(points);
    }
    if let Some(objectives) = payload.objectives {
        active.objectives = Set(objectives);
    }
    if let Some(technologies) = payload.technologies {
        active.technologies = Set(technologies);
    }
    if let Some(detailed) = payload.detailed_description {
        active.detailed_description = Set(detailed);
    }
    if let Some(criteria) = payload.evaluation_criteria {
        active.evaluation_criteria = Set(criteria);
    }
    if let Some(problems) = payload.problems {
        active.problems = Set(serde_json::json!(assign_problem_ids(problems)));
    }
    if let Some(hints) = payload.hints {
        active.hints = Set(serde_json::json!(assign_hint_ids(hints)));
    }
    if let Some(resources) = payload.resources {
        active.resources = Set(serde_json::json!(resources));
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(tags) = payload.tags {
        active.tags = Set(serde_json::json!(tags));
    }
    active.version = Set(new_version);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Scenarios",
    operation_id = "deleteScenario",
    summary = "Delete a scenario by ID",
    description = "Permanently deletes a scenario. Requires `scenario:delete` permission. \
                   Events referencing the scenario keep the dangling ID; the progress view \
                   simply omits it.",
    params(("id" = i32, Path, description = "Scenario ID")),
    responses(
        (status = 204, description = "Scenario deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Scenario not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_scenario(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("scenario:delete")?;

    let txn = state.db.begin().await?;
    find_scenario_for_update(&txn, id).await?;
    scenario::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/stats",
    tag = "Scenarios",
    operation_id = "recordScenarioStats",
    summary = "Fold one run into a scenario's usage statistics",
    description = "Increments `usage_count` and recomputes the running score and \
                   completion-time averages. Does not bump the content version. Requires \
                   `progress:record` permission.",
    params(("id" = i32, Path, description = "Scenario ID")),
    request_body = RecordScenarioStatsRequest,
    responses(
        (status = 200, description = "Statistics updated", body = ScenarioResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Scenario not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn record_scenario_stats(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<RecordScenarioStatsRequest>,
) -> Result<Json<ScenarioResponse>, AppError> {
    auth_user.require_permission("progress:record")?;
    validate_record_stats(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_scenario_for_update(&txn, id).await?;

    let usage = existing.usage_count;
    let new_usage = usage + 1;
    let new_average_score =
        (existing.average_score * usage as f64 + payload.score) / new_usage as f64;
    let new_average_completion_time = (existing.average_completion_time * usage as f64
        + payload.completion_time_minutes)
        / new_usage as f64;

    let mut active: scenario::ActiveModel = existing.into();
    active.usage_count = Set(new_usage);
    active.average_score = Set(new_average_score);
    active.average_completion_time = Set(new_average_completion_time);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

async fn find_scenario<C: ConnectionTrait>(db: &C, id: i32) -> Result<scenario::Model, AppError> {
    scenario::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Scenario not found".into()))
}

async fn find_scenario_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<scenario::Model, AppError> {
    use sea_orm::sea_query::LockType;
    scenario::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Scenario not found".into()))
}
