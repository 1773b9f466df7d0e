use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{event, team};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::team::*;
use crate::state::AppState;

use super::event::{find_event, find_event_for_update};

#[utoipa::path(
    post,
    path = "/",
    tag = "Teams",
    operation_id = "registerTeam",
    summary = "Register a team for an event",
    description = "Creates a team under the event and increments the event's team count. \
                   Requires `team:manage` permission. Fails with 400 once the event has \
                   reached `max_teams`.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team registered", body = TeamResponse),
        (status = 400, description = "Validation error or event full (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, name = %payload.name))]
pub async fn register_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppJson(payload): AppJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("team:manage")?;
    validate_create_team(&payload)?;

    let txn = state.db.begin().await?;
    let event_model = find_event_for_update(&txn, event_id).await?;

    if event_model.current_team_count >= event_model.max_teams {
        return Err(AppError::Validation(
            "Event has reached its maximum number of teams".into(),
        ));
    }

    let now = chrono::Utc::now();
    let new_team = team::ActiveModel {
        event_id: Set(event_id),
        name: Set(payload.name.trim().to_string()),
        members: Set(serde_json::json!(payload.members)),
        gcp_project_id: Set(payload.gcp_project_id),
        score: Set(0),
        completed_scenarios: Set(serde_json::json!([])),
        completed_problems: Set(Some(serde_json::json!([]))),
        status: Set("registered".to_string()),
        registered_at: Set(now),
        last_activity_at: Set(None),
        ..Default::default()
    };

    let model = new_team.insert(&txn).await?;
    adjust_team_count(&txn, event_model, 1).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(TeamResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Teams",
    operation_id = "listEventTeams",
    summary = "List teams registered to an event",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Teams of the event", body = Vec<TeamResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(event_id))]
pub async fn list_event_teams(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<Vec<TeamResponse>>, AppError> {
    find_event(&state.db, event_id).await?;

    let models = team::Entity::find()
        .filter(team::Column::EventId.eq(event_id))
        .order_by_asc(team::Column::RegisteredAt)
        .all(&state.db)
        .await?;

    Ok(Json(models.into_iter().map(TeamResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Teams",
    operation_id = "getTeam",
    summary = "Get a team by ID",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team details", body = TeamResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_team(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TeamResponse>, AppError> {
    let model = find_team(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Teams",
    operation_id = "updateTeam",
    summary = "Update a team's name, members, or project",
    description = "Partially updates a team using PATCH semantics. Requires `team:manage` \
                   permission. `gcp_project_id` accepts explicit null to clear. Stamps \
                   `last_activity_at`.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("team:manage")?;
    validate_update_team(&payload)?;

    if payload == UpdateTeamRequest::default() {
        let existing = find_team(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_team_for_update(&txn, id).await?;

    let mut active: team::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(members) = payload.members {
        active.members = Set(serde_json::json!(members));
    }
    if let Some(gcp_project_id) = payload.gcp_project_id {
        active.gcp_project_id = Set(gcp_project_id);
    }
    active.last_activity_at = Set(Some(chrono::Utc::now()));

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Teams",
    operation_id = "deleteTeam",
    summary = "Delete a team by ID",
    description = "Deletes the team and decrements its event's team count (floored at zero). \
                   Requires `team:manage` permission.",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("team:manage")?;

    let txn = state.db.begin().await?;
    let team_model = find_team_for_update(&txn, id).await?;
    let event_id = team_model.event_id;

    let active: team::ActiveModel = team_model.into();
    active.delete(&txn).await?;

    // The parent event may already be gone; there is no count to maintain then.
    use sea_orm::sea_query::LockType;
    if let Some(event_model) = event::Entity::find_by_id(event_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
    {
        adjust_team_count(&txn, event_model, -1).await?;
    }

    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/{id}/score",
    tag = "Teams",
    operation_id = "setTeamScore",
    summary = "Set a team's absolute score",
    description = "Overwrites the cumulative score (admin correction). Requires `team:manage` \
                   permission. Stamps `last_activity_at`.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = UpdateTeamScoreRequest,
    responses(
        (status = 200, description = "Score updated", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn set_team_score(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTeamScoreRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("team:manage")?;
    if payload.score < 0 {
        return Err(AppError::Validation("score must be >= 0".into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_team_for_update(&txn, id).await?;

    let mut active: team::ActiveModel = existing.into();
    active.score = Set(payload.score);
    active.last_activity_at = Set(Some(chrono::Utc::now()));

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/{id}/status",
    tag = "Teams",
    operation_id = "setTeamStatus",
    summary = "Set a team's status",
    description = "Moves the team to one of: registered, active, completed, disqualified. \
                   Requires `team:manage` permission. Stamps `last_activity_at`.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = UpdateTeamStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn set_team_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateTeamStatusRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("team:manage")?;
    validate_update_team_status(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_team_for_update(&txn, id).await?;

    let mut active: team::ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.last_activity_at = Set(Some(chrono::Utc::now()));

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

pub(super) async fn find_team<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

pub(super) async fn find_team_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<team::Model, AppError> {
    use sea_orm::sea_query::LockType;
    team::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

/// Adjust the parent event's registered-team count. The count never goes
/// negative, even when decrementing an already-zero roster.
async fn adjust_team_count(
    txn: &DatabaseTransaction,
    event_model: event::Model,
    delta: i32,
) -> Result<(), AppError> {
    let new_count = std::cmp::Ord::max(event_model.current_team_count + delta, 0);
    let mut active: event::ActiveModel = event_model.into();
    active.current_team_count = Set(new_count);
    active.update(txn).await?;
    Ok(())
}
