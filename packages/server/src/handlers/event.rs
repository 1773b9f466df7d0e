use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::event;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::event::*;
use crate::state::AppState;

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create a new event",
    description = "Creates an event with an empty team roster. Requires `event:create` permission.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("event:create")?;
    validate_create_event(&payload)?;

    let now = chrono::Utc::now();
    let new_event = event::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        status: Set(payload.status),
        start_date: Set(payload.start_date),
        end_date: Set(payload.end_date),
        duration: Set(payload.duration),
        max_teams: Set(payload.max_teams),
        current_team_count: Set(0),
        registration_deadline: Set(payload.registration_deadline),
        scenarios: Set(serde_json::json!(payload.scenarios)),
        scoring_type: Set(payload.scoring_type),
        settings: Set(serde_json::json!(payload.settings)),
        created_by: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_event.insert(&state.db).await?;

    Ok((StatusCode::CREATED, Json(EventResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List all events",
    description = "Returns every event, newest first.",
    responses(
        (status = 200, description = "List of events", body = Vec<EventResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_events(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<EventResponse>>, AppError> {
    let models = event::Entity::find()
        .order_by_desc(event::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(models.into_iter().map(EventResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event by ID",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_event(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Update an existing event",
    description = "Partially updates an event using PATCH semantics. Requires `event:manage` \
                   permission. An empty payload returns the current resource unchanged. \
                   Cross-field checks keep the schedule window and registration deadline \
                   consistent even when only one side changes. `registration_deadline` and \
                   `description` accept explicit null to clear.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    auth_user.require_permission("event:manage")?;
    validate_update_event(&payload)?;

    if payload == UpdateEventRequest::default() {
        let existing = find_event(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;

    // Cross-field schedule validation against effective values
    let effective_start = payload.start_date.unwrap_or(existing.start_date);
    let effective_end = payload.end_date.unwrap_or(existing.end_date);
    let effective_deadline = match payload.registration_deadline {
        Some(deadline) => deadline,
        None => existing.registration_deadline,
    };
    validate_schedule(effective_start, effective_end, effective_deadline)?;

    let mut active: event::ActiveModel = existing.into();

    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    if let Some(start_date) = payload.start_date {
        active.start_date = Set(start_date);
    }
    if let Some(end_date) = payload.end_date {
        active.end_date = Set(end_date);
    }
    if let Some(duration) = payload.duration {
        active.duration = Set(duration);
    }
    if let Some(max_teams) = payload.max_teams {
        active.max_teams = Set(max_teams);
    }
    if let Some(registration_deadline) = payload.registration_deadline {
        active.registration_deadline = Set(registration_deadline);
    }
    if let Some(scenarios) = payload.scenarios {
        active.scenarios = Set(serde_json::json!(scenarios));
    }
    if let Some(scoring_type) = payload.scoring_type {
        active.scoring_type = Set(scoring_type);
    }
    if let Some(settings) = payload.settings {
        active.settings = Set(serde_json::json!(settings));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event by ID",
    description = "Permanently deletes an event. Requires `event:delete` permission. Teams \
                   registered to the event are NOT deleted; cleaning them up is the caller's \
                   responsibility.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("event:delete")?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, id).await?;
    event::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn find_event<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

pub(super) async fn find_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    use sea_orm::sea_query::LockType;
    event::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}
