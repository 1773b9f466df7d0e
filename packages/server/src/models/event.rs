use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_one_of, validate_range, validate_text};
use crate::entity::event::{self, EventSettings};
use crate::error::AppError;

pub const EVENT_STATUSES: &[&str] = &["draft", "published", "active", "completed", "cancelled"];
pub const SCORING_TYPES: &[&str] = &["time", "points", "hybrid"];

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Planned running time in minutes.
    pub duration: i32,
    pub max_teams: i32,
    pub registration_deadline: Option<DateTime<Utc>>,
    /// IDs of the scenarios played in this event.
    pub scenarios: Vec<i32>,
    pub scoring_type: String,
    pub settings: EventSettings,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    pub status: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub max_teams: Option<i32>,
    #[serde(default, deserialize_with = "double_option")]
    pub registration_deadline: Option<Option<DateTime<Utc>>>,
    pub scenarios: Option<Vec<i32>>,
    pub scoring_type: Option<String>,
    pub settings: Option<EventSettings>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration: i32,
    pub max_teams: i32,
    pub current_team_count: i32,
    pub registration_deadline: Option<DateTime<Utc>>,
    pub scenarios: Vec<i32>,
    pub scoring_type: String,
    pub settings: EventSettings,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<event::Model> for EventResponse {
    fn from(m: event::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            status: m.status,
            start_date: m.start_date,
            end_date: m.end_date,
            duration: m.duration,
            max_teams: m.max_teams,
            current_team_count: m.current_team_count,
            registration_deadline: m.registration_deadline,
            scenarios: serde_json::from_value(m.scenarios).unwrap_or_default(),
            scoring_type: m.scoring_type,
            settings: serde_json::from_value(m.settings).unwrap_or_default(),
            created_by: m.created_by,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_create_event(req: &CreateEventRequest) -> Result<(), AppError> {
    validate_text("Event name", &req.name, 1, 100)?;
    if let Some(ref description) = req.description {
        validate_text("Description", description, 0, 1000)?;
    }
    validate_one_of("status", &req.status, EVENT_STATUSES)?;
    validate_range("duration", req.duration, 30, 1440)?;
    validate_range("max_teams", req.max_teams, 1, 100)?;
    validate_one_of("scoring_type", &req.scoring_type, SCORING_TYPES)?;
    validate_scenario_ids(&req.scenarios)?;
    validate_schedule(req.start_date, req.end_date, req.registration_deadline)
}

pub fn validate_update_event(req: &UpdateEventRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_text("Event name", name, 1, 100)?;
    }
    if let Some(Some(ref description)) = req.description {
        validate_text("Description", description, 0, 1000)?;
    }
    if let Some(ref status) = req.status {
        validate_one_of("status", status, EVENT_STATUSES)?;
    }
    if let Some(duration) = req.duration {
        validate_range("duration", duration, 30, 1440)?;
    }
    if let Some(max_teams) = req.max_teams {
        validate_range("max_teams", max_teams, 1, 100)?;
    }
    if let Some(ref scoring_type) = req.scoring_type {
        validate_one_of("scoring_type", scoring_type, SCORING_TYPES)?;
    }
    if let Some(ref scenarios) = req.scenarios {
        validate_scenario_ids(scenarios)?;
    }
    Ok(())
}

/// Cross-field schedule validation. Callers of the update endpoint pass
/// effective values merged from the payload and the existing row.
pub fn validate_schedule(
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    registration_deadline: Option<DateTime<Utc>>,
) -> Result<(), AppError> {
    if end_date <= start_date {
        return Err(AppError::Validation(
            "end_date must be after start_date".into(),
        ));
    }
    if let Some(deadline) = registration_deadline
        && deadline > start_date
    {
        return Err(AppError::Validation(
            "registration_deadline must be on or before start_date".into(),
        ));
    }
    Ok(())
}

fn validate_scenario_ids(scenarios: &[i32]) -> Result<(), AppError> {
    if scenarios.is_empty() {
        return Err(AppError::Validation(
            "At least one scenario must be selected".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for &id in scenarios {
        if !seen.insert(id) {
            return Err(AppError::Validation(format!(
                "Duplicate scenario ID {id} in scenario list"
            )));
        }
    }
    Ok(())
}
