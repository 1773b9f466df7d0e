use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{double_option, validate_one_of, validate_text};
use crate::entity::team::{self, TeamMember};
use crate::error::AppError;
use crate::utils::progress;

pub const TEAM_STATUSES: &[&str] = &["registered", "active", "completed", "disqualified"];
pub const MEMBER_ROLES: &[&str] = &["leader", "member"];

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTeamRequest {
    pub name: String,
    pub members: Vec<TeamMember>,
    pub gcp_project_id: Option<String>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub members: Option<Vec<TeamMember>>,
    #[serde(default, deserialize_with = "double_option")]
    pub gcp_project_id: Option<Option<String>>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateTeamScoreRequest {
    /// New absolute score for the team.
    pub score: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateTeamStatusRequest {
    /// One of: registered, active, completed, disqualified
    pub status: String,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    pub id: i32,
    pub event_id: i32,
    pub name: String,
    pub members: Vec<TeamMember>,
    pub gcp_project_id: Option<String>,
    pub score: i32,
    pub completed_scenarios: Vec<i32>,
    /// Completion keys; legacy rows may hold bare problem IDs.
    pub completed_problems: Vec<String>,
    pub status: String,
    pub registered_at: DateTime<Utc>,
    pub last_activity_at: Option<DateTime<Utc>>,
}

impl From<team::Model> for TeamResponse {
    fn from(m: team::Model) -> Self {
        let completed_scenarios = progress::completed_scenario_ids(&m);
        let completed_problems = progress::completed_problem_keys(&m);
        Self {
            id: m.id,
            event_id: m.event_id,
            name: m.name,
            members: serde_json::from_value(m.members).unwrap_or_default(),
            gcp_project_id: m.gcp_project_id,
            score: m.score,
            completed_scenarios,
            completed_problems,
            status: m.status,
            registered_at: m.registered_at,
            last_activity_at: m.last_activity_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_create_team(req: &CreateTeamRequest) -> Result<(), AppError> {
    validate_text("Team name", &req.name, 1, 50)?;
    validate_members(&req.members)?;
    if let Some(ref project_id) = req.gcp_project_id {
        validate_gcp_project_id(project_id)?;
    }
    Ok(())
}

pub fn validate_update_team(req: &UpdateTeamRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_text("Team name", name, 1, 50)?;
    }
    if let Some(ref members) = req.members {
        validate_members(members)?;
    }
    if let Some(Some(ref project_id)) = req.gcp_project_id {
        validate_gcp_project_id(project_id)?;
    }
    Ok(())
}

pub fn validate_update_team_status(req: &UpdateTeamStatusRequest) -> Result<(), AppError> {
    validate_one_of("status", &req.status, TEAM_STATUSES)
}

fn validate_members(members: &[TeamMember]) -> Result<(), AppError> {
    if members.is_empty() || members.len() > 10 {
        return Err(AppError::Validation(
            "Teams must have between 1 and 10 members".into(),
        ));
    }
    for member in members {
        validate_text("Member name", &member.name, 1, 30)?;
        if !is_plausible_email(&member.email) {
            return Err(AppError::Validation(format!(
                "'{}' is not a valid email address",
                member.email
            )));
        }
        validate_one_of("member role", &member.role, MEMBER_ROLES)?;
    }
    let leaders = members.iter().filter(|m| m.role == "leader").count();
    if leaders != 1 {
        return Err(AppError::Validation(
            "Teams must have exactly one leader".into(),
        ));
    }
    Ok(())
}

fn validate_gcp_project_id(value: &str) -> Result<(), AppError> {
    if is_valid_gcp_project_id(value) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "gcp_project_id must be 6-30 characters, start with a lowercase letter, \
             end with a letter or digit, and contain only lowercase letters, digits, and hyphens"
                .into(),
        ))
    }
}

/// GCP project ID format: `^[a-z][a-z0-9-]{4,28}[a-z0-9]$`.
fn is_valid_gcp_project_id(value: &str) -> bool {
    let b = value.as_bytes();
    if b.len() < 6 || b.len() > 30 {
        return false;
    }
    if !b[0].is_ascii_lowercase() {
        return false;
    }
    let last = b[b.len() - 1];
    if !last.is_ascii_lowercase() && !last.is_ascii_digit() {
        return false;
    }
    b[1..b.len() - 1]
        .iter()
        .all(|&c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == b'-')
}

fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}
