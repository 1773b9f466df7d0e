use crate::entity::team;

/// Builds the canonical completion key for a problem within a scenario.
pub fn problem_key(scenario_id: i32, problem_id: &str) -> String {
    format!("{scenario_id}-{problem_id}")
}

/// Completed-problem keys recorded for a team.
///
/// Rows created before problem-level tracking carry no `completed_problems`
/// value; those default to an empty list.
pub fn completed_problem_keys(team: &team::Model) -> Vec<String> {
    team.completed_problems
        .as_ref()
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

/// Completed scenario IDs recorded for a team.
pub fn completed_scenario_ids(team: &team::Model) -> Vec<i32> {
    serde_json::from_value(team.completed_scenarios.clone()).unwrap_or_default()
}

/// Whether a team has completed the given problem of the given scenario.
///
/// Entries are matched in the scoped `"<scenario_id>-<problem_id>"` form
/// first, then as the bare problem ID. Rows written before scenario scoping
/// store only the latter, and both must keep counting as completed.
pub fn is_problem_completed(team: &team::Model, scenario_id: i32, problem_id: &str) -> bool {
    let scoped = problem_key(scenario_id, problem_id);
    completed_problem_keys(team)
        .iter()
        .any(|k| *k == scoped || *k == problem_id)
}
