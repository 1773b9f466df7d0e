use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/events", event_routes())
        .nest("/teams", team_routes())
        .nest("/scenarios", scenario_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::event::list_events,
            handlers::event::create_event
        ))
        .routes(routes!(
            handlers::event::get_event,
            handlers::event::update_event,
            handlers::event::delete_event
        ))
        .nest("/{id}/teams", event_team_routes())
}

fn event_team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        handlers::team::list_event_teams,
        handlers::team::register_team
    ))
}

fn team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::team::get_team,
            handlers::team::update_team,
            handlers::team::delete_team
        ))
        .routes(routes!(handlers::team::set_team_score))
        .routes(routes!(handlers::team::set_team_status))
        .routes(routes!(handlers::progress::get_team_progress))
        .routes(routes!(handlers::progress::record_problem_completion))
        .routes(routes!(handlers::progress::record_scenario_completion))
}

fn scenario_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::scenario::list_scenarios,
            handlers::scenario::create_scenario
        ))
        .routes(routes!(handlers::scenario::scenario_category_counts))
        .routes(routes!(
            handlers::scenario::get_scenario,
            handlers::scenario::update_scenario,
            handlers::scenario::delete_scenario
        ))
        .routes(routes!(handlers::scenario::record_scenario_stats))
}
