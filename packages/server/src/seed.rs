use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::entity::{role, role_permission, scenario, team};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &["admin", "organizer", "participant"];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Admin: all permissions
    ("admin", "event:create"),
    ("admin", "event:manage"),
    ("admin", "event:delete"),
    ("admin", "team:manage"),
    ("admin", "scenario:create"),
    ("admin", "scenario:edit"),
    ("admin", "scenario:delete"),
    ("admin", "progress:record"),
    ("admin", "user:manage"),
    // Organizer: runs events, no destructive rights
    ("organizer", "event:create"),
    ("organizer", "event:manage"),
    ("organizer", "team:manage"),
    ("organizer", "scenario:create"),
    ("organizer", "scenario:edit"),
    ("organizer", "progress:record"),
    // Participant
    ("participant", "progress:record"),
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Seed roles
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    // Seed role-permission mappings
    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => perms_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't create plain secondary indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Index for the per-event team listing:
    // SELECT * FROM team WHERE event_id = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_team_event")
        .table(team::Entity)
        .col(team::Column::EventId)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_team_event exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_team_event: {}", e);
        }
    }

    // Index for catalog queries filtering published scenarios.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_scenario_status")
        .table(scenario::Entity)
        .col(scenario::Column::Status)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_scenario_status exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_scenario_status: {}", e);
        }
    }

    Ok(())
}
