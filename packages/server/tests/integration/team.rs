use crate::common::{TestApp, routes};
use sea_orm::{EntityTrait, Set};
use serde_json::json;

use server::entity::event;

mod team_registration {
    use super::*;

    #[tokio::test]
    async fn registers_a_team_and_increments_the_event_count() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;

        let team_id = app.register_team(event_id, &token, "Alpha").await;

        let team = app.get_with_token(&routes::team(team_id), &token).await;
        assert_eq!(team.body["name"], "Alpha");
        assert_eq!(team.body["status"], "registered");
        assert_eq!(team.body["score"], 0);
        assert_eq!(team.body["completed_problems"], json!([]));

        let ev = app.get_with_token(&routes::event(event_id), &token).await;
        assert_eq!(ev.body["current_team_count"], 1);
    }

    #[tokio::test]
    async fn gcp_project_id_round_trips_identically() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;

        let res = app
            .post_with_token(
                &routes::event_teams(event_id),
                &json!({
                    "name": "Alpha",
                    "members": [{"name": "Ann", "email": "ann@example.com", "role": "leader"}],
                    "gcp_project_id": "my-proj-1",
                }),
                &token,
            )
            .await;
        assert_eq!(res.status, 201);

        let team = app.get_with_token(&routes::team(res.id()), &token).await;
        assert_eq!(team.body["gcp_project_id"], "my-proj-1");
    }

    #[tokio::test]
    async fn rejects_malformed_gcp_project_ids() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;

        let res = app
            .post_with_token(
                &routes::event_teams(event_id),
                &json!({
                    "name": "Alpha",
                    "members": [{"name": "Ann", "email": "ann@example.com", "role": "leader"}],
                    "gcp_project_id": "Bad_Project",
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn requires_exactly_one_leader() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;

        let res = app
            .post_with_token(
                &routes::event_teams(event_id),
                &json!({
                    "name": "Two Chiefs",
                    "members": [
                        {"name": "Ann", "email": "ann@example.com", "role": "leader"},
                        {"name": "Bob", "email": "bob@example.com", "role": "leader"},
                    ],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_registration_once_event_is_full() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "Tiny", 1, &[1]).await;

        app.register_team(event_id, &token, "First").await;

        let res = app
            .post_with_token(
                &routes::event_teams(event_id),
                &json!({
                    "name": "Second",
                    "members": [{"name": "Ann", "email": "ann@example.com", "role": "leader"}],
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn lists_teams_of_an_event() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;
        app.register_team(event_id, &token, "Alpha").await;
        app.register_team(event_id, &token, "Beta").await;

        let res = app
            .get_with_token(&routes::event_teams(event_id), &token)
            .await;

        assert_eq!(res.status, 200);
        let names: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }
}

mod team_update {
    use super::*;

    #[tokio::test]
    async fn patches_name_and_clears_project_id() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;
        let team_id = app.register_team(event_id, &token, "Alpha").await;

        let renamed = app
            .patch_with_token(
                &routes::team(team_id),
                &json!({"name": "Alpha Prime", "gcp_project_id": "alpha-prime"}),
                &token,
            )
            .await;
        assert_eq!(renamed.status, 200);
        assert_eq!(renamed.body["name"], "Alpha Prime");
        assert_eq!(renamed.body["gcp_project_id"], "alpha-prime");
        assert!(!renamed.body["last_activity_at"].is_null());

        let cleared = app
            .patch_with_token(
                &routes::team(team_id),
                &json!({"gcp_project_id": null}),
                &token,
            )
            .await;
        assert_eq!(cleared.status, 200);
        assert!(cleared.body["gcp_project_id"].is_null());
    }

    #[tokio::test]
    async fn sets_absolute_score() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;
        let team_id = app.register_team(event_id, &token, "Alpha").await;

        let res = app
            .put_with_token(&routes::team_score(team_id), &json!({"score": 250}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["score"], 250);
    }

    #[tokio::test]
    async fn sets_status_within_the_declared_set() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;
        let team_id = app.register_team(event_id, &token, "Alpha").await;

        let res = app
            .put_with_token(
                &routes::team_status(team_id),
                &json!({"status": "active"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "active");

        let bad = app
            .put_with_token(
                &routes::team_status(team_id),
                &json!({"status": "vanished"}),
                &token,
            )
            .await;
        assert_eq!(bad.status, 400);
    }
}

mod team_deletion {
    use super::*;

    #[tokio::test]
    async fn decrements_the_event_count_by_one() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;
        let team_id = app.register_team(event_id, &token, "Alpha").await;
        app.register_team(event_id, &token, "Beta").await;

        let del = app.delete_with_token(&routes::team(team_id), &token).await;
        assert_eq!(del.status, 204);

        let ev = app.get_with_token(&routes::event(event_id), &token).await;
        assert_eq!(ev.body["current_team_count"], 1);
    }

    #[tokio::test]
    async fn count_never_goes_negative() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "GameDay", 10, &[1]).await;
        let team_id = app.register_team(event_id, &token, "Alpha").await;

        // Force the stored count out of sync, as a legacy record might be.
        let ev = event::Entity::find_by_id(event_id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        let mut active: event::ActiveModel = ev.into();
        active.current_team_count = Set(0);
        event::Entity::update(active).exec(&app.db).await.unwrap();

        let del = app.delete_with_token(&routes::team(team_id), &token).await;
        assert_eq!(del.status, 204);

        let ev = app.get_with_token(&routes::event(event_id), &token).await;
        assert_eq!(ev.body["current_team_count"], 0);
    }

    #[tokio::test]
    async fn returns_404_for_missing_team() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let res = app.delete_with_token(&routes::team(9999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
