use crate::common::{TestApp, routes};
use serde_json::json;

fn valid_event_body(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "description": "An event description",
        "status": "draft",
        "start_date": "2099-06-01T09:00:00Z",
        "end_date": "2099-06-01T17:00:00Z",
        "duration": 480,
        "max_teams": 10,
        "scenarios": [1],
        "scoring_type": "points",
        "settings": {
            "allow_late_registration": false,
            "auto_start_scoring": true,
            "show_leaderboard": true,
            "notification_enabled": false,
        },
    })
}

mod event_creation {
    use super::*;

    #[tokio::test]
    async fn admin_can_create_an_event() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let res = app
            .post_with_token(routes::EVENTS, &valid_event_body("GameDay 2099"), &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["name"], "GameDay 2099");
        assert_eq!(res.body["current_team_count"], 0);
        assert_eq!(res.body["scoring_type"], "points");
        assert!(res.body["id"].as_i64().is_some());
    }

    #[tokio::test]
    async fn participant_cannot_create_an_event() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("player1", "pass1234").await;

        let res = app
            .post_with_token(routes::EVENTS, &valid_event_body("Nope"), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn rejects_end_before_start() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let mut body = valid_event_body("Bad Times");
        body["start_date"] = json!("2099-06-02T09:00:00Z");
        body["end_date"] = json!("2099-06-01T09:00:00Z");

        let res = app.post_with_token(routes::EVENTS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_registration_deadline_after_start() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let mut body = valid_event_body("Late Deadline");
        body["registration_deadline"] = json!("2099-06-01T12:00:00Z");

        let res = app.post_with_token(routes::EVENTS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_empty_scenario_list() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let mut body = valid_event_body("No Scenarios");
        body["scenarios"] = json!([]);

        let res = app.post_with_token(routes::EVENTS, &body, &token).await;

        assert_eq!(res.status, 400);
    }
}

mod event_read {
    use super::*;

    #[tokio::test]
    async fn lists_created_events() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        app.create_event(&token, "Event A", 10, &[1]).await;
        app.create_event(&token, "Event B", 10, &[1]).await;

        let res = app.get_with_token(routes::EVENTS, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn returns_404_for_missing_event() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let res = app.get_with_token(&routes::event(9999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod event_update {
    use super::*;

    #[tokio::test]
    async fn patches_selected_fields_and_stamps_updated_at() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let id = app.create_event(&token, "Original", 10, &[1]).await;

        let res = app
            .patch_with_token(
                &routes::event(id),
                &json!({"name": "Renamed", "max_teams": 20}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Renamed");
        assert_eq!(res.body["max_teams"], 20);
        assert_eq!(res.body["scoring_type"], "points");
    }

    #[tokio::test]
    async fn empty_patch_returns_resource_unchanged() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let id = app.create_event(&token, "Original", 10, &[1]).await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["name"], "Original");
    }

    #[tokio::test]
    async fn cross_field_check_uses_existing_values() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let id = app.create_event(&token, "Window", 10, &[1]).await;

        // Moving end_date before the stored start_date must fail even though
        // start_date is not part of the patch.
        let res = app
            .patch_with_token(
                &routes::event(id),
                &json!({"end_date": "2000-01-01T00:00:00Z"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn null_clears_registration_deadline() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let id = app.create_event(&token, "Deadline", 10, &[1]).await;

        let set = app
            .patch_with_token(
                &routes::event(id),
                &json!({"registration_deadline": "2099-01-01T00:00:00Z"}),
                &token,
            )
            .await;
        assert_eq!(set.status, 200);
        assert_eq!(set.body["registration_deadline"], "2099-01-01T00:00:00Z");

        let cleared = app
            .patch_with_token(
                &routes::event(id),
                &json!({"registration_deadline": null}),
                &token,
            )
            .await;
        assert_eq!(cleared.status, 200);
        assert!(cleared.body["registration_deadline"].is_null());
    }
}

mod event_deletion {
    use super::*;

    #[tokio::test]
    async fn deletes_and_then_404s() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let id = app.create_event(&token, "Doomed", 10, &[1]).await;

        let del = app.delete_with_token(&routes::event(id), &token).await;
        assert_eq!(del.status, 204);

        let get = app.get_with_token(&routes::event(id), &token).await;
        assert_eq!(get.status, 404);
    }

    #[tokio::test]
    async fn leaves_registered_teams_in_place() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let event_id = app.create_event(&token, "Orphaning", 10, &[1]).await;
        let team_id = app.register_team(event_id, &token, "Survivors").await;

        let del = app.delete_with_token(&routes::event(event_id), &token).await;
        assert_eq!(del.status, 204);

        let team = app.get_with_token(&routes::team(team_id), &token).await;
        assert_eq!(team.status, 200);
        assert_eq!(team.body["event_id"], event_id);
    }
}
