use crate::common::{TestApp, routes};
use serde_json::json;

fn valid_scenario_body(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Deploy and secure a small fleet.",
        "difficulty": "intermediate",
        "category": "security",
        "estimated_time_minutes": 90,
        "max_score": 100,
        "evaluation_points": 100,
        "objectives": "Understand IAM basics.",
        "technologies": "iam, networking",
        "detailed_description": "You are on call. An audit is due tomorrow.",
        "problems": [
            {
                "title": "Lock down the buckets",
                "description": "Remove public access.",
                "score": 40,
                "grading_method": "manual",
                "order": 1,
            },
            {
                "title": "Rotate the keys",
                "description": "Rotate all service account keys.",
                "score": 60,
                "grading_method": "command",
                "grading_command": "./check_rotation.sh",
                "order": 2,
                "unlock_condition": {
                    "type": "problem_completion",
                    "required_problem_ids": ["problem_1"],
                },
            },
        ],
        "hints": [
            {"content": "Look at the bucket IAM bindings.", "penalty": 5},
        ],
        "status": "published",
        "tags": ["iam", "audit"],
    })
}

mod scenario_creation {
    use super::*;

    #[tokio::test]
    async fn assigns_positional_problem_and_hint_ids() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let res = app
            .post_with_token(routes::SCENARIOS, &valid_scenario_body("Audit Day"), &token)
            .await;

        assert_eq!(res.status, 201);
        assert_eq!(res.body["version"], 1);
        assert_eq!(res.body["usage_count"], 0);
        assert_eq!(res.body["problems"][0]["id"], "problem_1");
        assert_eq!(res.body["problems"][1]["id"], "problem_2");
        assert_eq!(res.body["hints"][0]["id"], "hint_1");
    }

    #[tokio::test]
    async fn rejects_problem_scores_exceeding_max_score() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let mut body = valid_scenario_body("Overweight");
        body["max_score"] = json!(50);

        let res = app.post_with_token(routes::SCENARIOS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejects_time_unlock_without_minutes() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        let mut body = valid_scenario_body("Timed");
        body["problems"][1]["unlock_condition"] = json!({"type": "time"});

        let res = app.post_with_token(routes::SCENARIOS, &body, &token).await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn participant_cannot_create_scenarios() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("player1", "pass1234").await;

        let res = app
            .post_with_token(routes::SCENARIOS, &valid_scenario_body("Nope"), &token)
            .await;

        assert_eq!(res.status, 403);
    }
}

mod scenario_listing {
    use super::*;

    #[tokio::test]
    async fn filters_by_status_category_and_difficulty() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        app.post_with_token(routes::SCENARIOS, &valid_scenario_body("Sec"), &token)
            .await;
        let mut other = valid_scenario_body("Net");
        other["category"] = json!("networking");
        other["status"] = json!("draft");
        app.post_with_token(routes::SCENARIOS, &other, &token).await;

        let published = app
            .get_with_token(&format!("{}?status=published", routes::SCENARIOS), &token)
            .await;
        assert_eq!(published.body.as_array().unwrap().len(), 1);

        let networking = app
            .get_with_token(&format!("{}?category=networking", routes::SCENARIOS), &token)
            .await;
        assert_eq!(networking.body.as_array().unwrap().len(), 1);
        assert_eq!(networking.body[0]["title"], "Net");

        let res = app
            .get_with_token(&format!("{}?status=bogus", routes::SCENARIOS), &token)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn counts_published_scenarios_per_category() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;

        app.post_with_token(routes::SCENARIOS, &valid_scenario_body("One"), &token)
            .await;
        app.post_with_token(routes::SCENARIOS, &valid_scenario_body("Two"), &token)
            .await;
        let mut draft = valid_scenario_body("Hidden");
        draft["status"] = json!("draft");
        app.post_with_token(routes::SCENARIOS, &draft, &token).await;

        let res = app
            .get_with_token(routes::SCENARIO_CATEGORIES, &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["counts"]["security"], 2);
    }
}

mod scenario_update {
    use super::*;

    #[tokio::test]
    async fn increments_the_version_on_every_update() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let res = app
            .post_with_token(routes::SCENARIOS, &valid_scenario_body("Versioned"), &token)
            .await;
        let id = res.id();

        let first = app
            .patch_with_token(&routes::scenario(id), &json!({"title": "V2"}), &token)
            .await;
        assert_eq!(first.body["version"], 2);

        let second = app
            .patch_with_token(&routes::scenario(id), &json!({"difficulty": "expert"}), &token)
            .await;
        assert_eq!(second.body["version"], 3);
    }

    #[tokio::test]
    async fn replacing_problems_reassigns_positional_ids() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let res = app
            .post_with_token(routes::SCENARIOS, &valid_scenario_body("Reshaped"), &token)
            .await;
        let id = res.id();

        let updated = app
            .patch_with_token(
                &routes::scenario(id),
                &json!({
                    "problems": [{
                        "title": "Only task",
                        "description": "Just one now.",
                        "score": 10,
                        "grading_method": "automatic",
                        "order": 1,
                    }],
                }),
                &token,
            )
            .await;

        assert_eq!(updated.status, 200);
        let problems = updated.body["problems"].as_array().unwrap();
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0]["id"], "problem_1");
    }

    #[tokio::test]
    async fn rejects_shrinking_max_score_below_problem_total() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let res = app
            .post_with_token(routes::SCENARIOS, &valid_scenario_body("Shrunk"), &token)
            .await;
        let id = res.id();

        let updated = app
            .patch_with_token(&routes::scenario(id), &json!({"max_score": 50}), &token)
            .await;

        assert_eq!(updated.status, 400);
        assert_eq!(updated.body["code"], "VALIDATION_ERROR");
    }
}

mod scenario_stats {
    use super::*;

    #[tokio::test]
    async fn folds_runs_into_running_averages() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let res = app
            .post_with_token(routes::SCENARIOS, &valid_scenario_body("Stats"), &token)
            .await;
        let id = res.id();

        let first = app
            .post_with_token(
                &routes::scenario_stats(id),
                &json!({"completion_time_minutes": 60.0, "score": 80.0}),
                &token,
            )
            .await;
        assert_eq!(first.status, 200);
        assert_eq!(first.body["usage_count"], 1);
        assert_eq!(first.body["average_score"], 80.0);
        assert_eq!(first.body["average_completion_time"], 60.0);

        let second = app
            .post_with_token(
                &routes::scenario_stats(id),
                &json!({"completion_time_minutes": 30.0, "score": 100.0}),
                &token,
            )
            .await;
        assert_eq!(second.body["usage_count"], 2);
        assert_eq!(second.body["average_score"], 90.0);
        assert_eq!(second.body["average_completion_time"], 45.0);
    }

    #[tokio::test]
    async fn stats_do_not_bump_the_version() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let res = app
            .post_with_token(routes::SCENARIOS, &valid_scenario_body("Stable"), &token)
            .await;
        let id = res.id();

        let stats = app
            .post_with_token(
                &routes::scenario_stats(id),
                &json!({"completion_time_minutes": 10.0, "score": 50.0}),
                &token,
            )
            .await;

        assert_eq!(stats.body["version"], 1);
    }
}

mod scenario_deletion {
    use super::*;

    #[tokio::test]
    async fn deletes_and_then_404s() {
        let app = TestApp::spawn().await;
        let token = app.create_user_with_role("admin1", "pass1234", "admin").await;
        let res = app
            .post_with_token(routes::SCENARIOS, &valid_scenario_body("Doomed"), &token)
            .await;
        let id = res.id();

        let del = app.delete_with_token(&routes::scenario(id), &token).await;
        assert_eq!(del.status, 204);

        let get = app.get_with_token(&routes::scenario(id), &token).await;
        assert_eq!(get.status, 404);
    }
}
