use crate::common::{TestApp, routes};

#[tokio::test]
async fn health_endpoint_needs_no_auth() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;

    assert!(res.status == 200 || res.status == 503, "got {}", res.status);
    let status = res.body["status"].as_str().unwrap();
    assert!(status == "ok" || status == "error");
}

#[tokio::test]
async fn health_reports_memory_and_uptime() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;

    let memory = &res.body["checks"]["memory"];
    let memory_status = memory["status"].as_str().unwrap();
    assert!(["ok", "warning", "error"].contains(&memory_status));
    assert!(memory["total"].as_u64().unwrap() > 0);
    assert!(memory["percentage"].as_u64().unwrap() <= 100);
    assert!(res.body["uptime"].as_u64().is_some());
    assert!(res.body["timestamp"].as_str().is_some());
    assert!(res.body["version"].as_str().is_some());
}

#[tokio::test]
async fn status_code_tracks_overall_status() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;

    match res.body["status"].as_str().unwrap() {
        "ok" => assert_eq!(res.status, 200),
        "error" => assert_eq!(res.status, 503),
        other => panic!("unexpected status {other}"),
    }
}
