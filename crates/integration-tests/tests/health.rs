//! Liveness and readiness endpoints.

use storepulse_integration_tests::TestApp;

#[tokio::test]
async fn test_health_is_ok_without_backend() {
    let app = TestApp::spawn().await;

    let page = app.get("/health").await;
    assert!(page.status.is_success());
    assert_eq!(page.body, "ok");
}

#[tokio::test]
async fn test_readiness_follows_backend() {
    let mut app = TestApp::spawn().await;

    // mockito answers unmatched requests with 501
    let page = app.get("/health/ready").await;
    assert_eq!(page.status, reqwest::StatusCode::SERVICE_UNAVAILABLE);

    let _health = app
        .backend
        .mock("GET", "/health")
        .with_body("ok")
        .create_async()
        .await;
    let page = app.get("/health/ready").await;
    assert!(page.status.is_success());
}
