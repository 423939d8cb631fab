use super::*;
use axum::{middleware, routing::post, Router};
use axum_test::TestServer;

const SECRET: &str = "s3cret";

fn server(dev_mode: bool) -> TestServer {
    let app = Router::new()
        .route("/events", post(|body: String| async move { body }))
        .layer(middleware::from_fn_with_state(
            SignatureState::new(SECRET, dev_mode),
            verify_signature,
        ));
    TestServer::new(app).unwrap()
}

#[test]
fn test_sign_is_deterministic() {
    let a = sign(SECRET, 1_700_000_000, b"{}").unwrap();
    let b = sign(SECRET, 1_700_000_000, b"{}").unwrap();
    assert_eq!(a, b);
    assert!(a.starts_with("v0="));
    assert_ne!(a, sign("other", 1_700_000_000, b"{}").unwrap());
}

#[tokio::test]
async fn test_valid_signature_passes_body_through() {
    let server = server(false);
    let body = r#"{"type":"member_joined"}"#;
    let timestamp = Utc::now().timestamp();

    let response = server
        .post("/events")
        .add_header(TIMESTAMP_HEADER, timestamp.to_string())
        .add_header(SIGNATURE_HEADER, sign(SECRET, timestamp, body.as_bytes()).unwrap())
        .text(body)
        .await;

    response.assert_status_ok();
    response.assert_text(body);
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let server = server(false);
    let timestamp = Utc::now().timestamp();

    let response = server
        .post("/events")
        .add_header(TIMESTAMP_HEADER, timestamp.to_string())
        .add_header(SIGNATURE_HEADER, sign(SECRET, timestamp, b"original").unwrap())
        .text("tampered")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_stale_timestamp_is_rejected() {
    let server = server(false);
    let timestamp = Utc::now().timestamp() - 3600;

    let response = server
        .post("/events")
        .add_header(TIMESTAMP_HEADER, timestamp.to_string())
        .add_header(SIGNATURE_HEADER, sign(SECRET, timestamp, b"{}").unwrap())
        .text("{}")
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_headers_are_rejected() {
    let server = server(false);

    let response = server.post("/events").text("{}").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dev_mode_skips_verification() {
    let server = server(true);

    let response = server.post("/events").text("hello").await;

    response.assert_status_ok();
    response.assert_text("hello");
}
