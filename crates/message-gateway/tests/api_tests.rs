//! Integration tests for the message gateway API.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use common::{FakeSession, Outcome, TestApp};
use message_gateway::{DeliveryPolicy, SessionSnapshot, SessionState};
use std::time::Duration;
use tower::ServiceExt;

fn send_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/send-message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_root_banner() {
    let (app, _state) = TestApp::new(FakeSession::with_outcome(Outcome::Deliver)).router();

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );

    let json = json_body(response).await;
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("Server is running"));
}

#[tokio::test]
async fn test_send_message_success() {
    let session = FakeSession::with_outcome(Outcome::Deliver);
    let (app, _state) = TestApp::new(session.clone()).router();

    let response = app
        .oneshot(send_request(
            r#"{"contact": "020 5555 1234", "message": "Sabaidee"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], "Message sent to 020 5555 1234");

    assert_eq!(
        session.sent(),
        vec![("8562055551234@c.us".to_string(), "Sabaidee".to_string())]
    );
}

#[tokio::test]
async fn test_international_contact_echoed_verbatim() {
    let session = FakeSession::with_outcome(Outcome::Deliver);
    let (app, _state) = TestApp::new(session.clone()).router();

    let response = app
        .oneshot(send_request(r#"{"contact": "8565551234", "message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["success"], "Message sent to 8565551234");
    assert_eq!(session.sent()[0].0, "8565551234@c.us");
}

#[tokio::test]
async fn test_missing_fields() {
    for body in [
        r#"{"contact": "", "message": "hi"}"#,
        r#"{"contact": "0205551234"}"#,
        r#"{"message": "hi", "contact": null}"#,
        r#"{}"#,
    ] {
        let session = FakeSession::with_outcome(Outcome::Deliver);
        let (app, _state) = TestApp::new(session.clone()).router();

        let response = app.oneshot(send_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Contact and message are required");
        assert!(session.sent().is_empty());
    }
}

#[tokio::test]
async fn test_contact_without_digits() {
    let session = FakeSession::with_outcome(Outcome::Deliver);
    let (app, _state) = TestApp::new(session.clone()).router();

    let response = app
        .oneshot(send_request(r#"{"contact": "ask reception", "message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Contact must contain at least one digit");
    assert!(session.sent().is_empty());
}

#[tokio::test]
async fn test_delivery_failure() {
    let session = FakeSession::with_outcome(Outcome::Reject("timeout".into()));
    let (app, _state) = TestApp::new(session).router();

    let response = app
        .oneshot(send_request(r#"{"contact": "8565551234", "message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Failed to send message");
    assert_eq!(json["details"], "timeout");
}

#[tokio::test]
async fn test_send_timeout() {
    let mut test_app = TestApp::new(FakeSession::with_outcome(Outcome::Hang));
    test_app.policy = DeliveryPolicy {
        send_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let (app, _state) = test_app.router();

    let response = app
        .oneshot(send_request(r#"{"contact": "8565551234", "message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["details"], "send timed out after 50ms");
}

#[tokio::test]
async fn test_readiness_policy() {
    let session = FakeSession::with_outcome(Outcome::Deliver);
    let mut test_app = TestApp::new(session.clone());
    test_app.state = SessionState::AwaitingAuthentication;
    test_app.policy = DeliveryPolicy {
        require_ready: true,
        ..Default::default()
    };
    let (app, _state) = test_app.router();

    let response = app
        .oneshot(send_request(r#"{"contact": "8565551234", "message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = json_body(response).await;
    assert_eq!(json["details"], "awaiting_authentication");
    assert!(session.sent().is_empty());
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _state) = TestApp::new(FakeSession::with_outcome(Outcome::Deliver)).router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v2/whatever")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Not Found");
}

#[tokio::test]
async fn test_wrong_method_is_not_found() {
    let (app, _state) = TestApp::new(FakeSession::with_outcome(Outcome::Deliver)).router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/send-message")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_in_production() {
    let session = FakeSession::with_outcome(Outcome::Deliver);
    let (app, _state) = TestApp::new(session.clone()).router();

    let response = app
        .oneshot(send_request(r#"{"contact": "0205551234", "#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert!(!json["message"].as_str().unwrap().is_empty());
    assert_eq!(json["stack"], "🥞");
    assert!(session.sent().is_empty());
}

#[tokio::test]
async fn test_malformed_json_in_development() {
    let mut test_app = TestApp::new(FakeSession::with_outcome(Outcome::Deliver));
    test_app.node_env = "development";
    let (app, _state) = test_app.router();

    let response = app
        .oneshot(send_request(r#"{"contact": 205551234, "message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_ne!(json["stack"], "🥞");
    assert!(json["stack"].as_str().unwrap().contains("invalid type"));
}

#[tokio::test]
async fn test_body_without_json_content_type_fails_validation() {
    let session = FakeSession::with_outcome(Outcome::Deliver);
    let (app, _state) = TestApp::new(session.clone()).router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/send-message")
                .body(Body::from(r#"{"contact": "1", "message": "hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Contact and message are required");
    assert!(session.sent().is_empty());
}

#[tokio::test]
async fn test_empty_json_body_fails_validation() {
    let session = FakeSession::with_outcome(Outcome::Deliver);
    let (app, _state) = TestApp::new(session.clone()).router();

    let response = app.oneshot(send_request("")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"], "Contact and message are required");
    assert!(session.sent().is_empty());
}

#[tokio::test]
async fn test_json_content_type_with_charset() {
    let session = FakeSession::with_outcome(Outcome::Deliver);
    let (app, _state) = TestApp::new(session.clone()).router();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/send-message")
                .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
                .body(Body::from(r#"{"contact": "8565551234", "message": "hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(session.sent().len(), 1);
}

#[tokio::test]
async fn test_panic_becomes_fault() {
    let (app, _state) = TestApp::new(FakeSession::with_outcome(Outcome::Panic)).router();

    let response = app
        .oneshot(send_request(r#"{"contact": "8565551234", "message": "hi"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["message"], "bridge exploded");
    assert_eq!(json["stack"], "🥞");
}

#[tokio::test]
async fn test_session_status() {
    let mut test_app = TestApp::new(FakeSession::with_outcome(Outcome::Deliver));
    test_app.state = SessionState::AuthFailed;
    let (app, _state) = test_app.router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["state"], "auth_failed");
    assert!(json["changed_at"].is_string());
}

#[tokio::test]
async fn test_session_status_shows_pending_pairing_code() {
    let (app, state) = TestApp::new(FakeSession::with_outcome(Outcome::Deliver)).router();
    state.send_replace(SessionSnapshot {
        pairing_code: Some("2@abc,def".into()),
        ..SessionSnapshot::new(SessionState::AwaitingAuthentication)
    });

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/session")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = json_body(response).await;
    assert_eq!(json["state"], "awaiting_authentication");
    assert_eq!(json["pairing_code"], "2@abc,def");
}
