//! Integration tests for the REST client against a mock backend.

#![cfg(feature = "transport")]

use parley_client::{
    RoomId,
    api::{ApiClient, ApiError},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path, query_param},
};

async fn logged_in(server: &MockServer) -> ApiClient {
    Mock::given(method("POST"))
        .and(path("/api/token/login/"))
        .and(body_json(json!({"username": "me", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"token": "tok", "user": {"id": 3, "username": "me"}})),
        )
        .mount(server)
        .await;

    let mut api = ApiClient::new(&server.uri()).unwrap();
    let login = api.login("me", "pw").await.unwrap();
    assert_eq!(login.user.id, 3);
    api
}

#[tokio::test]
async fn login_stores_token() {
    let server = MockServer::start().await;
    let api = logged_in(&server).await;
    assert_eq!(api.token(), Some("tok"));
}

#[tokio::test]
async fn send_message_posts_with_bearer_token() {
    let server = MockServer::start().await;
    let api = logged_in(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/chat/message"))
        .and(header("authorization", "Bearer tok"))
        .and(body_json(json!({"recipient_id": 7, "content": "hello"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12,
            "content": "hello",
            "timestamp": "2024-01-01 10:00:00+00:00",
            "sender": {"id": 3, "username": "me"},
            "room": "3_7",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = api.send_message(7, "hello").await.unwrap();

    assert_eq!(record.id, 12);
    assert_eq!(record.message, "hello");
    assert_eq!(record.sender_username(), "me");
}

#[tokio::test]
async fn user_lookup_by_id() {
    let server = MockServer::start().await;
    let api = logged_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/user/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 7, "username": "peer7"})),
        )
        .mount(&server)
        .await;

    let user = api.user(7).await.unwrap();
    assert_eq!(user.username, "peer7");
}

#[tokio::test]
async fn history_uses_room_query() {
    let server = MockServer::start().await;
    let api = logged_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/chat/messages"))
        .and(query_param("room_name", "3_7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "content": "hi", "sender": {"id": 7, "username": "peer7"}, "room": "3_7"},
        ])))
        .mount(&server)
        .await;

    let records = api.messages(&RoomId::between(7, 3)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sender_username(), "peer7");
}

#[tokio::test]
async fn expired_token_is_unauthorized() {
    let server = MockServer::start().await;
    let api = logged_in(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/user/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    assert!(matches!(api.users().await, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn server_error_keeps_status_and_body() {
    let server = MockServer::start().await;
    let api = logged_in(&server).await;

    Mock::given(method("POST"))
        .and(path("/api/chat/message"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such user"))
        .mount(&server)
        .await;

    let err = api.send_message(42, "hi").await.unwrap_err();
    let ApiError::Status { status, body } = err else {
        panic!("expected status error, got {err:?}");
    };
    assert_eq!(status.as_u16(), 404);
    assert_eq!(body, "no such user");
}
