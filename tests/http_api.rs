//! HTTP API tests against in-memory adapters.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use chat_relay::adapters::auth::MockSessionValidator;
use chat_relay::adapters::http::{app_router, AppServices, RouterSettings};
use chat_relay::adapters::{
    InMemoryEventBus, InMemoryMessageStore, InMemoryPresenceStore, InMemoryUserDirectory,
};
use chat_relay::application::realtime::SessionSettings;
use chat_relay::application::{ConnectionRegistry, DeliveryCoordinator};
use chat_relay::domain::chat::{ChannelName, ChatEvent, UserSummary};
use chat_relay::domain::foundation::UserId;

fn uid(id: i64) -> UserId {
    UserId::new(id).unwrap()
}

struct TestApp {
    router: Router,
    bus: Arc<InMemoryEventBus>,
    messages: Arc<InMemoryMessageStore>,
}

fn test_app() -> TestApp {
    let bus = Arc::new(InMemoryEventBus::new());
    let messages = Arc::new(InMemoryMessageStore::new());
    let users = Arc::new(InMemoryUserDirectory::with_users([
        UserSummary::new(uid(1), "alice"),
        UserSummary::new(uid(2), "bob"),
        UserSummary::new(uid(3), "carol"),
    ]));
    let presence = Arc::new(InMemoryPresenceStore::new().with_online([uid(1), uid(2)]));
    let validator = Arc::new(
        MockSessionValidator::new()
            .with_test_user("alice-token", 1, "alice")
            .with_test_user("bob-token", 2, "bob"),
    );

    let coordinator = Arc::new(DeliveryCoordinator::new(
        Arc::new(ConnectionRegistry::new()),
        presence,
        bus.clone(),
        messages.clone(),
        users.clone(),
    ));

    let router = app_router(
        AppServices {
            coordinator,
            messages: messages.clone(),
            users,
            validator,
            session: SessionSettings::default(),
        },
        &RouterSettings::default(),
    );

    TestApp {
        router,
        bus,
        messages,
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn call(app: &TestApp, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn send(app: &TestApp, token: &str, receiver_id: i64, content: &str) -> (StatusCode, Value) {
    call(
        app,
        request(
            Method::POST,
            "/messages",
            Some(token),
            Some(json!({"receiver_id": receiver_id, "content": content})),
        ),
    )
    .await
}

#[tokio::test]
async fn health_reports_local_connections() {
    let app = test_app();

    let (status, body) = call(&app, request(Method::GET, "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok", "connections": 0}));
}

#[tokio::test]
async fn api_requires_bearer_token() {
    let app = test_app();

    let (status, body) =
        call(&app, request(Method::GET, "/messages/unread-count", None, None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn post_message_persists_and_publishes_to_receiver() {
    let app = test_app();

    let (status, body) = send(&app, "alice-token", 2, "hi").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["content"], "hi");
    assert_eq!(body["sender_username"], "alice");
    assert_eq!(body["receiver_username"], "bob");
    assert_eq!(body["is_read"], false);

    assert_eq!(app.messages.message_count().await, 1);
    let delivered = app.bus.events_on(&ChannelName::user(uid(2)));
    assert_eq!(delivered.len(), 1);
    assert!(matches!(&delivered[0], ChatEvent::Message(m) if m.content == "hi"));
}

#[tokio::test]
async fn post_message_to_self_is_bad_request() {
    let app = test_app();

    let (status, body) = send(&app, "alice-token", 1, "me").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_REQUEST");
    assert_eq!(app.messages.message_count().await, 0);
}

#[tokio::test]
async fn post_message_to_unknown_user_is_not_found() {
    let app = test_app();

    let (status, _) = send(&app, "alice-token", 99, "anyone?").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(app.bus.event_count(), 0);
}

#[tokio::test]
async fn conversation_fetch_marks_received_messages_read() {
    let app = test_app();
    send(&app, "alice-token", 2, "one").await;
    send(&app, "alice-token", 2, "two").await;

    let (_, unread) = call(
        &app,
        request(Method::GET, "/messages/unread-count", Some("bob-token"), None),
    )
    .await;
    assert_eq!(unread, json!({"unread_count": 2}));

    let (status, history) = call(
        &app,
        request(Method::GET, "/messages/conversation/1", Some("bob-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let contents: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["two", "one"]);

    let (_, unread) = call(
        &app,
        request(Method::GET, "/messages/unread-count", Some("bob-token"), None),
    )
    .await;
    assert_eq!(unread, json!({"unread_count": 0}));
}

#[tokio::test]
async fn conversation_with_unknown_user_is_not_found() {
    let app = test_app();

    let (status, body) = call(
        &app,
        request(Method::GET, "/messages/conversation/99", Some("alice-token"), None),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn conversation_rejects_oversized_page() {
    let app = test_app();

    let (status, _) = call(
        &app,
        request(
            Method::GET,
            "/messages/conversation/2?limit=500",
            Some("alice-token"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mark_read_only_for_receiver() {
    let app = test_app();
    let (_, sent) = send(&app, "alice-token", 2, "read me").await;
    let id = sent["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        request(Method::PUT, &format!("/messages/{}/read", id), Some("alice-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "MESSAGE_NOT_FOUND");

    let (status, body) = call(
        &app,
        request(Method::PUT, &format!("/messages/{}/read", id), Some("bob-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Message marked as read"}));
}

#[tokio::test]
async fn search_finds_substring_case_insensitively() {
    let app = test_app();
    send(&app, "alice-token", 2, "Lunch at noon?").await;
    send(&app, "bob-token", 1, "sure").await;

    let (status, results) = call(
        &app,
        request(Method::GET, "/messages/search?q=lunch", Some("bob-token"), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["content"], "Lunch at noon?");
}

#[tokio::test]
async fn search_with_blank_query_is_rejected() {
    let app = test_app();

    let (status, body) = call(
        &app,
        request(Method::GET, "/messages/search?q=%20", Some("alice-token"), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn online_users_excludes_caller() {
    let app = test_app();

    let (status, body) = call(
        &app,
        request(Method::GET, "/users/online", Some("alice-token"), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([{"id": 2, "username": "bob", "is_online": true}])
    );
}

#[tokio::test]
async fn user_list_excludes_caller_and_reports_presence() {
    let app = test_app();

    let (status, body) = call(&app, request(Method::GET, "/users", Some("alice-token"), None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": 2, "username": "bob", "is_online": true},
            {"id": 3, "username": "carol", "is_online": false}
        ])
    );
}

#[tokio::test]
async fn user_lookup_by_id() {
    let app = test_app();

    let (status, body) = call(
        &app,
        request(Method::GET, "/users/3", Some("alice-token"), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 3, "username": "carol", "is_online": false}));
}

#[tokio::test]
async fn user_lookup_of_unknown_id_is_not_found() {
    let app = test_app();

    let (status, body) = call(
        &app,
        request(Method::GET, "/users/99", Some("alice-token"), None),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn user_endpoints_require_bearer_token() {
    let app = test_app();

    for uri in ["/users", "/users/2"] {
        let (status, _) = call(&app, request(Method::GET, uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
    }
}
