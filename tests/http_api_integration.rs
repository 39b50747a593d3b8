//! Integration tests for request validation, error shapes and the store
//! endpoints

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::spawn_board;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let board = spawn_board().await;

    for uri in ["/functions/v1/chat", "/functions/v1/meta"] {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from("{\"message\": "))
            .unwrap();
        let (status, body) = board.send(request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "Invalid JSON in request body", "success": false})
        );
    }
}

#[tokio::test]
async fn test_chat_requires_message_and_conversation() {
    let board = spawn_board().await;
    let conv = board.conversation("Pflichtfelder");

    for payload in [
        json!({}),
        json!({"message": "Hallo"}),
        json!({"conversation_id": conv}),
        json!({"message": "   ", "conversation_id": conv}),
    ] {
        let (status, body) = board
            .request("POST", "/functions/v1/chat", Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message and conversation_id are required");
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_meta_requires_conversation_id() {
    let board = spawn_board().await;
    let (status, body) = board
        .request("POST", "/functions/v1/meta", Some(json!({"categories": []})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "conversation_id is required");
}

#[tokio::test]
async fn test_unknown_conversation_is_not_found() {
    let board = spawn_board().await;

    let (status, body) = board
        .request(
            "POST",
            "/functions/v1/chat",
            Some(json!({"message": "Hallo", "conversation_id": "does-not-exist"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Conversation does-not-exist not found");

    let (status, _) = board
        .request(
            "POST",
            "/functions/v1/meta",
            Some(json!({"conversation_id": "does-not-exist"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = board
        .request("GET", "/api/conversations/does-not-exist/points", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cors_preflight_is_answered() {
    let board = spawn_board().await;
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/functions/v1/chat")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type,x-client-info")
        .body(Body::empty())
        .unwrap();

    let response = board.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    let allowed = headers["access-control-allow-headers"].to_str().unwrap();
    assert!(allowed.contains("x-client-info"));
    assert!(allowed.contains("apikey"));
}

#[tokio::test]
async fn test_conversation_lifecycle() {
    let board = spawn_board().await;

    let (status, created) = board
        .request("POST", "/api/conversations", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["title"], "Neue Unterhaltung");
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let (status, named) = board
        .request("POST", "/api/conversations", None)
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(named["data"]["title"], "Neue Unterhaltung");

    let (status, renamed) = board
        .request(
            "PATCH",
            &format!("/api/conversations/{}", id),
            Some(json!({"title": "Architektur"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["data"]["title"], "Architektur");

    let (_, listed) = board.request("GET", "/api/conversations", None).await;
    let titles: Vec<&str> = listed["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(titles.contains(&"Architektur"));

    let (status, deleted) = board
        .request("DELETE", &format!("/api/conversations/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["data"]["id"], json!(id));

    let (status, _) = board
        .request("GET", &format!("/api/conversations/{}/messages", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = board
        .request("DELETE", &format!("/api/conversations/{}", id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rename_requires_title() {
    let board = spawn_board().await;
    let conv = board.conversation("Alt");

    let (status, body) = board
        .request(
            "PATCH",
            &format!("/api/conversations/{}", conv),
            Some(json!({"title": ""})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "title is required");
}

#[tokio::test]
async fn test_health() {
    let board = spawn_board().await;
    let (status, body) = board.request("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["model"], "gpt-4o-mini");
}

#[tokio::test]
async fn test_wrong_method_uses_error_body() {
    let board = spawn_board().await;

    for uri in ["/functions/v1/chat", "/functions/v1/meta"] {
        let (status, body) = board.request("GET", uri, None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            body,
            json!({"error": "Method GET not allowed", "success": false})
        );
    }
}

#[tokio::test]
async fn test_unknown_route_uses_error_body() {
    let board = spawn_board().await;

    let (status, body) = board.request("GET", "/api/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({"error": "Route /api/unknown not found", "success": false})
    );
}

#[tokio::test]
async fn test_bad_query_string_is_validation_error() {
    let board = spawn_board().await;
    let conv = board.conversation("Abfrage");

    let (status, body) = board
        .request("GET", &format!("/api/conversations/{}/points?hidden=yes", conv), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to deserialize query string"));

    let (status, body) = board
        .request("GET", &format!("/api/conversations/{}/points?hidden=true", conv), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}
