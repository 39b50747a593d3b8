use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coboard::board::BoardService;
use coboard::config::Config;
use coboard::providers::create_provider;
use coboard::server::build_router;
use coboard::storage::SqliteStorage;

/// A board wired to a mock completion API and a temporary database
#[allow(dead_code)]
pub struct TestBoard {
    pub service: Arc<BoardService>,
    pub router: Router,
    pub api: MockServer,
    pub tmp: TempDir,
}

#[allow(dead_code)]
impl TestBoard {
    pub fn storage(&self) -> &SqliteStorage {
        self.service.storage()
    }

    /// Send one request through the router and decode the JSON body
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        let request = match body {
            Some(body) => builder.body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.send(request).await
    }

    /// Send a prepared request through the router
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response is not JSON")
        };
        (status, value)
    }

    /// Create a conversation directly in the store
    pub fn conversation(&self, title: &str) -> String {
        self.storage()
            .create_conversation(title)
            .expect("failed to create conversation")
            .id
    }
}

#[allow(dead_code)]
pub fn test_config(api_base: &str, tmp: &TempDir) -> Config {
    let mut config = Config::default();
    config.server.bind_addr = "127.0.0.1:0".to_string();
    config.provider.api_base = api_base.to_string();
    config.provider.api_key = Some("test-key".to_string());
    config.provider.timeout_seconds = 5;
    config.storage.db_path = Some(tmp.path().join("board.db").to_string_lossy().to_string());
    config
}

#[allow(dead_code)]
pub async fn spawn_board() -> TestBoard {
    let api = MockServer::start().await;
    let tmp = TempDir::new().expect("failed to create tempdir");
    let config = test_config(&api.uri(), &tmp);

    let storage = SqliteStorage::from_config(&config.storage).expect("failed to open storage");
    let provider = create_provider(&config.provider).expect("failed to create provider");
    let service = Arc::new(BoardService::new(config, storage, provider));
    let router = build_router(service.clone());

    TestBoard {
        service,
        router,
        api,
        tmp,
    }
}

/// A chat completions response body carrying `content`
#[allow(dead_code)]
pub fn completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

fn completion_mock(options: Value, content: &str) -> Mock {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(options))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
}

/// Answer chat turns (temperature 0.7, max_tokens 1000)
#[allow(dead_code)]
pub async fn mount_chat_reply(api: &MockServer, content: &str) {
    completion_mock(json!({"temperature": 0.7, "max_tokens": 1000}), content)
        .mount(api)
        .await;
}

/// Answer summary requests (max_tokens 400)
#[allow(dead_code)]
pub async fn mount_summary_reply(api: &MockServer, content: &str) {
    completion_mock(json!({"max_tokens": 400}), content)
        .mount(api)
        .await;
}

/// Answer meta-analysis requests (temperature 0.3, max_tokens 1000)
#[allow(dead_code)]
pub async fn mount_meta_reply(api: &MockServer, content: &str) {
    completion_mock(json!({"temperature": 0.3, "max_tokens": 1000}), content)
        .mount(api)
        .await;
}

/// Bodies of every completion request the mock API received
#[allow(dead_code)]
pub async fn received_bodies(api: &MockServer) -> Vec<Value> {
    api.received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).expect("request body is not JSON"))
        .collect()
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
