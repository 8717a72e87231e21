//! Router tests driven through `tower::ServiceExt::oneshot` with a scripted agent.

use std::fs::File;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tracing_appender::non_blocking::WorkerGuard;
use triage_core::{AgentError, Content, ContentBlock, Message};
use triage_llm::{AgentResponse, CompletionAgent};
use triage_monitor::MetricsRegistry;

use crate::{build_router, AccessLog, ServerState};

enum Script {
    Reply(Content),
    Fail,
    Empty,
}

struct ScriptedAgent {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedAgent {
    fn new(script: Script) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionAgent for ScriptedAgent {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, mut messages: Vec<Message>) -> Result<AgentResponse, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Reply(content) => {
                messages.push(Message::assistant(content.clone()));
                Ok(AgentResponse { messages, usage: None })
            }
            Script::Fail => Err(AgentError::Http("connection refused".into())),
            Script::Empty => Ok(AgentResponse { messages: vec![], usage: None }),
        }
    }
}

struct TestApp {
    router: Router,
    agent: Arc<ScriptedAgent>,
    access_guard: WorkerGuard,
    log_dir: tempfile::TempDir,
}

impl TestApp {
    fn new(script: Script) -> Self {
        let log_dir = tempfile::tempdir().unwrap();
        let file = File::create(log_dir.path().join("access.log")).unwrap();
        let (access_log, access_guard) = AccessLog::from_writer(file);

        let agent = ScriptedAgent::new(script);
        let state = Arc::new(ServerState::new(
            agent.clone(),
            MetricsRegistry::new().unwrap(),
        ));

        Self {
            router: build_router(state, access_log),
            agent,
            access_guard,
            log_dir,
        }
    }

    fn replying(text: &str) -> Self {
        Self::new(Script::Reply(Content::Text(text.into())))
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn get(&self, uri: &str) -> (StatusCode, String) {
        self.send(
            Request::builder()
                .uri(uri)
                .method(Method::GET)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.get(uri).await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn post_raw(&self, body: &str) -> (StatusCode, Value) {
        let (status, body) = self
            .send(
                Request::builder()
                    .uri("/completion")
                    .method(Method::POST)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        (status, serde_json::from_str(&body).unwrap())
    }

    async fn post_completion(&self, body: Value) -> (StatusCode, Value) {
        self.post_raw(&body.to_string()).await
    }
}

#[tokio::test]
async fn test_health_is_always_healthy() {
    let app = TestApp::new(Script::Fail);

    for _ in 0..3 {
        let (status, body) = app.get_json("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "healthy" }));
    }

    let (_, history) = app.get_json("/history").await;
    assert_eq!(history, json!({ "count": 0, "history": [] }));
}

#[tokio::test]
async fn test_completion_returns_last_message_and_records_prompt() {
    let app = TestApp::replying("Root cause: OOM");

    let (status, body) = app
        .post_completion(json!({ "prompt": "why did service X crash" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "completion": "Root cause: OOM" }));

    let (status, history) = app.get_json("/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        history,
        json!({
            "count": 1,
            "history": [{ "role": "user", "content": "why did service X crash" }]
        })
    );
    assert_eq!(app.agent.calls(), 1);
}

#[tokio::test]
async fn test_missing_prompt_is_rejected() {
    let app = TestApp::replying("unused");

    for body in [json!({}), json!({ "prompt": "" }), json!({ "prompt": null })] {
        let (status, resp) = app.post_completion(body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(resp, json!({ "error": "Prompt is required" }));
    }

    let (_, history) = app.get_json("/history").await;
    assert_eq!(history, json!({ "count": 0, "history": [] }));
    assert_eq!(app.agent.calls(), 0);
}

#[tokio::test]
async fn test_body_without_json_content_type_is_treated_as_empty() {
    let app = TestApp::replying("unused");

    let (status, body) = app
        .send(
            Request::builder()
                .uri("/completion")
                .method(Method::POST)
                .body(Body::from("prompt=hello"))
                .unwrap(),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({ "error": "Prompt is required" })
    );
    assert_eq!(app.agent.calls(), 0);
}

#[tokio::test]
async fn test_malformed_json_is_a_client_error() {
    let app = TestApp::replying("unused");

    let (status, body) = app.post_raw("{\"prompt\": ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = app.post_completion(json!({ "prompt": 42 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Prompt must be a string" }));
    assert_eq!(app.agent.calls(), 0);
}

#[tokio::test]
async fn test_empty_body_and_falsy_prompts_read_as_missing() {
    let app = TestApp::replying("unused");

    for raw in ["", "  \n", r#"{"prompt":false}"#, r#"{"prompt":0}"#] {
        let (status, body) = app.post_raw(raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", raw);
        assert_eq!(body, json!({ "error": "Prompt is required" }), "body {:?}", raw);
    }
    assert_eq!(app.agent.calls(), 0);
}

#[tokio::test]
async fn test_backend_failure_maps_to_bad_gateway() {
    let app = TestApp::new(Script::Fail);

    let (status, body) = app.post_completion(json!({ "prompt": "disk full?" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));

    let (_, history) = app.get_json("/history").await;
    assert_eq!(history["count"], 0);

    let (status, _) = app.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_empty_agent_response_maps_to_bad_gateway() {
    let app = TestApp::new(Script::Empty);

    let (status, body) = app.post_completion(json!({ "prompt": "anything" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({ "error": "agent returned no messages" }));
}

#[tokio::test]
async fn test_block_content_is_passed_through() {
    let app = TestApp::new(Script::Reply(Content::Blocks(vec![
        ContentBlock::Text { text: "Root cause: ".into() },
        ContentBlock::Text { text: "OOM".into() },
    ])));

    let (status, body) = app.post_completion(json!({ "prompt": "why?" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "completion": [
                { "type": "text", "text": "Root cause: " },
                { "type": "text", "text": "OOM" }
            ]
        })
    );
}

#[tokio::test]
async fn test_history_preserves_append_order() {
    let app = TestApp::replying("ack");

    for prompt in ["first", "second", "third"] {
        let (status, _) = app.post_completion(json!({ "prompt": prompt })).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, history) = app.get_json("/history").await;
    assert_eq!(history["count"], 3);
    let prompts: Vec<&str> = history["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["content"].as_str().unwrap())
        .collect();
    assert_eq!(prompts, ["first", "second", "third"]);

    let (_, again) = app.get_json("/history").await;
    assert_eq!(again, history);
}

#[tokio::test]
async fn test_metrics_expose_process_and_request_counters() {
    let app = TestApp::replying("Root cause: OOM");

    app.get("/health").await;
    app.post_completion(json!({ "prompt": "why?" })).await;
    app.post_completion(json!({})).await;
    app.get("/does-not-exist").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();

    assert!(text.contains("process_uptime_seconds"));
    assert!(text.contains(
        r#"http_requests_total{method="GET",route="/health",status_code="200"} 1"#
    ));
    assert!(text.contains(
        r#"http_requests_total{method="POST",route="/completion",status_code="200"} 1"#
    ));
    assert!(text.contains(
        r#"http_requests_total{method="POST",route="/completion",status_code="400"} 1"#
    ));
    assert!(text.contains(
        r#"http_requests_total{method="GET",route="unmatched",status_code="404"} 1"#
    ));
}

#[tokio::test]
async fn test_access_log_writes_one_line_per_request() {
    let app = TestApp::replying("ok");

    app.get("/health").await;
    app.post_completion(json!({ "prompt": "hi" })).await;

    let TestApp {
        router,
        access_guard,
        log_dir,
        ..
    } = app;
    drop(router);
    drop(access_guard);

    let contents = std::fs::read_to_string(log_dir.path().join("access.log")).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("- - - ["));
    assert!(lines[0].contains("\"GET /health HTTP/1.1\" 200"));
    assert!(lines[1].contains("\"POST /completion HTTP/1.1\" 200"));
}
