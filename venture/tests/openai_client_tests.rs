use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use venture::config::{LlmSettings, ProviderKind};
use venture::llm::{parse_outcome, GenerationClient, OpenAiGenerationClient};
use venture::prompt::{Prompt, Tone};
use venture::GenerationError;

const OUTCOME: &str = r#"{"metrics":{"feasibility":64,"desirability":71,"viability":58},"analysis":{"milestones":["Pilot with two banks"],"revenue":90000}}"#;

async fn completions_ok(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer sk-local");
    if !authorized || body["response_format"]["type"] != "json_object" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "bad request shape" })));
    }
    (
        StatusCode::OK,
        Json(json!({
            "choices": [{ "message": { "content": OUTCOME }, "finish_reason": "stop" }]
        })),
    )
}

async fn completions_rate_limited() -> (StatusCode, &'static str) {
    (StatusCode::TOO_MANY_REQUESTS, "slow down")
}

async fn completions_null_content() -> Json<Value> {
    Json(json!({ "choices": [{ "message": { "content": null }, "finish_reason": "stop" }] }))
}

async fn completions_no_choices() -> Json<Value> {
    Json(json!({ "choices": [] }))
}

async fn completions_missing_choices() -> Json<Value> {
    Json(json!({ "id": "chatcmpl-1" }))
}

/// Local chat-completions endpoint; each path prefix plays one scenario.
async fn start_upstream() -> String {
    let app = Router::new()
        .route("/ok/chat/completions", post(completions_ok))
        .route("/limited/chat/completions", post(completions_rate_limited))
        .route("/null/chat/completions", post(completions_null_content))
        .route("/empty/chat/completions", post(completions_no_choices))
        .route("/missing/chat/completions", post(completions_missing_choices));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await });
    format!("http://{}", addr)
}

fn client_for(base: &str, scenario: &str) -> OpenAiGenerationClient {
    OpenAiGenerationClient::new(LlmSettings {
        provider: ProviderKind::OpenAi,
        api_key: Some("sk-local".to_string()),
        base_url: Some(format!("{}/{}/", base, scenario)),
        timeout_seconds: 5,
        ..LlmSettings::default()
    })
    .unwrap()
}

fn prompt() -> Prompt {
    Prompt {
        year: 1,
        tone: Tone::Realistic,
        system: "You are a neutral startup analyst.".to_string(),
        user: "Simulate year 1 of 5.".to_string(),
    }
}

#[tokio::test]
async fn test_successful_completion_returns_content() {
    let base = start_upstream().await;
    let content = client_for(&base, "ok").generate(&prompt()).await.unwrap();
    let outcome = parse_outcome(&content).unwrap();
    assert_eq!(outcome.metrics.viability, 58);
    assert_eq!(outcome.analysis.customer_base, 0);
}

#[tokio::test]
async fn test_non_success_status_is_upstream_error() {
    let base = start_upstream().await;
    match client_for(&base, "limited").generate(&prompt()).await {
        Err(GenerationError::Upstream { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_absent_content_is_no_content() {
    let base = start_upstream().await;
    for scenario in ["null", "empty", "missing"] {
        let result = client_for(&base, scenario).generate(&prompt()).await;
        assert!(
            matches!(result, Err(GenerationError::NoContent)),
            "scenario {}: {:?}",
            scenario,
            result
        );
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_http_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let result = client_for(&base, "ok").generate(&prompt()).await;
    assert!(matches!(result, Err(GenerationError::Http(_))), "{:?}", result);
}
