//! Integration tests for the REST API.
//!
//! Each test spins up an Axum server on a random port and exercises the
//! real HTTP contract with reqwest.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use email_drafter::api::{AppState, api_routes};
use email_drafter::config::DraftResources;
use email_drafter::error::LlmError;
use email_drafter::llm::provider::{CompletionRequest, CompletionResponse, LlmProvider};
use email_drafter::pipeline::processor::{DraftProcessor, DraftStrategy};
use email_drafter::pipeline::refine::RefinementOrchestrator;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const REFINED_EMAIL: &str = "===EMAIL===
Subject: Coffee chat request

Hello [Recipient Name],

I enjoyed learning about your work and would value your perspective.

Would you be open to a short call next week?

Best regards,
[Your Name]

===EVAL===
Tighter and clearer.";

/// Stub provider: answers with a fixed text, or fails.
struct StubLlm {
    reply: Option<&'static str>,
}

#[async_trait]
impl LlmProvider for StubLlm {
    fn model_name(&self) -> &str {
        "stub"
    }

    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        match self.reply {
            Some(text) => Ok(CompletionResponse::text(text)),
            None => Err(LlmError::RequestFailed {
                provider: "stub".to_string(),
                reason: "unreachable".to_string(),
            }),
        }
    }
}

/// Start an Axum server on a random port, return the port.
async fn start_server(reply: Option<&'static str>) -> u16 {
    let resources = Arc::new(DraftResources::builtin().unwrap());
    let state = AppState {
        processor: Arc::new(DraftProcessor::new(
            Arc::clone(&resources),
            DraftStrategy::Generate,
        )),
        orchestrator: Arc::new(RefinementOrchestrator::new(
            Arc::new(StubLlm { reply }),
            resources,
        )),
    };
    let app = api_routes(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    port
}

fn draft_body(text: &str) -> Value {
    json!({
        "text": text,
        "tone": {"formality": 3, "confidence": 3, "seniority": "student", "length": "medium"}
    })
}

async fn post(port: u16, path: &str, body: &Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("http://127.0.0.1:{port}{path}"))
        .json(body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

// ── Health ──────────────────────────────────────────────────────────

#[tokio::test]
async fn healthz_returns_ok() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(None).await;

        let resp = reqwest::get(format!("http://127.0.0.1:{port}/healthz"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body, json!({"ok": true}));
    })
    .await
    .expect("test timed out");
}

// ── Draft ───────────────────────────────────────────────────────────

#[tokio::test]
async fn draft_returns_draft_checks_and_meta() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(None).await;

        let (status, body) = post(
            port,
            "/draft",
            &draft_body("Thank you so much for taking the time to interview me yesterday."),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["meta"]["category"], "thankyou");
        assert!(
            body["meta"]["matchedRules"]
                .as_array()
                .unwrap()
                .contains(&json!("thank you"))
        );
        assert_eq!(body["checks"]["completeness"], true);
        assert!(body["draft"]["bodySections"].as_array().unwrap().len() >= 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn draft_rejects_invalid_body() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(None).await;

        let body = json!({
            "text": "",
            "tone": {"formality": 0, "confidence": 3, "seniority": "student", "length": "medium"}
        });
        let (status, body) = post(port, "/draft", &body).await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], "Validation failed");

        let paths: Vec<&str> = body["details"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|d| d["path"].as_str())
            .collect();
        assert_eq!(paths, vec!["text", "tone.formality"]);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn draft_rejects_unreadable_body_as_json() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(None).await;
        let client = reqwest::Client::new();
        let url = format!("http://127.0.0.1:{port}/draft");

        let malformed = client
            .post(&url)
            .header("content-type", "application/json")
            .body("{\"text\": ")
            .send()
            .await
            .unwrap();
        let no_content_type = client
            .post(&url)
            .body(draft_body("Coffee chat?").to_string())
            .send()
            .await
            .unwrap();

        for resp in [malformed, no_content_type] {
            assert_eq!(resp.status(), 400);
            let body: Value = resp.json().await.unwrap();
            assert_eq!(body["error"], "Validation failed");
            assert_eq!(body["details"][0]["path"], "");
            assert!(!body["details"][0]["message"].as_str().unwrap().is_empty());
        }
    })
    .await
    .expect("test timed out");
}

// ── Refine ──────────────────────────────────────────────────────────

#[tokio::test]
async fn refine_without_llm_returns_baseline_only() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(Some(REFINED_EMAIL)).await;

        let (status, body) = post(port, "/refine", &draft_body("Can we grab coffee next week?")).await;
        assert_eq!(status, 200);
        let obj = body.as_object().unwrap();
        assert!(obj.contains_key("baseline"));
        assert!(obj.contains_key("checksBefore"));
        assert!(!obj.contains_key("refined"));
        assert!(!obj.contains_key("refineWarnings"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn refine_with_llm_returns_refined_draft() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(Some(REFINED_EMAIL)).await;

        let mut body = draft_body("Can we grab coffee next week?");
        body["useLLM"] = json!(true);
        let (status, body) = post(port, "/refine", &body).await;
        assert_eq!(status, 200);
        assert_eq!(body["refined"]["subject"], "Coffee chat request");
        assert_eq!(body["refined"]["closing"], "[Your Name]");
        assert!(body.get("checksAfter").is_some());
        assert!(body["evalAfter"]["overallScore"].as_u64().unwrap() <= 100);
        assert!(body.get("refineWarnings").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn refine_with_failing_llm_falls_back() {
    timeout(TEST_TIMEOUT, async {
        let port = start_server(None).await;

        let mut body = draft_body("Can we grab coffee next week?");
        body["useLLM"] = json!(true);
        let (status, body) = post(port, "/refine", &body).await;
        assert_eq!(status, 200);
        assert_eq!(
            body["refineWarnings"],
            json!(["LLM service unavailable or failed"])
        );
        assert!(body.get("refined").is_none());
        assert!(body.get("baseline").is_some());
    })
    .await
    .expect("test timed out");
}
