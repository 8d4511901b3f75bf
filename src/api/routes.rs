//! REST endpoints: health, draft, refine.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::validate;
use crate::error::ApiError;
use crate::pipeline::processor::{DraftProcessor, ProcessOutcome};
use crate::pipeline::refine::RefinementOrchestrator;
use crate::pipeline::types::{CheckResult, DraftOutput, EvalMetrics};
use crate::safety;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<DraftProcessor>,
    pub orchestrator: Arc<RefinementOrchestrator>,
}

/// Build the router with all REST routes.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/draft", post(draft))
        .route("/refine", post(refine))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `/refine` response. Refinement fields appear only when `useLLM` was set.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineResponse {
    pub baseline: DraftOutput,
    pub checks_before: CheckResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refined: Option<DraftOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks_after: Option<CheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eval_after: Option<EvalMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refine_warnings: Option<Vec<String>>,
}

// ── Health ──────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

// ── Draft ───────────────────────────────────────────────────────────

async fn draft(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ProcessOutcome>, ApiError> {
    let request_id = Uuid::new_v4();
    let input = validate::json_body(body)
        .and_then(|body| validate::draft_input(&body))
        .inspect_err(|e| log_rejection(request_id, e))?;

    info!(
        %request_id,
        text_len = input.text.len(),
        tone = ?input.tone,
        has_overrides = input.overrides.is_some(),
        "Processing draft request"
    );

    let outcome = state.processor.process(&input);

    info!(
        %request_id,
        category = %outcome.meta.category,
        completeness = outcome.checks.completeness,
        professionalism = outcome.checks.professionalism,
        warning_count = outcome.checks.warnings.len(),
        "Draft processed"
    );
    Ok(Json(outcome))
}

// ── Refine ──────────────────────────────────────────────────────────

async fn refine(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RefineResponse>, ApiError> {
    let request_id = Uuid::new_v4();
    let (input, use_llm) = validate::json_body(body)
        .and_then(|body| validate::refine_input(&body))
        .inspect_err(|e| log_rejection(request_id, e))?;

    info!(
        %request_id,
        text_len = input.text.len(),
        tone = ?input.tone,
        has_overrides = input.overrides.is_some(),
        use_llm,
        "Processing refine request"
    );

    let baseline = state.processor.process(&input);
    debug!(
        %request_id,
        category = %baseline.meta.category,
        completeness = baseline.checks.completeness,
        warning_count = baseline.checks.warnings.len(),
        "Baseline processing complete"
    );

    let mut response = RefineResponse {
        baseline: baseline.draft.clone(),
        checks_before: baseline.checks.clone(),
        refined: None,
        checks_after: None,
        eval_after: None,
        refine_warnings: None,
    };

    if !use_llm {
        info!(%request_id, category = %baseline.meta.category, "Refine completed without LLM");
        return Ok(Json(response));
    }

    let result = state
        .orchestrator
        .refine(&baseline.draft, &input.tone, baseline.meta.category)
        .await;

    if result.was_refined {
        info!(
            %request_id,
            category = %baseline.meta.category,
            overall_score = result.eval_metrics.overall_score,
            "Refine completed with LLM refinement"
        );
        response.refined = Some(result.draft);
        response.checks_after = Some(result.checks);
        response.eval_after = Some(result.eval_metrics);
    } else {
        info!(
            %request_id,
            category = %baseline.meta.category,
            warning_count = result.refine_warnings.len(),
            "Refine completed with fallback"
        );
        response.refine_warnings = Some(result.refine_warnings);
    }

    Ok(Json(response))
}

fn log_rejection(request_id: Uuid, err: &ApiError) {
    let ApiError::Validation(details) = err;
    let details = serde_json::to_value(details).unwrap_or_default();
    warn!(
        %request_id,
        details = %safety::redact_value(&details),
        "Request validation failed"
    );
}
