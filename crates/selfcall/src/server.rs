//! HTTP route for running the agent

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use selfcall_agent::{AgentLoop, PersonaInvoker, RunResult};

#[derive(Clone)]
pub struct AppState {
    agent: AgentLoop<dyn PersonaInvoker>,
}

/// Build the router.
pub fn router(agent: AgentLoop<dyn PersonaInvoker>) -> Router {
    Router::new()
        .route("/api/agent", post(run_agent))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { agent })
}

async fn health() -> &'static str {
    "ok"
}

/// Goal from a `{"goal": "..."}` body; anything else counts as no goal
fn goal_from_body(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("goal").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

/// POST /api/agent - run the agent once and return its result.
async fn run_agent(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<RunResult>) {
    let goal = goal_from_body(&body);
    info!("agent request ({} chars of goal)", goal.len());

    // Dropping the handler (client gone) cancels the run
    let cancel = CancellationToken::new();
    let guard = cancel.clone().drop_guard();

    let agent = state.agent.clone();
    let task = tokio::spawn(async move { agent.run_until_cancelled(&goal, &cancel).await });
    let joined = task.await;
    guard.disarm();

    match joined {
        Ok(Some(result)) => (StatusCode::OK, Json(result)),
        Ok(None) => {
            warn!("agent run cancelled before completion");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(RunResult::crashed()))
        }
        Err(e) => {
            error!("agent task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(RunResult::crashed()))
        }
    }
}
