//! Task protocol server.
//!
//! A JSON-RPC 2.0 endpoint at `POST /` with four methods: `message/send`,
//! `message/stream` (SSE), `tasks/get` and `tasks/cancel` (always
//! rejected, tasks here run to a terminal state within one exchange).
//! `GET /.well-known/agent-card.json` serves the discovery card.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Json, Router,
    extract::State,
    response::sse::{Event, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info};

use crate::config::AgentServerConfig;
use crate::types::{AppError, Result};

use super::task::{TaskStore, TaskUpdater};
use super::types::{
    AgentCapabilities, AgentCard, AgentSkill, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, Message, MessageSendParams, Part, SendMessageResult, StreamEvent, Task,
    TaskQueryParams, TaskState,
};

const PROCESSING_MESSAGE: &str = "Processing your insurance request...";
const REPORT_ARTIFACT: &str = "report";

/// The agent behavior behind the protocol server. One call per inbound
/// user message; the outcome decides the task's terminal state.
#[async_trait]
pub trait IntakeHandler: Send + Sync {
    async fn handle(&self, query: &str, context_id: &str) -> Result<IntakeOutcome>;
}

/// How an intake turn resolves.
#[derive(Debug, Clone, PartialEq)]
pub enum IntakeOutcome {
    /// Ask the user to fill a form; the payload rides a data part on an
    /// `input-required` status message.
    Form(Value),
    /// Intake finished; the report text becomes the task's artifact.
    Report(String),
    /// Structured content the server has no mapping for.
    Unrecognized(String),
}

/// Shared state for the protocol endpoints.
#[derive(Clone)]
pub struct AgentServerState {
    pub store: Arc<TaskStore>,
    pub handler: Arc<dyn IntakeHandler>,
    pub card: Arc<AgentCard>,
}

impl AgentServerState {
    pub fn new(handler: Arc<dyn IntakeHandler>, card: AgentCard) -> Self {
        Self {
            store: Arc::new(TaskStore::new()),
            handler,
            card: Arc::new(card),
        }
    }
}

/// The discovery card for the insurance intake agent served here.
pub fn intake_agent_card(public_url: &str) -> AgentCard {
    let modes = vec![
        "text".to_string(),
        "text/plain".to_string(),
        "application/json".to_string(),
    ];

    AgentCard {
        name: "Insurance Agent".to_string(),
        description: "This agent helps users apply for health insurance.".to_string(),
        url: public_url.to_string(),
        version: "1.0.0".to_string(),
        capabilities: AgentCapabilities { streaming: true },
        default_input_modes: modes.clone(),
        default_output_modes: modes,
        skills: vec![AgentSkill {
            id: "process_insurance_application".to_string(),
            name: "Process Insurance Application".to_string(),
            description: "Guides a user through a health questionnaire and generates a risk profile report."
                .to_string(),
            tags: vec![
                "insurance".to_string(),
                "health".to_string(),
                "report".to_string(),
            ],
            examples: vec![
                "I want to get a health insurance policy.".to_string(),
                "Hi, can you help me with insurance?".to_string(),
            ],
        }],
    }
}

/// Build the protocol router.
pub fn router(state: AgentServerState) -> Router {
    Router::new()
        .route("/", post(rpc))
        .route("/.well-known/agent-card.json", get(well_known_card))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Bind and run the agent server until it is shut down.
pub async fn serve(cfg: &AgentServerConfig, state: AgentServerState) -> Result<()> {
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("failed to bind {}: {}", addr, e)))?;

    info!(%addr, agent = %state.card.name, "agent server listening");

    axum::serve(listener, router(state))
        .await
        .map_err(|e| AppError::Internal(format!("agent server error: {}", e)))?;

    Ok(())
}

async fn well_known_card(State(state): State<AgentServerState>) -> Json<AgentCard> {
    Json(state.card.as_ref().clone())
}

/// Single JSON-RPC entry point. The body is parsed by hand so malformed
/// JSON maps to a `-32700` response instead of an axum rejection.
async fn rpc(State(state): State<AgentServerState>, body: String) -> Response {
    let raw: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                Value::Null,
                JsonRpcError::parse_error(e),
            ))
            .into_response();
        }
    };

    let rpc_id = raw.get("id").cloned().unwrap_or(Value::Null);
    let request: JsonRpcRequest = match serde_json::from_value(raw) {
        Ok(request) => request,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                rpc_id,
                JsonRpcError::invalid_request(e),
            ))
            .into_response();
        }
    };

    if request.jsonrpc != JSONRPC_VERSION {
        return Json(JsonRpcResponse::failure(
            request.id,
            JsonRpcError::invalid_request("jsonrpc must be \"2.0\""),
        ))
        .into_response();
    }

    debug!(method = %request.method, "rpc request");

    match request.method.as_str() {
        "message/send" => send_message(state, request.id, request.params)
            .await
            .into_response(),
        "message/stream" => stream_message(state, request.id, request.params),
        "tasks/get" => get_task(state, request.id, request.params).into_response(),
        "tasks/cancel" => Json(JsonRpcResponse::failure(
            request.id,
            JsonRpcError::unsupported_operation(),
        ))
        .into_response(),
        other => Json(JsonRpcResponse::failure(
            request.id,
            JsonRpcError::method_not_found(other),
        ))
        .into_response(),
    }
}

async fn send_message(
    state: AgentServerState,
    rpc_id: Value,
    params: Value,
) -> Json<JsonRpcResponse> {
    let params: MessageSendParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                rpc_id,
                JsonRpcError::invalid_params(e),
            ));
        }
    };

    let task = match state.store.resolve(&params.message) {
        Ok(task) => task,
        Err(e) => return Json(JsonRpcResponse::failure(rpc_id, rpc_error_for(&e))),
    };

    // Events are only observable through message/stream.
    let (events, receiver) = mpsc::unbounded_channel();
    drop(receiver);

    run_turn(state.clone(), task.clone(), params.message, events).await;

    let final_task = state.store.get(&task.id).unwrap_or(task);
    Json(success(rpc_id, &SendMessageResult::Task(final_task)))
}

fn stream_message(state: AgentServerState, rpc_id: Value, params: Value) -> Response {
    let params: MessageSendParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                rpc_id,
                JsonRpcError::invalid_params(e),
            ))
            .into_response();
        }
    };

    let task = match state.store.resolve(&params.message) {
        Ok(task) => task,
        Err(e) => {
            return Json(JsonRpcResponse::failure(rpc_id, rpc_error_for(&e))).into_response();
        }
    };

    let (events, receiver) = mpsc::unbounded_channel();
    {
        let state = state.clone();
        let task = task.clone();
        let message = params.message;
        tokio::spawn(async move {
            run_turn(state, task, message, events).await;
        });
    }

    let stream = async_stream::stream! {
        let mut receiver = receiver;
        while let Some(event) = receiver.recv().await {
            let is_final = event.is_final();
            let envelope = success(rpc_id.clone(), &event);
            let data = serde_json::to_string(&envelope).unwrap_or_else(|_| "{}".to_string());
            yield Ok::<_, Infallible>(Event::default().data(data));
            if is_final {
                break;
            }
        }
    };

    Sse::new(stream).into_response()
}

fn get_task(state: AgentServerState, rpc_id: Value, params: Value) -> Json<JsonRpcResponse> {
    let params: TaskQueryParams = match serde_json::from_value(params) {
        Ok(params) => params,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                rpc_id,
                JsonRpcError::invalid_params(e),
            ));
        }
    };

    match state.store.get(&params.id) {
        Some(mut task) => {
            if let Some(limit) = params.history_length {
                trim_history(&mut task, limit);
            }
            Json(success(rpc_id, &task))
        }
        None => Json(JsonRpcResponse::failure(
            rpc_id,
            JsonRpcError::task_not_found(),
        )),
    }
}

/// Keep only the `limit` most recent history messages.
fn trim_history(task: &mut Task, limit: usize) {
    if task.history.len() > limit {
        task.history = task.history.split_off(task.history.len() - limit);
    }
}

/// Run one intake turn against an already-resolved task, mirroring every
/// transition onto `events`.
async fn run_turn(
    state: AgentServerState,
    task: Task,
    message: Message,
    events: mpsc::UnboundedSender<StreamEvent>,
) {
    // Newly created tasks are announced as a full snapshot first; resumed
    // tasks go straight to status updates.
    if task.status.state == TaskState::Submitted
        && events.send(StreamEvent::Task(task.clone())).is_err()
    {
        debug!(task_id = %task.id, "stream receiver dropped before first event");
    }

    let updater = TaskUpdater::new(Arc::clone(&state.store), events, &task);
    updater.working(PROCESSING_MESSAGE);

    let query = message.joined_text();
    match state.handler.handle(&query, updater.context_id()).await {
        Ok(IntakeOutcome::Form(payload)) => {
            updater.input_required(vec![Part::data(payload)]);
        }
        Ok(IntakeOutcome::Report(report)) => {
            updater.add_artifact(REPORT_ARTIFACT, vec![Part::text(report)]);
            updater.complete();
        }
        Ok(IntakeOutcome::Unrecognized(content)) => {
            updater.fail(&format!(
                "Reaching an unexpected state with content: {}",
                content
            ));
        }
        Err(err) => {
            error!(task_id = %task.id, error = %err, "intake turn failed");
            updater.fail(&err.to_string());
        }
    }
}

fn success(id: Value, result: &impl Serialize) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::failure(id, JsonRpcError::internal(e)),
    }
}

fn rpc_error_for(err: &AppError) -> JsonRpcError {
    match err {
        AppError::NotFound(_) => JsonRpcError::task_not_found(),
        AppError::InvalidInput(msg) => JsonRpcError::invalid_params(msg),
        other => JsonRpcError::internal(other),
    }
}
