//! Integration tests for the task protocol server.
//!
//! Each test runs the real router against an in-process [`TestServer`],
//! with the intake agent backed by a canned LLM so no model is needed.

mod common;

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{Value, json};
use tempfile::NamedTempFile;

use aegis::agents::IntakeAgent;
use aegis::forms::FormRegistry;
use aegis::protocol::server::router;
use aegis::protocol::{AgentServerState, intake_agent_card};

use common::mocks::{MockLLMClient, intake_registry};

const REPORT_TEXT: &str = "Intake summary: applicant in good health, no major risk factors.";

fn intake_server(llm: MockLLMClient) -> (NamedTempFile, TestServer) {
    let (schema, registry) = intake_registry();
    let agent = IntakeAgent::new(Box::new(llm), registry);
    let state = AgentServerState::new(
        Arc::new(agent),
        intake_agent_card("http://localhost:10010/"),
    );
    let server = TestServer::new(router(state)).unwrap();
    (schema, server)
}

fn rpc(method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    })
}

fn send_params(text: &str, message_id: &str) -> Value {
    json!({
        "message": {
            "role": "user",
            "parts": [{"kind": "text", "text": text}],
            "messageId": message_id,
        }
    })
}

/// Pull the `result` out of every `data:` line of an SSE body.
fn sse_results(body: &str) -> Vec<Value> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .map(|data| serde_json::from_str::<Value>(data).expect("SSE event is not JSON"))
        .map(|envelope| envelope["result"].clone())
        .collect()
}

#[tokio::test]
async fn test_agent_card_served_at_well_known_path() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let response = server.get("/.well-known/agent-card.json").await;
    response.assert_status_ok();

    let card: Value = response.json();
    assert_eq!(card["name"], "Insurance Agent");
    assert_eq!(card["capabilities"]["streaming"], true);
    assert_eq!(card["skills"][0]["id"], "process_insurance_application");
    assert!(card["url"].as_str().unwrap().starts_with("http://"));
}

#[tokio::test]
async fn test_first_contact_presents_form() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let response = server
        .post("/")
        .json(&rpc(
            "message/send",
            send_params("I want to apply for health insurance", "m1"),
        ))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert!(body["error"].is_null(), "unexpected error: {}", body["error"]);

    let task = &body["result"];
    assert_eq!(task["kind"], "task");
    assert_eq!(task["status"]["state"], "input-required");

    // The questionnaire rides as a data part on the status message.
    let part = &task["status"]["message"]["parts"][0];
    assert_eq!(part["kind"], "data");
    assert_eq!(part["data"]["type"], "form");
    assert!(part["data"]["form"]["properties"]["age"].is_object());

    // User message, working update, input-required request.
    assert_eq!(task["history"].as_array().unwrap().len(), 3);
    assert_eq!(task["history"][0]["role"], "user");
}

#[tokio::test]
async fn test_form_submission_completes_with_report() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let opened: Value = server
        .post("/")
        .json(&rpc("message/send", send_params("hello", "m1")))
        .await
        .json();
    let task = &opened["result"];
    assert_eq!(task["status"]["state"], "input-required");

    let mut params = send_params(r#"{"form_data": {"age": 40, "smoker": "no"}}"#, "m2");
    params["message"]["taskId"] = task["id"].clone();
    params["message"]["contextId"] = task["contextId"].clone();

    let response = server.post("/").json(&rpc("message/send", params)).await;
    response.assert_status_ok();

    let body: Value = response.json();
    let finished = &body["result"];

    // Same task resumes; it does not fork a new one.
    assert_eq!(finished["id"], task["id"]);
    assert_eq!(finished["contextId"], task["contextId"]);
    assert_eq!(finished["status"]["state"], "completed");

    let artifact = &finished["artifacts"][0];
    assert_eq!(artifact["name"], "report");
    assert_eq!(artifact["parts"][0]["text"], REPORT_TEXT);

    // Three messages from the first exchange plus two from this one.
    assert_eq!(finished["history"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_send_to_unknown_task_is_rejected() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let mut params = send_params("resuming", "m1");
    params["message"]["taskId"] = json!("no-such-task");

    let body: Value = server.post("/").json(&rpc("message/send", params)).await.json();
    assert_eq!(body["error"]["code"], -32001);
    assert_eq!(body["error"]["message"], "Task not found");
}

#[tokio::test]
async fn test_tasks_get_trims_history_to_requested_length() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let opened: Value = server
        .post("/")
        .json(&rpc("message/send", send_params("hello", "m1")))
        .await
        .json();
    let task_id = opened["result"]["id"].clone();

    let full: Value = server
        .post("/")
        .json(&rpc("tasks/get", json!({"id": task_id})))
        .await
        .json();
    assert_eq!(full["result"]["history"].as_array().unwrap().len(), 3);

    let trimmed: Value = server
        .post("/")
        .json(&rpc("tasks/get", json!({"id": task_id, "historyLength": 1})))
        .await
        .json();
    let history = trimmed["result"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    // The most recent message survives the trim.
    assert_eq!(history[0]["role"], "agent");
}

#[tokio::test]
async fn test_tasks_get_unknown_id_is_not_found() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let body: Value = server
        .post("/")
        .json(&rpc("tasks/get", json!({"id": "missing"})))
        .await
        .json();
    assert_eq!(body["error"]["code"], -32001);
}

#[tokio::test]
async fn test_tasks_cancel_is_unsupported() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let body: Value = server
        .post("/")
        .json(&rpc("tasks/cancel", json!({"id": "anything"})))
        .await
        .json();
    assert_eq!(body["error"]["code"], -32004);
    assert_eq!(body["error"]["message"], "This operation is not supported");
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let response = server.post("/").text("{not json").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], -32700);
    assert!(body["id"].is_null());
}

#[tokio::test]
async fn test_wrong_jsonrpc_version_is_invalid_request() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let body: Value = server
        .post("/")
        .json(&json!({
            "jsonrpc": "1.0",
            "id": 7,
            "method": "message/send",
            "params": send_params("hi", "m1"),
        }))
        .await
        .json();
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["id"], 7);
}

#[tokio::test]
async fn test_unknown_method_is_method_not_found() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let body: Value = server
        .post("/")
        .json(&rpc("tasks/resubscribe", json!({})))
        .await
        .json();
    assert_eq!(body["error"]["code"], -32601);
    assert_eq!(body["error"]["message"], "Method not found: tasks/resubscribe");
}

#[tokio::test]
async fn test_stream_emits_snapshot_then_status_updates() {
    let (_schema, server) = intake_server(MockLLMClient::new(REPORT_TEXT));

    let response = server
        .post("/")
        .json(&rpc("message/stream", send_params("hello", "m1")))
        .await;
    response.assert_status_ok();

    let events = sse_results(&response.text());
    assert_eq!(events.len(), 3);

    // New tasks are announced as a full snapshot before any update.
    assert_eq!(events[0]["kind"], "task");
    assert_eq!(events[0]["status"]["state"], "submitted");

    assert_eq!(events[1]["kind"], "status-update");
    assert_eq!(events[1]["status"]["state"], "working");
    assert_eq!(events[1]["final"], false);
    assert_eq!(
        events[1]["status"]["message"]["parts"][0]["text"],
        "Processing your insurance request..."
    );

    assert_eq!(events[2]["kind"], "status-update");
    assert_eq!(events[2]["status"]["state"], "input-required");
    assert_eq!(events[2]["final"], true);
}

#[tokio::test]
async fn test_llm_failure_fails_the_task() {
    let (_schema, server) = intake_server(MockLLMClient::failing());

    // First contact never touches the model, so open the task first.
    let opened: Value = server
        .post("/")
        .json(&rpc("message/send", send_params("hello", "m1")))
        .await
        .json();
    let task = &opened["result"];
    assert_eq!(task["status"]["state"], "input-required");

    let mut params = send_params(r#"{"form_data": {"age": 40}}"#, "m2");
    params["message"]["taskId"] = task["id"].clone();

    let body: Value = server.post("/").json(&rpc("message/send", params)).await.json();
    let failed = &body["result"];
    assert_eq!(failed["status"]["state"], "failed");
    let text = failed["status"]["message"]["parts"][0]["text"].as_str().unwrap();
    assert!(text.contains("LLM error"), "unexpected failure text: {text}");
}

#[tokio::test]
async fn test_unreadable_schema_fails_first_contact() {
    let registry = Arc::new(FormRegistry::new("/nonexistent/intake-schema.json"));
    let agent = IntakeAgent::new(Box::new(MockLLMClient::new(REPORT_TEXT)), registry);
    let state = AgentServerState::new(
        Arc::new(agent),
        intake_agent_card("http://localhost:10010/"),
    );
    let server = TestServer::new(router(state)).unwrap();

    let body: Value = server
        .post("/")
        .json(&rpc("message/send", send_params("hello", "m1")))
        .await
        .json();
    let failed = &body["result"];
    assert_eq!(failed["status"]["state"], "failed");
    let text = failed["status"]["message"]["parts"][0]["text"].as_str().unwrap();
    assert!(text.contains("Schema error"), "unexpected failure text: {text}");
}
