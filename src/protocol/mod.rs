//! Task protocol: JSON-RPC 2.0 message exchange between agent services.
//!
//! The server side exposes an intake agent as a task endpoint with SSE
//! streaming; the client side is the pooled HTTP adapter the
//! orchestrator uses to reach it. `types` carries the shared wire
//! vocabulary, `task` the in-memory lifecycle bookkeeping.

pub mod client;
pub mod server;
pub mod task;
pub mod types;

pub use client::A2aClient;
pub use server::{AgentServerState, IntakeHandler, IntakeOutcome, intake_agent_card};
pub use task::{TaskStore, TaskUpdater};
pub use types::{
    AgentCard, JsonRpcError, JsonRpcRequest, JsonRpcResponse, Message, MessageRole, Part,
    SendMessageResult, StreamEvent, Task, TaskState, TaskStatus,
};
