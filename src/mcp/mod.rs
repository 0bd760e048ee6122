//! Model Context Protocol surface for plan retrieval.
//!
//! Exposes the plan corpus as a `get_insurance_plan` tool over stdio, so
//! MCP hosts can search plans without going through the HTTP retrieval
//! server. Enabled with the `mcp` feature.

pub mod server;

pub use server::{AegisMcpServer, start_stdio_server};
