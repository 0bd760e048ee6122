//! Agent Tools
//!
//! Tool infrastructure for the intake pipeline's agents. Tools are the
//! only way agents touch the outside world: form schemas come from the
//! [`forms`](crate::tools::forms) tools and plan lookups go through the
//! [`retrieval`](crate::tools::retrieval) tool.
//!
//! # Module Structure
//!
//! - [`registry`](crate::tools::registry) - Tool registration and dispatch
//! - [`forms`](crate::tools::forms) - Intake form schema and presentation tools
//! - [`retrieval`](crate::tools::retrieval) - Insurance plan search tool
//!
//! Agents invoke tools deterministically from code rather than through
//! model-selected tool calls, so each agent's tool sequence is fixed
//! and auditable.

/// Form schema and presentation tools.
pub mod forms;
/// Tool registry for managing available tools.
pub mod registry;
/// Insurance plan search tool.
pub mod retrieval;

pub use registry::{Tool, ToolRegistry};
