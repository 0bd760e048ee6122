//! Task bookkeeping and lifecycle transitions.
//!
//! [`TaskStore`] keeps every task in memory, indexed by id and by
//! conversation context. [`TaskUpdater`] applies status transitions for
//! one inbound message; its terminal methods take `self` by value, so a
//! turn can emit intermediate `working` updates freely but exactly one
//! terminal transition.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::types::{AppError, Result};

use super::types::{Artifact, Message, Part, StreamEvent, Task, TaskState, TaskStatus};

/// In-memory task storage.
#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<String, Task>>,
    latest_by_context: RwLock<HashMap<String, String>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the task an inbound message belongs to.
    ///
    /// - An explicit `taskId` continues that task; unknown ids are an
    ///   error, and a task already in a terminal state is replaced by a
    ///   fresh task in the same conversation context.
    /// - Otherwise a `contextId` continues the newest non-terminal task
    ///   of that conversation, when one exists.
    /// - Failing both, a brand-new task (and context, if the message
    ///   carries none) is created.
    ///
    /// The message is appended to the resolved task's history.
    pub fn resolve(&self, message: &Message) -> Result<Task> {
        if let Some(task_id) = &message.task_id {
            let existing = self.tasks.read().get(task_id).cloned();
            return match existing {
                None => Err(AppError::NotFound(format!("Task not found: {}", task_id))),
                Some(task) if !task.status.state.is_terminal() => {
                    Ok(self.continue_task(task, message))
                }
                Some(task) => {
                    debug!(task_id = %task.id, "task already terminal, opening a new one");
                    let mut continued = message.clone();
                    continued.context_id = Some(task.context_id.clone());
                    Ok(self.create_task(&continued))
                }
            };
        }

        if let Some(context_id) = &message.context_id {
            let latest = self.latest_by_context.read().get(context_id).cloned();
            if let Some(task_id) = latest {
                // Hoisted so the read guard drops before continue_task
                // write-locks `tasks`; inlining it in the `if let`
                // scrutinee keeps the guard alive across the body.
                let existing = self.tasks.read().get(&task_id).cloned();
                if let Some(task) = existing {
                    if !task.status.state.is_terminal() {
                        return Ok(self.continue_task(task, message));
                    }
                }
            }
        }

        Ok(self.create_task(message))
    }

    fn create_task(&self, message: &Message) -> Task {
        let task = Task::submitted(message);
        self.upsert(task.clone());
        task
    }

    fn continue_task(&self, mut task: Task, message: &Message) -> Task {
        task.history.push(message.clone());
        self.upsert(task.clone());
        task
    }

    pub fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().get(task_id).cloned()
    }

    pub fn upsert(&self, task: Task) {
        self.latest_by_context
            .write()
            .insert(task.context_id.clone(), task.id.clone());
        self.tasks.write().insert(task.id.clone(), task);
    }

    pub fn len(&self) -> usize {
        self.tasks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.read().is_empty()
    }
}

/// Applies status transitions for one task while mirroring each change
/// onto an event stream.
///
/// Non-terminal updates (`working`, `add_artifact`) borrow the updater;
/// terminal transitions (`input_required`, `complete`, `fail`) consume
/// it, so each inbound message gets exactly one terminal transition.
pub struct TaskUpdater {
    store: Arc<TaskStore>,
    events: mpsc::UnboundedSender<StreamEvent>,
    task_id: String,
    context_id: String,
}

impl TaskUpdater {
    pub fn new(
        store: Arc<TaskStore>,
        events: mpsc::UnboundedSender<StreamEvent>,
        task: &Task,
    ) -> Self {
        Self {
            store,
            events,
            task_id: task.id.clone(),
            context_id: task.context_id.clone(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn context_id(&self) -> &str {
        &self.context_id
    }

    /// Emit a non-final `working` update with a progress message.
    pub fn working(&self, text: &str) {
        let message = Message::agent_text(text, &self.task_id, &self.context_id);
        self.update_status(TaskState::Working, Some(message), false);
    }

    /// Terminal: the agent needs more input; `parts` carry what it needs
    /// (for intake, the form payload).
    pub fn input_required(self, parts: Vec<Part>) {
        let message = Message::agent_parts(parts, &self.task_id, &self.context_id);
        self.update_status(TaskState::InputRequired, Some(message), true);
    }

    /// Terminal: the task finished successfully.
    pub fn complete(self) {
        self.update_status(TaskState::Completed, None, true);
    }

    /// Terminal: the task failed with a user-visible explanation.
    pub fn fail(self, text: &str) {
        let message = Message::agent_text(text, &self.task_id, &self.context_id);
        self.update_status(TaskState::Failed, Some(message), true);
    }

    /// Attach a named artifact to the task.
    pub fn add_artifact(&self, name: &str, parts: Vec<Part>) {
        let artifact = Artifact::named(name, parts);

        if let Some(mut task) = self.store.get(&self.task_id) {
            task.artifacts.push(artifact.clone());
            self.store.upsert(task);
        }

        self.emit(StreamEvent::artifact_update(
            &self.task_id,
            &self.context_id,
            artifact,
        ));
    }

    fn update_status(&self, state: TaskState, message: Option<Message>, is_final: bool) {
        let status = match message {
            Some(message) => TaskStatus::with_message(state, message),
            None => TaskStatus::new(state),
        };

        if let Some(mut task) = self.store.get(&self.task_id) {
            if let Some(message) = &status.message {
                task.history.push(message.clone());
            }
            task.status = status.clone();
            self.store.upsert(task);
        }

        self.emit(StreamEvent::status_update(
            &self.task_id,
            &self.context_id,
            status,
            is_final,
        ));
    }

    fn emit(&self, event: StreamEvent) {
        if self.events.send(event).is_err() {
            debug!(task_id = %self.task_id, "stream receiver dropped, event not delivered");
        }
    }
}
