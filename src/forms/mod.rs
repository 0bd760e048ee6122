//! Intake Form Schemas
//!
//! Loads the health intake form definition from disk and builds the
//! structured form payload the intake agent hands back to clients. The
//! schema file is read once and cached, so every caller sees the exact
//! same definition for the lifetime of the process.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde_json::{Value, json};

use crate::config::FormsConfig;
use crate::types::{AppError, Result};

/// Loads and caches form schemas from disk.
pub struct FormRegistry {
    schema_path: PathBuf,
    cached: RwLock<Option<Value>>,
}

impl FormRegistry {
    /// Create a registry reading its schema from `schema_path`.
    pub fn new(schema_path: impl Into<PathBuf>) -> Self {
        Self {
            schema_path: schema_path.into(),
            cached: RwLock::new(None),
        }
    }

    /// Create a registry from the `[forms]` configuration section.
    pub fn from_config(cfg: &FormsConfig) -> Self {
        Self::new(&cfg.schema_path)
    }

    /// Path the schema is loaded from.
    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Fetch the intake form schema.
    ///
    /// The first successful read is cached, so repeated calls return an
    /// identical value even if the file changes underneath the process.
    /// A missing or malformed file surfaces as [`AppError::Schema`].
    pub async fn fetch_schema(&self) -> Result<Value> {
        if let Some(schema) = self.cached.read().clone() {
            return Ok(schema);
        }

        let raw = tokio::fs::read_to_string(&self.schema_path)
            .await
            .map_err(|e| {
                AppError::Schema(format!(
                    "failed to read form schema '{}': {}",
                    self.schema_path.display(),
                    e
                ))
            })?;

        let schema: Value = serde_json::from_str(&raw).map_err(|e| {
            AppError::Schema(format!(
                "form schema '{}' is not valid JSON: {}",
                self.schema_path.display(),
                e
            ))
        })?;

        *self.cached.write() = Some(schema.clone());
        Ok(schema)
    }
}

/// Wrap a form schema in the payload presented to clients.
///
/// The `form_data` object starts empty; clients echo the same shape back
/// with the filled-in values under `form_data`.
pub fn form_payload(schema: Value) -> Value {
    json!({
        "type": "form",
        "form": schema,
        "form_data": {},
    })
}

/// Extract submitted form values from a structured payload, if present.
///
/// Returns the object under the `form_data` key. Payloads without that
/// key (or with a non-object value there) are not form submissions.
pub fn extract_form_data(payload: &Value) -> Option<&serde_json::Map<String, Value>> {
    payload.get("form_data").and_then(|v| v.as_object())
}
