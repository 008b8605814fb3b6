//! Protocol-level errors: template validation and wire (de)serialization.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("workflow '{workflow}' has no initial task template")]
    NoInitialTask { workflow: String },

    #[error("workflow '{workflow}' has {count} initial task templates, expected exactly one")]
    MultipleInitialTasks { workflow: String, count: usize },

    #[error("duplicate task template name '{0}'")]
    DuplicateTaskName(String),

    #[error("task '{task}' has duplicate action name '{action}'")]
    DuplicateActionName { task: String, action: String },

    #[error("task '{task}' pipe template references unknown action '{action}'")]
    UnknownActionRef { task: String, action: String },

    #[error("task '{task}' pipe template #{index} does not match any of the four valid shapes")]
    InvalidPipeShape { task: String, index: usize },

    #[error("action '{action}' is missing required constructor param '{param}'")]
    MissingParam { action: String, param: String },

    #[error("action '{action}' param '{param}' has type {got}, expected {expected}")]
    ParamType {
        action: String,
        param: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("data chunk carries {got:?}, expected {expected:?}")]
    ChunkKindMismatch {
        expected: crate::ChunkKind,
        got: crate::ChunkKind,
    },

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
