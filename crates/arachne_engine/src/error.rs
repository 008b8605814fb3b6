//! Engine errors: per-action runtime failures and task-level failures.

use arachne_protocol::ProtocolError;
use thiserror::Error;
use uuid::Uuid;

/// Failure of a single action run or of wiring a pipe onto an action.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("input name '{0}' is not allowed")]
    InputNameNotAllowed(String),

    #[error("output name '{0}' is not allowed")]
    OutputNameNotAllowed(String),

    #[error("input '{0}' is not connected")]
    InputNotConnected(String),

    #[error("output '{0}' is not connected")]
    OutputNotConnected(String),

    #[error("input '{0}' has no value left")]
    InputExhausted(String),

    #[error("input '{input}' carries {got}, expected {expected}")]
    BadInputType {
        input: String,
        expected: &'static str,
        got: String,
    },

    #[error("anchor '{0}' not found in input string")]
    AnchorNotFound(String),

    #[error("xpath '{xpath}' produced no match")]
    NoMatch { xpath: String },

    #[error("xpath '{xpath}' failed: {message}")]
    XPath { xpath: String, message: String },

    #[error("jsonpath '{path}' failed: {message}")]
    JsonPath { path: String, message: String },

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid UTF-8 input: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("no base URL configured or provided")]
    NoBaseUrl,

    #[error("invalid HTTP method '{0}'")]
    BadMethod(String),

    #[error("invalid HTTP header '{0}'")]
    BadHeader(String),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure of materializing or running a whole task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task '{0}' contains a dependency cycle")]
    CyclicDependency(String),

    #[error("action '{action}' failed: {source}")]
    ActionFailed {
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("wiring pipe onto action '{action}' failed: {source}")]
    Wiring {
        action: String,
        #[source]
        source: ActionError,
    },

    #[error("unknown action struct name '{0}'")]
    UnknownStructName(String),

    #[error("pipe {0} is neither a task boundary pipe nor wired between two task actions")]
    DanglingPipe(Uuid),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
