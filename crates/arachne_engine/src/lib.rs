//! Dataflow task execution engine.
//!
//! A task is a DAG of actions connected by data pipes. Actions are small
//! synchronous transforms with named ports; pipes are tail-push/tail-pop
//! buffers owned by exactly one task. The engine materializes tasks from
//! [`arachne_protocol::ScheduledTask`]s through an explicit action registry
//! and runs them in topological order on one thread of control - workers put
//! that thread under `spawn_blocking`.

pub mod action;
pub mod actions;
pub mod error;
pub mod materialize;
pub mod pipe;
pub mod registry;
pub mod task;

pub use action::{Action, ActionCore};
pub use error::{ActionError, TaskError};
pub use materialize::{task_from_scheduled, TaskContext};
pub use pipe::{DataPipe, DataPipeRef, PipeValue};
pub use registry::{validate_workflow, ActionRegistry};
pub use task::Task;
