//! Shared domain types for the Arachne scraping engine.
//!
//! Everything that crosses a component boundary lives here: tagged [`Value`]s,
//! [`Item`]s, [`TaskPromise`]s, [`ScheduledTask`]s, the [`DataChunk`] bus
//! envelope, and the declarative workflow templates plus their structural
//! validation. All of it is plain serde data - a `ScheduledTask` serialized
//! by the manager must deserialize on a worker that shares no memory with it.

pub mod chunk;
pub mod config;
pub mod defaults;
pub mod error;
pub mod item;
pub mod promise;
pub mod value;
pub mod workflow;

pub use chunk::{ChunkKind, DataChunk};
pub use config::BusConfig;
pub use error::ProtocolError;
pub use item::Item;
pub use promise::{ScheduledTask, TaskPromise};
pub use value::Value;
pub use workflow::{ActionTemplate, DataPipeTemplate, PipeShape, TaskTemplate, Workflow};
