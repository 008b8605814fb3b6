//! Spider bus: three logically independent FIFO queues between the manager,
//! workers, and the exporter.
//!
//! Queues: `scheduledTasks`, `taskPromises`, `items`. Backends are pluggable
//! behind [`SpiderBusBackend`]: in-memory channels for single-process runs,
//! SQLite or MySQL for runs that must survive restarts. The contract is
//! at-least-once delivery, strict FIFO within a queue, no ordering across
//! queues, and idempotent construction.

pub mod adapters;
pub mod error;
pub mod memory;
pub mod mysql;
pub mod sqlite;

pub use adapters::{spawn_exporter_adapter, spawn_manager_adapter, spawn_worker_adapter};
pub use error::BusError;
pub use memory::MemorySpiderBusBackend;
pub use mysql::MySqlSpiderBusBackend;
pub use sqlite::SqliteSpiderBusBackend;

use arachne_protocol::{ChunkKind, DataChunk, Item, ScheduledTask, TaskPromise};
use async_trait::async_trait;
use std::sync::Arc;

/// One queue backend. Receives are non-blocking polls: head of the queue or
/// `None` when empty.
#[async_trait]
pub trait SpiderBusBackend: Send + Sync {
    async fn send_scheduled_task(&self, task: &ScheduledTask) -> Result<(), BusError>;
    async fn receive_scheduled_task(&self) -> Result<Option<ScheduledTask>, BusError>;

    async fn send_task_promise(&self, promise: &TaskPromise) -> Result<(), BusError>;
    async fn receive_task_promise(&self) -> Result<Option<TaskPromise>, BusError>;

    async fn send_item(&self, item: &Item) -> Result<(), BusError>;
    async fn receive_item(&self) -> Result<Option<Item>, BusError>;

    /// True when all three queues are empty.
    async fn is_empty(&self) -> Result<bool, BusError>;

    /// Release backend resources (connections, channels).
    async fn close(&self) -> Result<(), BusError>;
}

/// Handle shared by the adapters; cheap to clone.
#[derive(Clone)]
pub struct SpiderBus {
    backend: Arc<dyn SpiderBusBackend>,
}

impl SpiderBus {
    pub fn new(backend: Arc<dyn SpiderBusBackend>) -> Self {
        Self { backend }
    }

    /// Unified send path: route an envelope to its queue by kind.
    pub async fn send_chunk(&self, chunk: &DataChunk) -> Result<(), BusError> {
        match chunk.kind {
            ChunkKind::ScheduledTask => {
                self.backend
                    .send_scheduled_task(&chunk.to_scheduled_task()?)
                    .await
            }
            ChunkKind::TaskPromise => {
                self.backend
                    .send_task_promise(&chunk.to_task_promise()?)
                    .await
            }
            ChunkKind::Item => self.backend.send_item(&chunk.to_item()?).await,
        }
    }

    pub async fn send_scheduled_task(&self, task: &ScheduledTask) -> Result<(), BusError> {
        self.backend.send_scheduled_task(task).await
    }

    pub async fn receive_scheduled_task(&self) -> Result<Option<ScheduledTask>, BusError> {
        self.backend.receive_scheduled_task().await
    }

    pub async fn send_task_promise(&self, promise: &TaskPromise) -> Result<(), BusError> {
        self.backend.send_task_promise(promise).await
    }

    pub async fn receive_task_promise(&self) -> Result<Option<TaskPromise>, BusError> {
        self.backend.receive_task_promise().await
    }

    pub async fn send_item(&self, item: &Item) -> Result<(), BusError> {
        self.backend.send_item(item).await
    }

    pub async fn receive_item(&self) -> Result<Option<Item>, BusError> {
        self.backend.receive_item().await
    }

    pub async fn is_empty(&self) -> Result<bool, BusError> {
        self.backend.is_empty().await
    }

    pub async fn close(&self) -> Result<(), BusError> {
        self.backend.close().await
    }
}
