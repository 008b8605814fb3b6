//! Uniform bus envelope.
//!
//! Persistent bus backends store one table per kind with the JSON payload in
//! a `raw` column; the envelope keeps the kind and payload together on the
//! way there.

use crate::{Item, ProtocolError, ScheduledTask, TaskPromise};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChunkKind {
    ScheduledTask,
    TaskPromise,
    Item,
}

impl ChunkKind {
    /// Queue (and table) name for this kind.
    pub fn queue_name(self) -> &'static str {
        match self {
            ChunkKind::ScheduledTask => crate::defaults::SCHEDULED_TASKS_QUEUE,
            ChunkKind::TaskPromise => crate::defaults::TASK_PROMISES_QUEUE,
            ChunkKind::Item => crate::defaults::ITEMS_QUEUE,
        }
    }
}

/// `{kind, payload}` envelope; payload is the JSON of the domain object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChunk {
    pub kind: ChunkKind,
    pub payload: Vec<u8>,
}

impl DataChunk {
    fn encode<T: Serialize>(kind: ChunkKind, value: &T) -> Result<Self, ProtocolError> {
        Ok(Self {
            kind,
            payload: serde_json::to_vec(value)?,
        })
    }

    fn decode<T: for<'de> Deserialize<'de>>(
        &self,
        expected: ChunkKind,
    ) -> Result<T, ProtocolError> {
        if self.kind != expected {
            return Err(ProtocolError::ChunkKindMismatch {
                expected,
                got: self.kind,
            });
        }
        Ok(serde_json::from_slice(&self.payload)?)
    }

    pub fn from_scheduled_task(task: &ScheduledTask) -> Result<Self, ProtocolError> {
        Self::encode(ChunkKind::ScheduledTask, task)
    }

    pub fn from_task_promise(promise: &TaskPromise) -> Result<Self, ProtocolError> {
        Self::encode(ChunkKind::TaskPromise, promise)
    }

    pub fn from_item(item: &Item) -> Result<Self, ProtocolError> {
        Self::encode(ChunkKind::Item, item)
    }

    pub fn to_scheduled_task(&self) -> Result<ScheduledTask, ProtocolError> {
        self.decode(ChunkKind::ScheduledTask)
    }

    pub fn to_task_promise(&self) -> Result<TaskPromise, ProtocolError> {
        self.decode(ChunkKind::TaskPromise)
    }

    pub fn to_item(&self) -> Result<Item, ProtocolError> {
        self.decode(ChunkKind::Item)
    }
}
