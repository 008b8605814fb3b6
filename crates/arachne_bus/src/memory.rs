//! In-memory bus backend: three bounded channels.
//!
//! Producers await when a queue is full; receives are non-blocking polls.
//! Depth counters back `is_empty`, which the launcher uses for idle-bus
//! job-done detection.

use crate::{BusError, SpiderBusBackend};
use arachne_protocol::{Item, ScheduledTask, TaskPromise};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, Mutex};

struct MemoryQueue<T> {
    tx: mpsc::Sender<T>,
    rx: Mutex<mpsc::Receiver<T>>,
    depth: AtomicUsize,
}

impl<T> MemoryQueue<T> {
    fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            tx,
            rx: Mutex::new(rx),
            depth: AtomicUsize::new(0),
        }
    }

    async fn send(&self, value: T) -> Result<(), BusError> {
        self.tx.send(value).await.map_err(|_| BusError::Closed)?;
        self.depth.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn receive(&self) -> Result<Option<T>, BusError> {
        let mut rx = self.rx.lock().await;
        match rx.try_recv() {
            Ok(value) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                Ok(Some(value))
            }
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(BusError::Closed),
        }
    }

    fn is_empty(&self) -> bool {
        self.depth.load(Ordering::SeqCst) == 0
    }
}

pub struct MemorySpiderBusBackend {
    scheduled_tasks: MemoryQueue<ScheduledTask>,
    task_promises: MemoryQueue<TaskPromise>,
    items: MemoryQueue<Item>,
}

impl MemorySpiderBusBackend {
    pub fn new(capacity: usize) -> Self {
        Self {
            scheduled_tasks: MemoryQueue::new(capacity),
            task_promises: MemoryQueue::new(capacity),
            items: MemoryQueue::new(capacity),
        }
    }
}

#[async_trait]
impl SpiderBusBackend for MemorySpiderBusBackend {
    async fn send_scheduled_task(&self, task: &ScheduledTask) -> Result<(), BusError> {
        self.scheduled_tasks.send(task.clone()).await
    }

    async fn receive_scheduled_task(&self) -> Result<Option<ScheduledTask>, BusError> {
        self.scheduled_tasks.receive().await
    }

    async fn send_task_promise(&self, promise: &TaskPromise) -> Result<(), BusError> {
        self.task_promises.send(promise.clone()).await
    }

    async fn receive_task_promise(&self) -> Result<Option<TaskPromise>, BusError> {
        self.task_promises.receive().await
    }

    async fn send_item(&self, item: &Item) -> Result<(), BusError> {
        self.items.send(item.clone()).await
    }

    async fn receive_item(&self) -> Result<Option<Item>, BusError> {
        self.items.receive().await
    }

    async fn is_empty(&self) -> Result<bool, BusError> {
        Ok(self.scheduled_tasks.is_empty()
            && self.task_promises.is_empty()
            && self.items.is_empty())
    }

    async fn close(&self) -> Result<(), BusError> {
        Ok(())
    }
}
