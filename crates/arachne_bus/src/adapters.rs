//! Bus adapters: bridge a component's in-process channels to the bus.
//!
//! Each adapter spawns an outbound drain loop and/or an inbound poll loop
//! per direction it bridges. Poll cadence comes from [`BusConfig`]; every
//! loop cooperates with the Done watch channel and exits after the current
//! iteration.

use crate::SpiderBus;
use arachne_protocol::{BusConfig, DataChunk, Item, ScheduledTask, TaskPromise};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::warn;

/// Manager side: scheduled tasks out to the bus, promises and items polled in.
pub fn spawn_manager_adapter(
    bus: SpiderBus,
    config: BusConfig,
    mut scheduled_tasks_rx: mpsc::Receiver<ScheduledTask>,
    promises_tx: mpsc::Sender<TaskPromise>,
    items_tx: mpsc::Sender<Item>,
    done: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let outbound = {
        let bus = bus.clone();
        let mut done = done.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    maybe = scheduled_tasks_rx.recv() => match maybe {
                        Some(task) => send_scheduled_task(&bus, task).await,
                        None => break,
                    },
                    changed = done.changed() => {
                        if changed.is_err() || *done.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    };

    let inbound = {
        let mut done = done;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.poll_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        loop {
                            match bus.receive_task_promise().await {
                                Ok(Some(promise)) => {
                                    if promises_tx.send(promise).await.is_err() {
                                        return;
                                    }
                                }
                                Ok(None) => break,
                                Err(error) => {
                                    warn!(%error, "failed to poll task promises");
                                    break;
                                }
                            }
                        }
                        loop {
                            match bus.receive_item().await {
                                Ok(Some(item)) => {
                                    if items_tx.send(item).await.is_err() {
                                        return;
                                    }
                                }
                                Ok(None) => break,
                                Err(error) => {
                                    warn!(%error, "failed to poll items");
                                    break;
                                }
                            }
                        }
                    }
                    changed = done.changed() => {
                        if changed.is_err() || *done.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    };

    vec![outbound, inbound]
}

/// Worker side: scheduled tasks polled in, promises and items drained out.
pub fn spawn_worker_adapter(
    bus: SpiderBus,
    config: BusConfig,
    scheduled_tasks_tx: mpsc::Sender<ScheduledTask>,
    mut promises_rx: mpsc::Receiver<TaskPromise>,
    mut items_rx: mpsc::Receiver<Item>,
    done: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let inbound = {
        let bus = bus.clone();
        let mut done = done.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.poll_interval);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        match bus.receive_scheduled_task().await {
                            Ok(Some(task)) => {
                                if scheduled_tasks_tx.send(task).await.is_err() {
                                    return;
                                }
                            }
                            Ok(None) => {}
                            Err(error) => warn!(%error, "failed to poll scheduled tasks"),
                        }
                    }
                    changed = done.changed() => {
                        if changed.is_err() || *done.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    };

    let outbound = {
        let mut done = done;
        tokio::spawn(async move {
            let mut promises_open = true;
            let mut items_open = true;
            while promises_open || items_open {
                tokio::select! {
                    maybe = promises_rx.recv(), if promises_open => match maybe {
                        Some(promise) => send_task_promise(&bus, promise).await,
                        None => promises_open = false,
                    },
                    maybe = items_rx.recv(), if items_open => match maybe {
                        Some(item) => send_item(&bus, item).await,
                        None => items_open = false,
                    },
                    changed = done.changed() => {
                        if changed.is_err() || *done.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    };

    vec![inbound, outbound]
}

/// Exporter side: items polled in from the bus.
pub fn spawn_exporter_adapter(
    bus: SpiderBus,
    config: BusConfig,
    items_tx: mpsc::Sender<Item>,
    mut done: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let inbound = tokio::spawn(async move {
        let mut interval = tokio::time::interval(config.poll_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    loop {
                        match bus.receive_item().await {
                            Ok(Some(item)) => {
                                if items_tx.send(item).await.is_err() {
                                    return;
                                }
                            }
                            Ok(None) => break,
                            Err(error) => {
                                warn!(%error, "failed to poll items");
                                break;
                            }
                        }
                    }
                }
                changed = done.changed() => {
                    if changed.is_err() || *done.borrow() {
                        break;
                    }
                }
            }
        }
    });

    vec![inbound]
}

async fn send_scheduled_task(bus: &SpiderBus, task: ScheduledTask) {
    match DataChunk::from_scheduled_task(&task) {
        Ok(chunk) => {
            if let Err(error) = bus.send_chunk(&chunk).await {
                warn!(%error, task = %task.task_name(), "failed to send scheduled task");
            }
        }
        Err(error) => warn!(%error, "failed to encode scheduled task"),
    }
}

async fn send_task_promise(bus: &SpiderBus, promise: TaskPromise) {
    match DataChunk::from_task_promise(&promise) {
        Ok(chunk) => {
            if let Err(error) = bus.send_chunk(&chunk).await {
                warn!(%error, task = %promise.task_name, "failed to send task promise");
            }
        }
        Err(error) => warn!(%error, "failed to encode task promise"),
    }
}

async fn send_item(bus: &SpiderBus, item: Item) {
    match DataChunk::from_item(&item) {
        Ok(chunk) => {
            if let Err(error) = bus.send_chunk(&chunk).await {
                warn!(%error, item = %item.name, "failed to send item");
            }
        }
        Err(error) => warn!(%error, "failed to encode item"),
    }
}
