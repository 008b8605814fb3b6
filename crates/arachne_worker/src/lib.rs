//! Worker: pulls scheduled tasks, runs them, emits promises and items.
//!
//! Workers hold no state between tasks; any number may run concurrently.
//! Task graphs execute synchronously (actions do blocking I/O), so each run
//! goes through `spawn_blocking`.

use arachne_engine::{task_from_scheduled, ActionRegistry, PipeValue, TaskError};
use arachne_protocol::{Item, ScheduledTask, TaskPromise};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Channel endpoints handed to the bus adapter.
pub struct WorkerChannels {
    pub scheduled_tasks_tx: mpsc::Sender<ScheduledTask>,
    pub promises_rx: mpsc::Receiver<TaskPromise>,
    pub items_rx: mpsc::Receiver<Item>,
}

pub struct Worker {
    pub uuid: Uuid,
    registry: Arc<ActionRegistry>,
    scheduled_tasks_rx: mpsc::Receiver<ScheduledTask>,
    promises_tx: mpsc::Sender<TaskPromise>,
    items_tx: mpsc::Sender<Item>,
    done: watch::Receiver<bool>,
}

impl Worker {
    pub fn new(
        registry: Arc<ActionRegistry>,
        capacity: usize,
        done: watch::Receiver<bool>,
    ) -> (Self, WorkerChannels) {
        let (scheduled_tasks_tx, scheduled_tasks_rx) = mpsc::channel(capacity);
        let (promises_tx, promises_rx) = mpsc::channel(capacity);
        let (items_tx, items_rx) = mpsc::channel(capacity);

        let worker = Self {
            uuid: Uuid::new_v4(),
            registry,
            scheduled_tasks_rx,
            promises_tx,
            items_tx,
            done,
        };
        let channels = WorkerChannels {
            scheduled_tasks_tx,
            promises_rx,
            items_rx,
        };
        (worker, channels)
    }

    pub async fn run(mut self) {
        info!(worker = %self.uuid, "starting worker run loop");
        loop {
            tokio::select! {
                maybe = self.scheduled_tasks_rx.recv() => match maybe {
                    Some(scheduled) => self.execute(scheduled).await,
                    None => break,
                },
                changed = self.done.changed() => {
                    if changed.is_err() || *self.done.borrow() {
                        break;
                    }
                }
            }
        }
        info!(worker = %self.uuid, "worker run loop finished");
    }

    /// Materialize and run one task, then route its outputs. Task errors are
    /// logged and the scheduled task is discarded; they never cross the
    /// component boundary.
    async fn execute(&self, scheduled: ScheduledTask) {
        let task_name = scheduled.task_name().to_string();
        info!(worker = %self.uuid, task = %task_name, "running scheduled task");

        let registry = self.registry.clone();
        let result = tokio::task::spawn_blocking(move || -> Result<Vec<PipeValue>, TaskError> {
            let mut task = task_from_scheduled(&scheduled, registry.as_ref())?;
            task.run()?;
            Ok(task.drain_outputs())
        })
        .await;

        let outputs = match result {
            Ok(Ok(outputs)) => outputs,
            Ok(Err(task_error)) => {
                error!(worker = %self.uuid, task = %task_name, error = %task_error, "task failed");
                return;
            }
            Err(join_error) => {
                error!(worker = %self.uuid, task = %task_name, error = %join_error, "task panicked");
                return;
            }
        };

        for output in outputs {
            match output {
                PipeValue::Item(item) => {
                    if self.items_tx.send(item).await.is_err() {
                        warn!(worker = %self.uuid, "items channel closed");
                        return;
                    }
                }
                PipeValue::Promise(promise) => {
                    if self.promises_tx.send(promise).await.is_err() {
                        warn!(worker = %self.uuid, "promises channel closed");
                        return;
                    }
                }
                PipeValue::Value(value) => {
                    warn!(
                        worker = %self.uuid,
                        task = %task_name,
                        value_type = %value.type_name(),
                        "dropping plain value left on a task output"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arachne_protocol::{
        ActionTemplate, DataPipeTemplate, TaskPromise, TaskTemplate, Value,
    };
    use std::collections::HashMap;

    fn item_emitting_template() -> TaskTemplate {
        TaskTemplate {
            task_name: "EmitItem".to_string(),
            initial: true,
            action_templates: vec![
                ActionTemplate {
                    name: "TitleConst".to_string(),
                    struct_name: "ConstAction".to_string(),
                    constructor_params: HashMap::from([(
                        "c".to_string(),
                        Value::Str("a title".into()),
                    )]),
                },
                ActionTemplate {
                    name: "MakeItem".to_string(),
                    struct_name: "FieldJoinAction".to_string(),
                    constructor_params: HashMap::from([
                        (
                            "inputNames".to_string(),
                            Value::Strings(vec!["title".to_string()]),
                        ),
                        ("itemName".to_string(), Value::Str("story".into())),
                    ]),
                },
                ActionTemplate {
                    name: "NextPage".to_string(),
                    struct_name: "TaskPromiseAction".to_string(),
                    constructor_params: HashMap::from([
                        (
                            "inputNames".to_string(),
                            Value::Strings(vec!["title".to_string()]),
                        ),
                        ("taskName".to_string(), Value::Str("EmitItem".into())),
                    ]),
                },
            ],
            data_pipe_templates: vec![
                DataPipeTemplate {
                    source_action_name: Some("TitleConst".into()),
                    source_output_name: Some("out".into()),
                    dest_action_name: Some("MakeItem".into()),
                    dest_input_name: Some("title".into()),
                    ..Default::default()
                },
                DataPipeTemplate {
                    source_action_name: Some("TitleConst".into()),
                    source_output_name: Some("out".into()),
                    dest_action_name: Some("NextPage".into()),
                    dest_input_name: Some("title".into()),
                    ..Default::default()
                },
                DataPipeTemplate {
                    source_action_name: Some("MakeItem".into()),
                    source_output_name: Some("item".into()),
                    task_output_name: Some("items".into()),
                    ..Default::default()
                },
                DataPipeTemplate {
                    source_action_name: Some("NextPage".into()),
                    source_output_name: Some("promise".into()),
                    task_output_name: Some("promise".into()),
                    ..Default::default()
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_worker_routes_items_and_promises() {
        let (done_tx, done_rx) = watch::channel(false);
        let registry = Arc::new(ActionRegistry::with_builtin_actions());
        let (worker, channels) = Worker::new(registry, 8, done_rx);

        let job_uuid = Uuid::new_v4();
        let scheduled = ScheduledTask::new(
            TaskPromise::new("EmitItem", "wf", job_uuid),
            item_emitting_template(),
            "wf",
            "v1",
        );

        let handle = tokio::spawn(worker.run());
        channels.scheduled_tasks_tx.send(scheduled).await.unwrap();

        let mut items_rx = channels.items_rx;
        let item = items_rx.recv().await.unwrap();
        assert_eq!(item.name, "story");
        assert_eq!(item.job_uuid, job_uuid);
        assert_eq!(item.field_string("title"), "a title");

        let mut promises_rx = channels.promises_rx;
        let promise = promises_rx.recv().await.unwrap();
        assert_eq!(promise.task_name, "EmitItem");
        assert_eq!(
            promise.input_data.get("title"),
            Some(&vec![Value::Str("a title".into())])
        );

        done_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_task_is_discarded() {
        let (done_tx, done_rx) = watch::channel(false);
        let registry = Arc::new(ActionRegistry::with_builtin_actions());
        let (worker, channels) = Worker::new(registry, 8, done_rx);

        // StringCut with no seeded input fails at run time.
        let template = TaskTemplate {
            task_name: "Failing".to_string(),
            initial: true,
            action_templates: vec![ActionTemplate {
                name: "Cut".to_string(),
                struct_name: "StringCutAction".to_string(),
                constructor_params: HashMap::from([
                    ("from".to_string(), Value::Str("<b>".into())),
                    ("to".to_string(), Value::Str("</b>".into())),
                ]),
            }],
            data_pipe_templates: vec![
                DataPipeTemplate {
                    task_input_name: Some("page".into()),
                    dest_action_name: Some("Cut".into()),
                    dest_input_name: Some("str".into()),
                    ..Default::default()
                },
                DataPipeTemplate {
                    source_action_name: Some("Cut".into()),
                    source_output_name: Some("str".into()),
                    task_output_name: Some("cut".into()),
                    ..Default::default()
                },
            ],
        };
        let scheduled = ScheduledTask::new(
            TaskPromise::new("Failing", "wf", Uuid::new_v4()),
            template,
            "wf",
            "v1",
        );

        let handle = tokio::spawn(worker.run());
        channels.scheduled_tasks_tx.send(scheduled).await.unwrap();

        // No output should arrive; the worker keeps running.
        let mut items_rx = channels.items_rx;
        let timeout =
            tokio::time::timeout(std::time::Duration::from_millis(200), items_rx.recv()).await;
        assert!(timeout.is_err());

        done_tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
