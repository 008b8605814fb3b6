//! Manager: owns the workflow for a job, seeds initial tasks, and recycles
//! task promises into scheduled tasks.
//!
//! The manager is workflow-agnostic beyond template lookup; it never wires
//! actions itself. Inbound items are forwarded untouched to the items-out
//! channel for whoever bridges them to the exporter.

use arachne_engine::{validate_workflow, ActionRegistry, TaskError};
use arachne_protocol::{Item, ScheduledTask, TaskPromise, Workflow};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("workflow validation failed: {0}")]
    Validation(#[from] TaskError),

    #[error("manager channel closed")]
    ChannelClosed,
}

/// Channel endpoints handed to the bus adapter.
pub struct ManagerChannels {
    pub scheduled_tasks_rx: mpsc::Receiver<ScheduledTask>,
    pub promises_tx: mpsc::Sender<TaskPromise>,
    pub items_tx: mpsc::Sender<Item>,
    pub items_out_rx: mpsc::Receiver<Item>,
}

pub struct Manager {
    pub uuid: Uuid,
    registry: Arc<ActionRegistry>,
    workflow: Option<Arc<Workflow>>,
    job_uuid: Option<Uuid>,
    scheduled_tasks_tx: mpsc::Sender<ScheduledTask>,
    promises_rx: mpsc::Receiver<TaskPromise>,
    items_rx: mpsc::Receiver<Item>,
    items_out_tx: mpsc::Sender<Item>,
    done: watch::Receiver<bool>,
}

impl Manager {
    pub fn new(
        registry: Arc<ActionRegistry>,
        capacity: usize,
        done: watch::Receiver<bool>,
    ) -> (Self, ManagerChannels) {
        let (scheduled_tasks_tx, scheduled_tasks_rx) = mpsc::channel(capacity);
        let (promises_tx, promises_rx) = mpsc::channel(capacity);
        let (items_tx, items_rx) = mpsc::channel(capacity);
        let (items_out_tx, items_out_rx) = mpsc::channel(capacity);

        let manager = Self {
            uuid: Uuid::new_v4(),
            registry,
            workflow: None,
            job_uuid: None,
            scheduled_tasks_tx,
            promises_rx,
            items_rx,
            items_out_tx,
            done,
        };
        let channels = ManagerChannels {
            scheduled_tasks_rx,
            promises_tx,
            items_tx,
            items_out_rx,
        };
        (manager, channels)
    }

    pub fn job_uuid(&self) -> Option<Uuid> {
        self.job_uuid
    }

    /// Validate the workflow, assign a job UUID, and emit one empty-input
    /// scheduled task per initial template.
    pub async fn start_scraping_job(&mut self, workflow: Workflow) -> Result<Uuid, ManagerError> {
        validate_workflow(&workflow, self.registry.as_ref())?;

        let job_uuid = Uuid::new_v4();
        info!(job = %job_uuid, workflow = %workflow.name, "starting scraping job");

        for template in workflow.initial_templates() {
            let promise = TaskPromise::new(&template.task_name, &workflow.name, job_uuid);
            let scheduled = ScheduledTask::new(
                promise,
                template.clone(),
                &workflow.name,
                &workflow.version,
            );
            self.scheduled_tasks_tx
                .send(scheduled)
                .await
                .map_err(|_| ManagerError::ChannelClosed)?;
        }

        self.workflow = Some(Arc::new(workflow));
        self.job_uuid = Some(job_uuid);
        Ok(job_uuid)
    }

    /// Workflow-level shutdown: stop recycling promises for the current job.
    pub fn stop_scraping_job(&mut self) {
        if let Some(job) = self.job_uuid.take() {
            info!(job = %job, "stopping scraping job");
        }
        self.workflow = None;
    }

    /// Main loop: recycle promises, forward items, exit on Done.
    pub async fn run(mut self) {
        info!(manager = %self.uuid, "starting manager run loop");
        loop {
            tokio::select! {
                maybe = self.promises_rx.recv() => match maybe {
                    Some(promise) => self.handle_promise(promise).await,
                    None => break,
                },
                maybe = self.items_rx.recv() => match maybe {
                    Some(item) => {
                        if self.items_out_tx.send(item).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                },
                changed = self.done.changed() => {
                    if changed.is_err() || *self.done.borrow() {
                        break;
                    }
                }
            }
        }
        info!(manager = %self.uuid, "manager run loop finished");
    }

    async fn handle_promise(&mut self, promise: TaskPromise) {
        let Some(workflow) = self.workflow.as_ref() else {
            warn!(task = %promise.task_name, "promise received with no active job; dropping");
            return;
        };

        let Some(template) = workflow.find_task_template(&promise.task_name) else {
            warn!(
                workflow = %workflow.name,
                task = %promise.task_name,
                "promise targets unknown task template; dropping"
            );
            return;
        };

        let scheduled = ScheduledTask::new(
            promise,
            template.clone(),
            &workflow.name,
            &workflow.version,
        );
        if self.scheduled_tasks_tx.send(scheduled).await.is_err() {
            warn!("scheduled tasks channel closed; dropping promise");
        }
    }
}
