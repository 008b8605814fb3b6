//! Task materialization: turning a scheduled task back into a runnable graph.

use crate::pipe::DataPipe;
use crate::registry::ActionRegistry;
use crate::{Task, TaskError};
use arachne_protocol::{PipeShape, ProtocolError, ScheduledTask};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Identity of the task an action is being constructed into. Actions that
/// stamp items or promises (field-join, task-promise) read it at build time.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub workflow_name: String,
    pub job_uuid: Uuid,
    pub task_uuid: Uuid,
}

impl TaskContext {
    pub fn new(workflow_name: &str, job_uuid: Uuid, task_uuid: Uuid) -> Self {
        Self {
            workflow_name: workflow_name.to_string(),
            job_uuid,
            task_uuid,
        }
    }

    /// Context for validation-only instantiation, with nil identities.
    pub fn dry_run() -> Self {
        Self {
            workflow_name: String::new(),
            job_uuid: Uuid::nil(),
            task_uuid: Uuid::nil(),
        }
    }
}

/// Build a runnable [`Task`] from a [`ScheduledTask`]: construct actions via
/// the registry, wire pipes for all four template shapes, seed constants, and
/// seed task inputs from the promise's input data.
pub fn task_from_scheduled(
    scheduled: &ScheduledTask,
    registry: &ActionRegistry,
) -> Result<Task, TaskError> {
    let template = &scheduled.template;
    let mut task = Task::new(
        &template.task_name,
        &scheduled.workflow_name,
        scheduled.job_uuid(),
    );
    let ctx = TaskContext::new(&scheduled.workflow_name, scheduled.job_uuid(), task.uuid);

    let mut index_by_name: HashMap<String, usize> = HashMap::new();
    for action_template in &template.action_templates {
        let action = registry.build(action_template, &ctx)?;
        index_by_name.insert(action_template.name.clone(), task.actions.len());
        task.actions.push(action);
    }

    let resolve = |name: &str| -> Result<usize, TaskError> {
        index_by_name.get(name).copied().ok_or_else(|| {
            TaskError::Protocol(ProtocolError::UnknownActionRef {
                task: template.task_name.clone(),
                action: name.to_string(),
            })
        })
    };
    let wiring = |action: &str| {
        let action = action.to_string();
        move |source| TaskError::Wiring { action, source }
    };

    for (index, pipe_template) in template.data_pipe_templates.iter().enumerate() {
        match pipe_template.shape(&template.task_name, index)? {
            PipeShape::ActionToAction {
                source_action,
                source_output,
                dest_action,
                dest_input,
            } => {
                let (src, dst) = (resolve(&source_action)?, resolve(&dest_action)?);
                let pipe = DataPipe::new();
                task.actions[src]
                    .add_output(&source_output, pipe.clone())
                    .map_err(wiring(&source_action))?;
                task.actions[dst]
                    .add_input(&dest_input, pipe.clone())
                    .map_err(wiring(&dest_action))?;
                task.pipes.push(pipe);
            }
            PipeShape::TaskInputToAction {
                task_input,
                dest_action,
                dest_input,
            } => {
                let dst = resolve(&dest_action)?;
                let pipe = DataPipe::new();
                task.actions[dst]
                    .add_input(&dest_input, pipe.clone())
                    .map_err(wiring(&dest_action))?;
                task.inputs.entry(task_input).or_default().push(pipe.clone());
                task.pipes.push(pipe);
            }
            PipeShape::ActionToTaskOutput {
                source_action,
                source_output,
                task_output,
            } => {
                let src = resolve(&source_action)?;
                let pipe = DataPipe::new();
                task.actions[src]
                    .add_output(&source_output, pipe.clone())
                    .map_err(wiring(&source_action))?;
                task.outputs.entry(task_output).or_default().push(pipe.clone());
                task.pipes.push(pipe);
            }
            PipeShape::ConstToAction {
                value,
                dest_action,
                dest_input,
            } => {
                let dst = resolve(&dest_action)?;
                let pipe = DataPipe::new();
                pipe.borrow_mut().push(value);
                task.actions[dst]
                    .add_input(&dest_input, pipe.clone())
                    .map_err(wiring(&dest_action))?;
                task.pipes.push(pipe);
            }
        }
    }

    for (name, values) in &scheduled.promise.input_data {
        match task.inputs.get(name) {
            Some(pipes) => {
                for pipe in pipes {
                    for value in values {
                        pipe.borrow_mut().push(value.clone());
                    }
                }
            }
            None => warn!(
                task = %template.task_name,
                input = %name,
                "promise input has no matching task input pipe; dropping"
            ),
        }
    }

    task.check_pipe_closure()?;
    Ok(task)
}
