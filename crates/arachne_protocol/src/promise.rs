//! Cross-task continuations: promises and the scheduled tasks built from them.

use crate::{TaskTemplate, Value};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A runtime request to instantiate a task template with named inputs.
///
/// Emitted by a task-promise action; recycled into a [`ScheduledTask`] by the
/// manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPromise {
    pub uuid: Uuid,
    pub task_name: String,
    pub workflow_name: String,
    pub job_uuid: Uuid,
    pub input_data: HashMap<String, Vec<Value>>,
}

impl TaskPromise {
    pub fn new(task_name: &str, workflow_name: &str, job_uuid: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            task_name: task_name.to_string(),
            workflow_name: workflow_name.to_string(),
            job_uuid,
            input_data: HashMap::new(),
        }
    }
}

/// A promise bundled with the full task template, so a worker can materialize
/// the task without sharing memory with the manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub uuid: Uuid,
    pub promise: TaskPromise,
    pub template: TaskTemplate,
    pub workflow_name: String,
    pub workflow_version: String,
}

impl ScheduledTask {
    pub fn new(
        promise: TaskPromise,
        template: TaskTemplate,
        workflow_name: &str,
        workflow_version: &str,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            promise,
            template,
            workflow_name: workflow_name.to_string(),
            workflow_version: workflow_version.to_string(),
        }
    }

    pub fn job_uuid(&self) -> Uuid {
        self.promise.job_uuid
    }

    pub fn task_name(&self) -> &str {
        &self.template.task_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promise_roundtrip() {
        let mut promise = TaskPromise::new("ParseHTML", "hn", Uuid::new_v4());
        promise
            .input_data
            .insert("htmlStr".to_string(), vec![Value::Str("<html/>".into())]);

        let raw = serde_json::to_string(&promise).unwrap();
        let back: TaskPromise = serde_json::from_str(&raw).unwrap();
        assert_eq!(promise, back);
    }

    #[test]
    fn test_scheduled_task_roundtrip() {
        let promise = TaskPromise::new("ParseHTML", "hn", Uuid::new_v4());
        let template = TaskTemplate {
            task_name: "ParseHTML".to_string(),
            initial: false,
            action_templates: vec![],
            data_pipe_templates: vec![],
        };
        let scheduled = ScheduledTask::new(promise, template, "hn", "v1");

        let raw = serde_json::to_string(&scheduled).unwrap();
        let back: ScheduledTask = serde_json::from_str(&raw).unwrap();
        assert_eq!(scheduled, back);
    }
}
