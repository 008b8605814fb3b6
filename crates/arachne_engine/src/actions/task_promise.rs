//! Promise emission: re-enqueue work as a new task instantiation request.

use crate::action::{expect_value, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, TaskPromise};
use uuid::Uuid;

pub const OUTPUT_PROMISE: &str = "promise";

/// Builds one [`TaskPromise`] per run targeting the configured task name.
/// `input_data[name]` receives every value drained from pipe `name`.
pub struct TaskPromiseAction {
    core: ActionCore,
    task_name: String,
    workflow_name: String,
    job_uuid: Uuid,
    input_names: Vec<String>,
}

impl TaskPromiseAction {
    pub fn new(
        input_names: Vec<String>,
        task_name: &str,
        workflow_name: &str,
        job_uuid: Uuid,
    ) -> Self {
        Self {
            core: ActionCore::new(
                "",
                false,
                input_names.clone(),
                vec![OUTPUT_PROMISE.to_string()],
            ),
            task_name: task_name.to_string(),
            workflow_name: workflow_name.to_string(),
            job_uuid,
            input_names,
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let input_names = template.require_strings("inputNames")?;
        let task_name = template.require_str("taskName")?.to_string();

        let mut action = Self::new(input_names, &task_name, &ctx.workflow_name, ctx.job_uuid);
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }
}

impl Action for TaskPromiseAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let mut promise = TaskPromise::new(&self.task_name, &self.workflow_name, self.job_uuid);

        for name in &self.input_names {
            if !self.core.has_input(name) {
                continue;
            }
            let mut values = Vec::new();
            for value in self.core.drain_input(name) {
                values.push(expect_value(name, value)?);
            }
            promise.input_data.insert(name.clone(), values);
        }

        self.core.fan_out(OUTPUT_PROMISE, PipeValue::Promise(promise))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::DataPipe;
    use arachne_protocol::Value;

    #[test]
    fn test_one_promise_with_all_drained_inputs() {
        let job_uuid = Uuid::new_v4();
        let mut action = TaskPromiseAction::new(
            vec!["a".to_string(), "b".to_string()],
            "T",
            "wf",
            job_uuid,
        );

        for name in ["a", "b"] {
            let pipe = DataPipe::new();
            pipe.borrow_mut().push(Value::Str("x".into()));
            action.add_input(name, pipe).unwrap();
        }

        let out = DataPipe::new();
        action.add_output(OUTPUT_PROMISE, out.clone()).unwrap();
        action.run().unwrap();

        assert_eq!(out.borrow().len(), 1);
        match out.borrow_mut().pop() {
            Some(PipeValue::Promise(promise)) => {
                assert_eq!(promise.task_name, "T");
                assert_eq!(promise.workflow_name, "wf");
                assert_eq!(promise.job_uuid, job_uuid);
                assert_eq!(
                    promise.input_data.get("a"),
                    Some(&vec![Value::Str("x".into())])
                );
                assert_eq!(
                    promise.input_data.get("b"),
                    Some(&vec![Value::Str("x".into())])
                );
            }
            other => panic!("unexpected output: {other:?}"),
        };
    }

    #[test]
    fn test_drains_every_value() {
        let mut action =
            TaskPromiseAction::new(vec!["state".to_string()], "ScrapeList", "wf", Uuid::new_v4());

        let pipe = DataPipe::new();
        for state in ["alaska", "maine", "ohio"] {
            pipe.borrow_mut().push(Value::Str(state.into()));
        }
        action.add_input("state", pipe.clone()).unwrap();

        let out = DataPipe::new();
        action.add_output(OUTPUT_PROMISE, out.clone()).unwrap();
        action.run().unwrap();

        assert!(pipe.borrow().is_empty());
        match out.borrow_mut().pop() {
            Some(PipeValue::Promise(promise)) => {
                assert_eq!(promise.input_data.get("state").map(Vec::len), Some(3));
            }
            other => panic!("unexpected output: {other:?}"),
        };
    }

    #[test]
    fn test_unconnected_input_omitted() {
        let mut action = TaskPromiseAction::new(
            vec!["a".to_string(), "b".to_string()],
            "T",
            "wf",
            Uuid::new_v4(),
        );

        let pipe = DataPipe::new();
        pipe.borrow_mut().push(Value::Str("x".into()));
        action.add_input("a", pipe).unwrap();

        let out = DataPipe::new();
        action.add_output(OUTPUT_PROMISE, out.clone()).unwrap();
        action.run().unwrap();

        match out.borrow_mut().pop() {
            Some(PipeValue::Promise(promise)) => {
                assert!(promise.input_data.contains_key("a"));
                assert!(!promise.input_data.contains_key("b"));
            }
            other => panic!("unexpected output: {other:?}"),
        };
    }
}
