//! Runnable tasks: a DAG of actions executed sequentially in dependency order.

use crate::pipe::{DataPipeRef, PipeValue};
use crate::{Action, TaskError};
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tracing::warn;
use uuid::Uuid;

/// A materialized task template: actions plus the pipes wiring them.
///
/// Invariant: every pipe is a task input, a task output, or connects two
/// actions of this task (constant-seeded pipes count as inputs - they have no
/// producer). Boundary maps allow several pipes per name; the same task input
/// may feed more than one action.
pub struct Task {
    pub uuid: Uuid,
    pub name: String,
    pub workflow_name: String,
    pub job_uuid: Uuid,
    pub actions: Vec<Box<dyn Action>>,
    pub pipes: Vec<DataPipeRef>,
    pub inputs: HashMap<String, Vec<DataPipeRef>>,
    pub outputs: HashMap<String, Vec<DataPipeRef>>,
}

impl Task {
    pub fn new(name: &str, workflow_name: &str, job_uuid: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            workflow_name: workflow_name.to_string(),
            job_uuid,
            actions: Vec::new(),
            pipes: Vec::new(),
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Kahn's algorithm over the wired pipes. Ties resolve to the action
    /// inserted first; a cycle is a fatal error.
    pub fn sort_actions_topologically(&self) -> Result<Vec<usize>, TaskError> {
        let index_of: HashMap<Uuid, usize> = self
            .actions
            .iter()
            .enumerate()
            .map(|(i, a)| (a.unique_id(), i))
            .collect();

        let mut in_degree = vec![0usize; self.actions.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.actions.len()];

        for (i, action) in self.actions.iter().enumerate() {
            for pred in action.preceding_actions() {
                if let Some(&p) = index_of.get(&pred) {
                    in_degree[i] += 1;
                    dependents[p].push(i);
                }
            }
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(self.actions.len());
        while let Some(&next) = ready.iter().next() {
            ready.remove(&next);
            order.push(next);
            for &dep in &dependents[next] {
                in_degree[dep] -= 1;
                if in_degree[dep] == 0 {
                    ready.insert(dep);
                }
            }
        }

        if order.len() != self.actions.len() {
            return Err(TaskError::CyclicDependency(self.name.clone()));
        }
        Ok(order)
    }

    /// Run every action once, in topological order. An action failure aborts
    /// the task unless that action allows failure; no action is retried.
    pub fn run(&mut self) -> Result<(), TaskError> {
        let order = self.sort_actions_topologically()?;

        for index in order {
            let action = &mut self.actions[index];
            if let Err(error) = action.run() {
                if action.failure_allowed() {
                    warn!(
                        task = %self.name,
                        action = %action.name(),
                        %error,
                        "action failed; failure is allowed, continuing"
                    );
                } else {
                    return Err(TaskError::ActionFailed {
                        action: action.name().to_string(),
                        source: error,
                    });
                }
            }
        }

        Ok(())
    }

    /// Values left on task-output pipes after the run, drained in sorted
    /// output-name order.
    pub fn drain_outputs(&mut self) -> Vec<PipeValue> {
        let mut names: Vec<&String> = self.outputs.keys().collect();
        names.sort();

        let mut values = Vec::new();
        for name in names {
            for pipe in &self.outputs[name] {
                while let Some(value) = pipe.borrow_mut().pop() {
                    values.push(value);
                }
            }
        }
        values
    }

    /// Verify the pipe-closure invariant.
    pub fn check_pipe_closure(&self) -> Result<(), TaskError> {
        let action_ids: BTreeSet<Uuid> = self.actions.iter().map(|a| a.unique_id()).collect();
        let is_boundary = |pipe: &DataPipeRef| {
            self.inputs
                .values()
                .chain(self.outputs.values())
                .flatten()
                .any(|p| Rc::ptr_eq(p, pipe))
        };

        for pipe in &self.pipes {
            if is_boundary(pipe) {
                continue;
            }
            let borrowed = pipe.borrow();
            let ok = match (borrowed.from_action, borrowed.to_action) {
                (Some(from), Some(to)) => {
                    action_ids.contains(&from) && action_ids.contains(&to)
                }
                // Constant-seeded pipes have a consumer but no producer.
                (None, Some(to)) => action_ids.contains(&to),
                _ => false,
            };
            if !ok {
                return Err(TaskError::DanglingPipe(borrowed.uuid));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::const_action::{ConstAction, OUTPUT as CONST_OUTPUT};
    use crate::actions::string_cut::{StringCutAction, INPUT_STR, OUTPUT_STR};
    use crate::actions::utf8::{
        Utf8DecodeAction, Utf8EncodeAction, DECODE_INPUT_BYTES, DECODE_OUTPUT_STR,
        ENCODE_INPUT_STR, ENCODE_OUTPUT_BYTES,
    };
    use crate::pipe::DataPipe;
    use arachne_protocol::Value;

    fn wire(
        src: &mut Box<dyn Action>,
        src_port: &str,
        dst: &mut Box<dyn Action>,
        dst_port: &str,
    ) -> DataPipeRef {
        let pipe = DataPipe::new();
        src.add_output(src_port, pipe.clone()).unwrap();
        dst.add_input(dst_port, pipe.clone()).unwrap();
        pipe
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let mut task = Task::new("t", "wf", Uuid::new_v4());

        // encode -> decode chain, plus an independent constant first.
        let mut konst: Box<dyn Action> = Box::new(ConstAction::new(Value::Str("c".into())));
        let mut encode: Box<dyn Action> = Box::new(Utf8EncodeAction::new(false));
        let mut decode: Box<dyn Action> = Box::new(Utf8DecodeAction::new(false));

        let pipe = wire(&mut encode, ENCODE_OUTPUT_BYTES, &mut decode, DECODE_INPUT_BYTES);
        let out = DataPipe::new();
        konst.add_output(CONST_OUTPUT, out.clone()).unwrap();

        // Insert decode before encode to prove ordering is edge-driven.
        task.actions.push(decode);
        task.actions.push(encode);
        task.actions.push(konst);
        task.pipes.push(pipe);
        task.outputs.insert("out".to_string(), vec![out]);

        let order = task.sort_actions_topologically().unwrap();
        assert_eq!(order.len(), 3);
        let decode_pos = order.iter().position(|&i| i == 0).unwrap();
        let encode_pos = order.iter().position(|&i| i == 1).unwrap();
        assert!(encode_pos < decode_pos);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let mut task = Task::new("t", "wf", Uuid::new_v4());
        for value in ["a", "b", "c"] {
            let mut action: Box<dyn Action> =
                Box::new(ConstAction::new(Value::Str(value.into())));
            let out = DataPipe::new();
            action.add_output(CONST_OUTPUT, out.clone()).unwrap();
            task.outputs.entry("out".to_string()).or_default().push(out);
            task.actions.push(action);
        }

        assert_eq!(task.sort_actions_topologically().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut task = Task::new("t", "wf", Uuid::new_v4());
        let mut encode: Box<dyn Action> = Box::new(Utf8EncodeAction::new(false));
        let mut decode: Box<dyn Action> = Box::new(Utf8DecodeAction::new(false));

        let forward = wire(&mut encode, ENCODE_OUTPUT_BYTES, &mut decode, DECODE_INPUT_BYTES);
        let backward = wire(&mut decode, DECODE_OUTPUT_STR, &mut encode, ENCODE_INPUT_STR);

        task.actions.push(encode);
        task.actions.push(decode);
        task.pipes.push(forward);
        task.pipes.push(backward);

        assert!(matches!(
            task.sort_actions_topologically(),
            Err(TaskError::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_run_executes_chain_and_drains_outputs() {
        let mut task = Task::new("t", "wf", Uuid::new_v4());

        let mut konst: Box<dyn Action> = Box::new(ConstAction::new(Value::Str("abc".into())));
        let mut encode: Box<dyn Action> = Box::new(Utf8EncodeAction::new(false));

        let between = wire(&mut konst, CONST_OUTPUT, &mut encode, ENCODE_INPUT_STR);
        let out = DataPipe::new();
        encode.add_output(ENCODE_OUTPUT_BYTES, out.clone()).unwrap();

        task.actions.push(konst);
        task.actions.push(encode);
        task.pipes.push(between);
        task.pipes.push(out.clone());
        task.outputs.insert("bytes".to_string(), vec![out]);

        task.run().unwrap();
        let drained = task.drain_outputs();
        assert_eq!(
            drained,
            vec![PipeValue::Value(Value::Bytes(b"abc".to_vec()))]
        );
    }

    #[test]
    fn test_failure_aborts_unless_allowed() {
        // StringCut on input without anchors fails.
        let build = |can_fail: bool| {
            let mut task = Task::new("t", "wf", Uuid::new_v4());
            let mut cut: Box<dyn Action> =
                Box::new(StringCutAction::new("<b>", "</b>", can_fail));

            let input = DataPipe::new();
            input.borrow_mut().push(Value::Str("plain text".into()));
            cut.add_input(INPUT_STR, input.clone()).unwrap();
            let out = DataPipe::new();
            cut.add_output(OUTPUT_STR, out.clone()).unwrap();

            task.actions.push(cut);
            task.pipes.push(input.clone());
            task.pipes.push(out.clone());
            task.inputs.insert("page".to_string(), vec![input]);
            task.outputs.insert("cut".to_string(), vec![out]);
            task
        };

        assert!(matches!(
            build(false).run(),
            Err(TaskError::ActionFailed { .. })
        ));
        build(true).run().unwrap();
    }

    #[test]
    fn test_pipe_closure_rejects_dangling_pipe() {
        let mut task = Task::new("t", "wf", Uuid::new_v4());
        let stray = DataPipe::new();
        stray.borrow_mut().from_action = Some(Uuid::new_v4());
        stray.borrow_mut().to_action = Some(Uuid::new_v4());
        task.pipes.push(stray);

        assert!(matches!(
            task.check_pipe_closure(),
            Err(TaskError::DanglingPipe(_))
        ));
    }
}
