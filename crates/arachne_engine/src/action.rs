//! The action capability trait and the state record shared by all actions.

use crate::pipe::{DataPipeRef, PipeValue};
use crate::ActionError;
use arachne_protocol::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// A single stateless operation used as a building block for tasks.
///
/// Concrete actions implement `run` and expose their shared state through
/// `core`/`core_mut`; the wiring and graph capabilities are provided methods
/// over that state.
pub trait Action {
    fn core(&self) -> &ActionCore;
    fn core_mut(&mut self) -> &mut ActionCore;

    /// Consume one round of inputs, compute, and append to output pipes.
    fn run(&mut self) -> Result<(), ActionError>;

    fn add_input(&mut self, name: &str, pipe: DataPipeRef) -> Result<(), ActionError> {
        self.core_mut().add_input(name, pipe)
    }

    fn add_output(&mut self, name: &str, pipe: DataPipeRef) -> Result<(), ActionError> {
        self.core_mut().add_output(name, pipe)
    }

    fn unique_id(&self) -> Uuid {
        self.core().uuid
    }

    fn name(&self) -> &str {
        &self.core().name
    }

    /// Distinct producers of all currently bound input pipes.
    fn preceding_actions(&self) -> Vec<Uuid> {
        self.core().preceding_actions()
    }

    fn failure_allowed(&self) -> bool {
        self.core().can_fail
    }
}

/// State every action carries: identity, allowed port names, bound pipes.
#[derive(Debug)]
pub struct ActionCore {
    pub uuid: Uuid,
    pub name: String,
    pub can_fail: bool,
    allowed_inputs: Vec<String>,
    allowed_outputs: Vec<String>,
    inputs: HashMap<String, DataPipeRef>,
    outputs: HashMap<String, Vec<DataPipeRef>>,
}

impl ActionCore {
    pub fn new(
        name: &str,
        can_fail: bool,
        allowed_inputs: Vec<String>,
        allowed_outputs: Vec<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            can_fail,
            allowed_inputs,
            allowed_outputs,
            inputs: HashMap::new(),
            outputs: HashMap::new(),
        }
    }

    /// Bind a pipe to an input port. One pipe per name; later binds replace.
    pub fn add_input(&mut self, name: &str, pipe: DataPipeRef) -> Result<(), ActionError> {
        if !self.allowed_inputs.iter().any(|n| n == name) {
            return Err(ActionError::InputNameNotAllowed(name.to_string()));
        }
        pipe.borrow_mut().to_action = Some(self.uuid);
        self.inputs.insert(name.to_string(), pipe);
        Ok(())
    }

    /// Bind a pipe to an output port. A name may fan out to many pipes.
    pub fn add_output(&mut self, name: &str, pipe: DataPipeRef) -> Result<(), ActionError> {
        if !self.allowed_outputs.iter().any(|n| n == name) {
            return Err(ActionError::OutputNameNotAllowed(name.to_string()));
        }
        pipe.borrow_mut().from_action = Some(self.uuid);
        self.outputs.entry(name.to_string()).or_default().push(pipe);
        Ok(())
    }

    pub fn input(&self, name: &str) -> Option<&DataPipeRef> {
        self.inputs.get(name)
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.get(name).is_some_and(|pipes| !pipes.is_empty())
    }

    /// Take one value from a connected input; errors when unconnected or dry.
    pub fn take_input(&self, name: &str) -> Result<PipeValue, ActionError> {
        let pipe = self
            .inputs
            .get(name)
            .ok_or_else(|| ActionError::InputNotConnected(name.to_string()))?;
        pipe.borrow_mut()
            .pop()
            .ok_or_else(|| ActionError::InputExhausted(name.to_string()))
    }

    /// Take one value if the input is connected and non-empty.
    pub fn try_take_input(&self, name: &str) -> Option<PipeValue> {
        self.inputs.get(name).and_then(|pipe| pipe.borrow_mut().pop())
    }

    /// Drain every value from a connected input, in pop order.
    pub fn drain_input(&self, name: &str) -> Vec<PipeValue> {
        let mut values = Vec::new();
        if let Some(pipe) = self.inputs.get(name) {
            while let Some(value) = pipe.borrow_mut().pop() {
                values.push(value);
            }
        }
        values
    }

    /// Deliver the same value to every pipe bound to an output port.
    pub fn fan_out(&self, name: &str, value: PipeValue) -> Result<(), ActionError> {
        let pipes = self
            .outputs
            .get(name)
            .filter(|pipes| !pipes.is_empty())
            .ok_or_else(|| ActionError::OutputNotConnected(name.to_string()))?;
        for pipe in pipes {
            pipe.borrow_mut().push(value.clone());
        }
        Ok(())
    }

    /// Like [`fan_out`](Self::fan_out) but a no-op when nothing is bound.
    pub fn fan_out_if_connected(&self, name: &str, value: PipeValue) {
        if self.has_output(name) {
            // Cannot fail: the port is bound.
            let _ = self.fan_out(name, value);
        }
    }

    pub fn preceding_actions(&self) -> Vec<Uuid> {
        let mut seen = Vec::new();
        for pipe in self.inputs.values() {
            if let Some(from) = pipe.borrow().from_action {
                if !seen.contains(&from) {
                    seen.push(from);
                }
            }
        }
        seen
    }
}

/// Unwrap a pipe value into a plain [`Value`], rejecting items and promises.
pub(crate) fn expect_value(input: &str, value: PipeValue) -> Result<Value, ActionError> {
    match value {
        PipeValue::Value(v) => Ok(v),
        other => Err(ActionError::BadInputType {
            input: input.to_string(),
            expected: "value",
            got: other.type_name(),
        }),
    }
}

/// Take one string from an input port.
pub(crate) fn take_str(core: &ActionCore, input: &str) -> Result<String, ActionError> {
    match expect_value(input, core.take_input(input)?)? {
        Value::Str(s) => Ok(s),
        other => Err(ActionError::BadInputType {
            input: input.to_string(),
            expected: "str",
            got: other.type_name().to_string(),
        }),
    }
}

/// Take one byte buffer from an input port.
pub(crate) fn take_bytes(core: &ActionCore, input: &str) -> Result<Vec<u8>, ActionError> {
    match expect_value(input, core.take_input(input)?)? {
        Value::Bytes(b) => Ok(b),
        other => Err(ActionError::BadInputType {
            input: input.to_string(),
            expected: "bytes",
            got: other.type_name().to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::DataPipe;
    use std::rc::Rc;

    fn core() -> ActionCore {
        ActionCore::new(
            "test",
            false,
            vec!["in".to_string()],
            vec!["out".to_string()],
        )
    }

    #[test]
    fn test_add_input_validates_name() {
        let mut core = core();
        let pipe = DataPipe::new();

        assert!(matches!(
            core.add_input("bad_name", pipe.clone()),
            Err(ActionError::InputNameNotAllowed(_))
        ));

        core.add_input("in", pipe.clone()).unwrap();
        assert!(Rc::ptr_eq(core.input("in").unwrap(), &pipe));
    }

    #[test]
    fn test_add_output_accepts_many_pipes() {
        let mut core = core();
        let p1 = DataPipe::new();
        let p2 = DataPipe::new();

        assert!(matches!(
            core.add_output("bad_name", p1.clone()),
            Err(ActionError::OutputNameNotAllowed(_))
        ));

        core.add_output("out", p1.clone()).unwrap();
        core.add_output("out", p2.clone()).unwrap();

        core.fan_out("out", PipeValue::Value(Value::Str("x".into())))
            .unwrap();
        assert_eq!(p1.borrow().len(), 1);
        assert_eq!(p2.borrow().len(), 1);
    }

    #[test]
    fn test_take_input_errors() {
        let mut core = core();
        assert!(matches!(
            core.take_input("in"),
            Err(ActionError::InputNotConnected(_))
        ));

        core.add_input("in", DataPipe::new()).unwrap();
        assert!(matches!(
            core.take_input("in"),
            Err(ActionError::InputExhausted(_))
        ));
    }

    #[test]
    fn test_preceding_actions_deduplicates() {
        let producer = Uuid::new_v4();
        let mut core = ActionCore::new(
            "join",
            false,
            vec!["a".to_string(), "b".to_string()],
            vec![],
        );

        let p1 = DataPipe::new();
        p1.borrow_mut().from_action = Some(producer);
        let p2 = DataPipe::new();
        p2.borrow_mut().from_action = Some(producer);

        core.add_input("a", p1).unwrap();
        core.add_input("b", p2).unwrap();

        assert_eq!(core.preceding_actions(), vec![producer]);
    }
}
