//! Constant value emission.

use crate::action::{Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, Value};

pub const OUTPUT: &str = "out";

/// Emits a clone of the configured constant on every run.
pub struct ConstAction {
    core: ActionCore,
    value: Value,
}

impl ConstAction {
    pub fn new(value: Value) -> Self {
        Self {
            core: ActionCore::new("", false, vec![], vec![OUTPUT.to_string()]),
            value,
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        _ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let value = template
            .param("c")
            .cloned()
            .ok_or_else(|| ProtocolError::MissingParam {
                action: template.name.clone(),
                param: "c".to_string(),
            })?;

        let mut action = Self::new(value);
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }
}

impl Action for ConstAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        self.core
            .fan_out(OUTPUT, PipeValue::Value(self.value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::DataPipe;

    #[test]
    fn test_emits_constant_each_run() {
        let mut action = ConstAction::new(Value::Str("Any Type".into()));
        let out = DataPipe::new();
        action.add_output(OUTPUT, out.clone()).unwrap();

        action.run().unwrap();
        action.run().unwrap();

        assert_eq!(out.borrow().len(), 2);
        assert_eq!(
            out.borrow_mut().pop(),
            Some(PipeValue::Value(Value::Str("Any Type".into())))
        );
    }

    #[test]
    fn test_template_requires_constant() {
        let template = ActionTemplate {
            name: "Const".to_string(),
            struct_name: "ConstAction".to_string(),
            constructor_params: Default::default(),
        };
        assert!(matches!(
            ConstAction::from_template(&template, &TaskContext::dry_run()),
            Err(ProtocolError::MissingParam { .. })
        ));
    }
}
