//! Substring extraction between two anchors.

use crate::action::{take_str, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, Value};

pub const INPUT_STR: &str = "str";
pub const OUTPUT_STR: &str = "str";

/// Finds `from`, then `to` after it, and emits the substring in between.
/// A missing anchor is a runtime error.
pub struct StringCutAction {
    core: ActionCore,
    from: String,
    to: String,
}

impl StringCutAction {
    pub fn new(from: &str, to: &str, can_fail: bool) -> Self {
        Self {
            core: ActionCore::new(
                "",
                can_fail,
                vec![INPUT_STR.to_string()],
                vec![OUTPUT_STR.to_string()],
            ),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        _ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let from = template.require_str("from")?.to_string();
        let to = template.require_str("to")?.to_string();
        let can_fail = template.opt_bool("canFail")?.unwrap_or(false);

        let mut action = Self::new(&from, &to, can_fail);
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }
}

impl Action for StringCutAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let input = take_str(&self.core, INPUT_STR)?;

        let start = input
            .find(&self.from)
            .ok_or_else(|| ActionError::AnchorNotFound(self.from.clone()))?
            + self.from.len();
        let end = input[start..]
            .find(&self.to)
            .ok_or_else(|| ActionError::AnchorNotFound(self.to.clone()))?
            + start;

        self.core.fan_out(
            OUTPUT_STR,
            PipeValue::Value(Value::Str(input[start..end].to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::DataPipe;

    fn run_cut(input: &str, from: &str, to: &str) -> Result<Option<String>, ActionError> {
        let mut action = StringCutAction::new(from, to, false);
        let pipe_in = DataPipe::new();
        pipe_in.borrow_mut().push(Value::Str(input.to_string()));
        action.add_input(INPUT_STR, pipe_in).unwrap();
        let pipe_out = DataPipe::new();
        action.add_output(OUTPUT_STR, pipe_out.clone()).unwrap();

        action.run()?;
        let result = match pipe_out.borrow_mut().pop() {
            Some(PipeValue::Value(Value::Str(s))) => Some(s),
            _ => None,
        };
        Ok(result)
    }

    #[test]
    fn test_cut_between_anchors() {
        let result = run_cut("<b>hello world</b>", "<b>", "</b>").unwrap();
        assert_eq!(result, Some("hello world".to_string()));
    }

    #[test]
    fn test_to_anchor_searched_after_from() {
        let result = run_cut("</b>ignored<b>kept</b>", "<b>", "</b>").unwrap();
        assert_eq!(result, Some("kept".to_string()));
    }

    #[test]
    fn test_missing_anchors_error() {
        assert!(matches!(
            run_cut("no markup here", "<b>", "</b>"),
            Err(ActionError::AnchorNotFound(_))
        ));
        assert!(matches!(
            run_cut("<b>unclosed", "<b>", "</b>"),
            Err(ActionError::AnchorNotFound(_))
        ));
    }

    #[test]
    fn test_output_must_be_connected() {
        let mut action = StringCutAction::new("<b>", "</b>", false);
        let pipe_in = DataPipe::new();
        pipe_in.borrow_mut().push(Value::Str("<b>x</b>".into()));
        action.add_input(INPUT_STR, pipe_in).unwrap();

        assert!(matches!(
            action.run(),
            Err(ActionError::OutputNotConnected(_))
        ));
    }
}
