//! Relative URL resolution against a configured base.

use crate::action::{take_str, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, Value};
use url::Url;

pub const INPUT_RELATIVE_URL: &str = "relativeURL";
pub const OUTPUT_ABSOLUTE_URL: &str = "absoluteURL";

/// Resolves a relative URL against the configured base URL.
pub struct UrlJoinAction {
    core: ActionCore,
    base_url: String,
}

impl UrlJoinAction {
    pub fn new(base_url: &str, can_fail: bool) -> Self {
        Self {
            core: ActionCore::new(
                "",
                can_fail,
                vec![INPUT_RELATIVE_URL.to_string()],
                vec![OUTPUT_ABSOLUTE_URL.to_string()],
            ),
            base_url: base_url.to_string(),
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        _ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let base_url = template.require_str("baseURL")?.to_string();
        let can_fail = template.opt_bool("canFail")?.unwrap_or(false);

        let mut action = Self::new(&base_url, can_fail);
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }
}

impl Action for UrlJoinAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let relative = take_str(&self.core, INPUT_RELATIVE_URL)?;
        let absolute = Url::parse(&self.base_url)?.join(&relative)?;
        self.core.fan_out(
            OUTPUT_ABSOLUTE_URL,
            PipeValue::Value(Value::Str(absolute.to_string())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::DataPipe;

    fn join(base: &str, relative: &str) -> Result<String, ActionError> {
        let mut action = UrlJoinAction::new(base, false);
        let pipe_in = DataPipe::new();
        pipe_in.borrow_mut().push(Value::Str(relative.to_string()));
        action.add_input(INPUT_RELATIVE_URL, pipe_in).unwrap();
        let pipe_out = DataPipe::new();
        action.add_output(OUTPUT_ABSOLUTE_URL, pipe_out.clone()).unwrap();

        action.run()?;
        let result = match pipe_out.borrow_mut().pop() {
            Some(PipeValue::Value(Value::Str(s))) => Ok(s),
            other => panic!("unexpected output: {other:?}"),
        };
        result
    }

    #[test]
    fn test_join_relative_path() {
        assert_eq!(
            join("https://example.com/cgb/form499/", "detail.cfm?id=1").unwrap(),
            "https://example.com/cgb/form499/detail.cfm?id=1"
        );
    }

    #[test]
    fn test_join_absolute_path_replaces() {
        assert_eq!(
            join("https://example.com/a/b/", "/c").unwrap(),
            "https://example.com/c"
        );
    }

    #[test]
    fn test_invalid_base_is_error() {
        assert!(matches!(join("not a url", "/x"), Err(ActionError::Url(_))));
    }
}
