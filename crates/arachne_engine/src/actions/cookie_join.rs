//! Cookie-set merging.

use crate::action::{expect_value, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, Value};
use std::collections::HashMap;

pub const INPUT_OLD_COOKIES: &str = "oldCookies";
pub const INPUT_NEW_COOKIES: &str = "newCookies";
pub const OUTPUT_UPDATED_COOKIES: &str = "updatedCookies";

/// Overlays a new cookie set onto an old one; new wins by cookie name.
pub struct HttpCookieJoinAction {
    core: ActionCore,
}

impl HttpCookieJoinAction {
    pub fn new(can_fail: bool) -> Self {
        Self {
            core: ActionCore::new(
                "",
                can_fail,
                vec![INPUT_OLD_COOKIES.to_string(), INPUT_NEW_COOKIES.to_string()],
                vec![OUTPUT_UPDATED_COOKIES.to_string()],
            ),
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        _ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let can_fail = template.opt_bool("canFail")?.unwrap_or(false);
        let mut action = Self::new(can_fail);
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }

    fn take_cookies(&self, input: &str) -> Result<HashMap<String, String>, ActionError> {
        match expect_value(input, self.core.take_input(input)?)? {
            Value::Cookies(cookies) => Ok(cookies),
            other => Err(ActionError::BadInputType {
                input: input.to_string(),
                expected: "cookies",
                got: other.type_name().to_string(),
            }),
        }
    }
}

impl Action for HttpCookieJoinAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let mut merged = self.take_cookies(INPUT_OLD_COOKIES)?;
        let new = self.take_cookies(INPUT_NEW_COOKIES)?;
        merged.extend(new);

        self.core.fan_out(
            OUTPUT_UPDATED_COOKIES,
            PipeValue::Value(Value::Cookies(merged)),
        )
    }
}
