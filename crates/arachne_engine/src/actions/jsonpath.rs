//! JSONPath extraction.

use crate::action::{take_str, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, Value};

pub const INPUT_JSON_STR: &str = "jsonStr";
pub const OUTPUT_STR: &str = "str";

/// Applies a JSONPath expression to a JSON string input.
///
/// With `decode` the matched node is serialized back to JSON text; without it
/// the node's plain string value is emitted. `expect_many` has the same
/// cardinality contract as the xpath action.
pub struct JsonPathAction {
    core: ActionCore,
    json_path: String,
    expect_many: bool,
    decode: bool,
}

impl JsonPathAction {
    pub fn new(json_path: &str, expect_many: bool, decode: bool, can_fail: bool) -> Self {
        Self {
            core: ActionCore::new(
                "",
                can_fail,
                vec![INPUT_JSON_STR.to_string()],
                vec![OUTPUT_STR.to_string()],
            ),
            json_path: json_path.to_string(),
            expect_many,
            decode,
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        _ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let json_path = template.require_str("jsonPath")?.to_string();
        let expect_many = template.opt_bool("expectMany")?.unwrap_or(false);
        let decode = template.opt_bool("decode")?.unwrap_or(false);
        let can_fail = template.opt_bool("canFail")?.unwrap_or(false);

        let mut action = Self::new(&json_path, expect_many, decode, can_fail);
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }

    fn render(&self, node: &serde_json::Value) -> String {
        if self.decode {
            node.to_string()
        } else {
            match node {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            }
        }
    }
}

impl Action for JsonPathAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let json_str = take_str(&self.core, INPUT_JSON_STR)?;
        let parsed: serde_json::Value = serde_json::from_str(&json_str)?;

        let found =
            jsonpath_lib::select(&parsed, &self.json_path).map_err(|e| ActionError::JsonPath {
                path: self.json_path.clone(),
                message: e.to_string(),
            })?;
        let rendered: Vec<String> = found.iter().map(|node| self.render(node)).collect();

        if self.expect_many {
            for text in rendered {
                self.core.fan_out(OUTPUT_STR, PipeValue::Value(Value::Str(text)))?;
            }
            Ok(())
        } else {
            match rendered.into_iter().next() {
                Some(first) => self
                    .core
                    .fan_out(OUTPUT_STR, PipeValue::Value(Value::Str(first))),
                None => Err(ActionError::NoMatch {
                    xpath: self.json_path.clone(),
                }),
            }
        }
    }
}
