//! XPath 1.0 extraction over leniently parsed HTML.

use crate::action::{expect_value, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, Value};
use sxd_xpath::{Context, Factory};

pub const INPUT_HTML_STR: &str = "htmlStr";
pub const INPUT_HTML_BYTES: &str = "htmlBytes";
pub const OUTPUT_STR: &str = "str";

/// Evaluates an XPath 1.0 expression against parsed HTML.
///
/// The HTML parser recovers from broken markup, so bad input never panics -
/// it just yields no matches. With `expect_many` matches are pushed in
/// document order (consumers pop the tail, so they observe reverse document
/// order); without it only the first match is emitted and an empty node set
/// is an error.
pub struct XPathAction {
    core: ActionCore,
    xpath: String,
    expect_many: bool,
}

impl XPathAction {
    pub fn new(xpath: &str, expect_many: bool, can_fail: bool) -> Self {
        Self {
            core: ActionCore::new(
                "",
                can_fail,
                vec![INPUT_HTML_STR.to_string(), INPUT_HTML_BYTES.to_string()],
                vec![OUTPUT_STR.to_string()],
            ),
            xpath: xpath.to_string(),
            expect_many,
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        _ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let xpath = template.require_str("xpath")?.to_string();
        let expect_many = template.opt_bool("expectMany")?.unwrap_or(false);
        let can_fail = template.opt_bool("canFail")?.unwrap_or(false);

        let mut action = Self::new(&xpath, expect_many, can_fail);
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }

    fn html_input(&self) -> Result<String, ActionError> {
        if self.core.has_input(INPUT_HTML_STR) {
            match expect_value(INPUT_HTML_STR, self.core.take_input(INPUT_HTML_STR)?)? {
                Value::Str(s) => Ok(s),
                other => Err(ActionError::BadInputType {
                    input: INPUT_HTML_STR.to_string(),
                    expected: "str",
                    got: other.type_name().to_string(),
                }),
            }
        } else if self.core.has_input(INPUT_HTML_BYTES) {
            match expect_value(INPUT_HTML_BYTES, self.core.take_input(INPUT_HTML_BYTES)?)? {
                Value::Bytes(b) => Ok(String::from_utf8_lossy(&b).into_owned()),
                other => Err(ActionError::BadInputType {
                    input: INPUT_HTML_BYTES.to_string(),
                    expected: "bytes",
                    got: other.type_name().to_string(),
                }),
            }
        } else {
            Err(ActionError::InputNotConnected(INPUT_HTML_STR.to_string()))
        }
    }

    fn evaluate(&self, html: &str) -> Result<Vec<String>, ActionError> {
        let package = sxd_html::parse_html(html);
        let document = package.as_document();

        let xpath = Factory::new()
            .build(&self.xpath)
            .map_err(|e| ActionError::XPath {
                xpath: self.xpath.clone(),
                message: e.to_string(),
            })?
            .ok_or_else(|| ActionError::XPath {
                xpath: self.xpath.clone(),
                message: "empty expression".to_string(),
            })?;

        let context = Context::new();
        let value = xpath
            .evaluate(&context, document.root())
            .map_err(|e| ActionError::XPath {
                xpath: self.xpath.clone(),
                message: e.to_string(),
            })?;

        let matches = match value {
            sxd_xpath::Value::Nodeset(set) => set
                .document_order()
                .iter()
                .map(|node| node.string_value())
                .collect(),
            sxd_xpath::Value::String(s) => vec![s],
            sxd_xpath::Value::Number(n) => vec![n.to_string()],
            sxd_xpath::Value::Boolean(b) => vec![b.to_string()],
        };
        Ok(matches)
    }
}

impl Action for XPathAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let html = self.html_input()?;
        let matches = self.evaluate(&html)?;

        if self.expect_many {
            for text in matches {
                self.core.fan_out(OUTPUT_STR, PipeValue::Value(Value::Str(text)))?;
            }
            Ok(())
        } else {
            match matches.into_iter().next() {
                Some(first) => self
                    .core
                    .fan_out(OUTPUT_STR, PipeValue::Value(Value::Str(first))),
                None => Err(ActionError::NoMatch {
                    xpath: self.xpath.clone(),
                }),
            }
        }
    }
}
