//! UTF-8 byte/string conversion actions.

use crate::action::{take_bytes, take_str, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, ProtocolError, Value};

pub const DECODE_INPUT_BYTES: &str = "bytes";
pub const DECODE_OUTPUT_STR: &str = "str";

pub const ENCODE_INPUT_STR: &str = "str";
pub const ENCODE_OUTPUT_BYTES: &str = "bytes";

/// Decodes bytes as strict UTF-8; the result fans out to all bound pipes.
pub struct Utf8DecodeAction {
    core: ActionCore,
}

impl Utf8DecodeAction {
    pub fn new(can_fail: bool) -> Self {
        Self {
            core: ActionCore::new(
                "",
                can_fail,
                vec![DECODE_INPUT_BYTES.to_string()],
                vec![DECODE_OUTPUT_STR.to_string()],
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
}

impl Action for Utf8DecodeAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let bytes = take_bytes(&self.core, DECODE_INPUT_BYTES)?;
        let text = String::from_utf8(bytes)?;
        self.core
            .fan_out(DECODE_OUTPUT_STR, PipeValue::Value(Value::Str(text)))
    }
}

/// Encodes a string into its UTF-8 bytes.
pub struct Utf8EncodeAction {
    core: ActionCore,
}

impl Utf8EncodeAction {
    pub fn new(can_fail: bool) -> Self {
        Self {
            core: ActionCore::new(
                "",
                can_fail,
                vec![ENCODE_INPUT_STR.to_string()],
                vec![ENCODE_OUTPUT_BYTES.to_string()],
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
}

impl Action for Utf8EncodeAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        let text = take_str(&self.core, ENCODE_INPUT_STR)?;
        self.core.fan_out(
            ENCODE_OUTPUT_BYTES,
            PipeValue::Value(Value::Bytes(text.into_bytes())),
        )
    }
}
