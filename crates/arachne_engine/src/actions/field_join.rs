//! Field collection into items and maps.

use crate::action::{expect_value, Action, ActionCore};
use crate::materialize::TaskContext;
use crate::pipe::PipeValue;
use crate::ActionError;
use arachne_protocol::{ActionTemplate, Item, ProtocolError, Value};
use std::collections::HashMap;
use uuid::Uuid;

pub const OUTPUT_ITEM: &str = "item";
pub const OUTPUT_MAP: &str = "map";

/// Collects one value per configured input name into an [`Item`] (when an
/// item name is configured) and/or a string map value.
///
/// Join rounds repeat until every input pipe is drained, one value per
/// non-empty input per round, so N paired input values yield N items. Nothing
/// is emitted when all inputs are empty.
pub struct FieldJoinAction {
    core: ActionCore,
    input_names: Vec<String>,
    item_name: Option<String>,
    workflow_name: String,
    job_uuid: Uuid,
    task_uuid: Uuid,
}

impl FieldJoinAction {
    pub fn new(
        input_names: Vec<String>,
        item_name: Option<&str>,
        workflow_name: &str,
        job_uuid: Uuid,
        task_uuid: Uuid,
    ) -> Self {
        Self {
            core: ActionCore::new(
                "",
                false,
                input_names.clone(),
                vec![OUTPUT_ITEM.to_string(), OUTPUT_MAP.to_string()],
            ),
            input_names,
            item_name: item_name.map(str::to_string),
            workflow_name: workflow_name.to_string(),
            job_uuid,
            task_uuid,
        }
    }

    pub fn from_template(
        template: &ActionTemplate,
        ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, ProtocolError> {
        let input_names = template.require_strings("inputNames")?;
        let item_name = template.opt_str("itemName")?.map(str::to_string);

        let mut action = Self::new(
            input_names,
            item_name.as_deref(),
            &ctx.workflow_name,
            ctx.job_uuid,
            ctx.task_uuid,
        );
        action.core.name = template.name.clone();
        Ok(Box::new(action))
    }

    /// One value per non-empty input; `None` once everything is drained.
    fn next_round(&self) -> Result<Option<Vec<(String, Value)>>, ActionError> {
        let mut round = Vec::new();
        for name in &self.input_names {
            if let Some(value) = self.core.try_take_input(name) {
                round.push((name.clone(), expect_value(name, value)?));
            }
        }
        Ok(if round.is_empty() { None } else { Some(round) })
    }
}

impl Action for FieldJoinAction {
    fn core(&self) -> &ActionCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ActionCore {
        &mut self.core
    }

    fn run(&mut self) -> Result<(), ActionError> {
        if !self.core.has_output(OUTPUT_ITEM) && !self.core.has_output(OUTPUT_MAP) {
            return Err(ActionError::OutputNotConnected(OUTPUT_ITEM.to_string()));
        }

        while let Some(round) = self.next_round()? {
            if let Some(item_name) = self.item_name.as_deref() {
                if self.core.has_output(OUTPUT_ITEM) {
                    let mut item = Item::new(
                        item_name,
                        &self.workflow_name,
                        self.job_uuid,
                        self.task_uuid,
                    );
                    for (name, value) in &round {
                        item.set_field(name, value.clone());
                    }
                    self.core.fan_out(OUTPUT_ITEM, PipeValue::Item(item))?;
                }
            }

            if self.core.has_output(OUTPUT_MAP) {
                let map: HashMap<String, String> = round
                    .iter()
                    .map(|(name, value)| (name.clone(), value.coerce_string()))
                    .collect();
                self.core
                    .fan_out(OUTPUT_MAP, PipeValue::Value(Value::StringMap(map)))?;
            }
        }

        Ok(())
    }
}
