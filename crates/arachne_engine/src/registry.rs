//! Explicit action registry: struct name to factory.
//!
//! Replaces reflection-style lookup with a total mapping; an unknown struct
//! name is a fatal workflow-validation error, not a runtime surprise.

use crate::actions;
use crate::materialize::TaskContext;
use crate::{Action, TaskError};
use arachne_protocol::{ActionTemplate, ProtocolError, Workflow};
use std::collections::HashMap;

pub type ActionFactory =
    fn(&ActionTemplate, &TaskContext) -> Result<Box<dyn Action>, ProtocolError>;

pub struct ActionRegistry {
    factories: HashMap<&'static str, ActionFactory>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with the whole built-in action library.
    pub fn with_builtin_actions() -> Self {
        let mut registry = Self::new();
        registry.register("HTTPAction", actions::HttpAction::from_template);
        registry.register("XPathAction", actions::XPathAction::from_template);
        registry.register("JSONPathAction", actions::JsonPathAction::from_template);
        registry.register("StringCutAction", actions::StringCutAction::from_template);
        registry.register("UTF8DecodeAction", actions::Utf8DecodeAction::from_template);
        registry.register("UTF8EncodeAction", actions::Utf8EncodeAction::from_template);
        registry.register("URLJoinAction", actions::UrlJoinAction::from_template);
        registry.register(
            "HTTPCookieJoinAction",
            actions::HttpCookieJoinAction::from_template,
        );
        registry.register("ConstAction", actions::ConstAction::from_template);
        registry.register("FieldJoinAction", actions::FieldJoinAction::from_template);
        registry.register("TaskPromiseAction", actions::TaskPromiseAction::from_template);
        registry
    }

    pub fn register(&mut self, struct_name: &'static str, factory: ActionFactory) {
        self.factories.insert(struct_name, factory);
    }

    pub fn contains(&self, struct_name: &str) -> bool {
        self.factories.contains_key(struct_name)
    }

    pub fn build(
        &self,
        template: &ActionTemplate,
        ctx: &TaskContext,
    ) -> Result<Box<dyn Action>, TaskError> {
        let factory = self
            .factories
            .get(template.struct_name.as_str())
            .ok_or_else(|| TaskError::UnknownStructName(template.struct_name.clone()))?;
        factory(template, ctx).map_err(TaskError::Protocol)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtin_actions()
    }
}

/// Full pre-start validation: structural workflow rules plus a dry
/// instantiation of every action template against the registry.
pub fn validate_workflow(workflow: &Workflow, registry: &ActionRegistry) -> Result<(), TaskError> {
    workflow.validate()?;

    let ctx = TaskContext::dry_run();
    for template in &workflow.task_templates {
        for action_template in &template.action_templates {
            registry.build(action_template, &ctx)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arachne_protocol::{TaskTemplate, Value};
    use std::collections::HashMap;

    fn workflow_with_action(struct_name: &str, params: HashMap<String, Value>) -> Workflow {
        Workflow {
            name: "wf".to_string(),
            version: "v1".to_string(),
            task_templates: vec![TaskTemplate {
                task_name: "t".to_string(),
                initial: true,
                action_templates: vec![ActionTemplate {
                    name: "A".to_string(),
                    struct_name: struct_name.to_string(),
                    constructor_params: params,
                }],
                data_pipe_templates: vec![],
            }],
        }
    }

    #[test]
    fn test_builtin_names_registered() {
        let registry = ActionRegistry::with_builtin_actions();
        for name in [
            "HTTPAction",
            "XPathAction",
            "JSONPathAction",
            "StringCutAction",
            "UTF8DecodeAction",
            "UTF8EncodeAction",
            "URLJoinAction",
            "HTTPCookieJoinAction",
            "ConstAction",
            "FieldJoinAction",
            "TaskPromiseAction",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
    }

    #[test]
    fn test_unknown_struct_name_fails_validation() {
        let registry = ActionRegistry::with_builtin_actions();
        let workflow = workflow_with_action("MysteryAction", HashMap::new());
        assert!(matches!(
            validate_workflow(&workflow, &registry),
            Err(TaskError::UnknownStructName(_))
        ));
    }

    #[test]
    fn test_missing_required_param_fails_validation() {
        let registry = ActionRegistry::with_builtin_actions();
        // StringCutAction without its anchors.
        let workflow = workflow_with_action("StringCutAction", HashMap::new());
        assert!(matches!(
            validate_workflow(&workflow, &registry),
            Err(TaskError::Protocol(ProtocolError::MissingParam { .. }))
        ));
    }

    #[test]
    fn test_valid_workflow_passes() {
        let registry = ActionRegistry::with_builtin_actions();
        let workflow = workflow_with_action(
            "StringCutAction",
            HashMap::from([
                ("from".to_string(), Value::Str("<b>".into())),
                ("to".to_string(), Value::Str("</b>".into())),
            ]),
        );
        validate_workflow(&workflow, &registry).unwrap();
    }
}
