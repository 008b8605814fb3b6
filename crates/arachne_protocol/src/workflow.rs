//! Declarative workflow blueprints.
//!
//! A workflow is a static set of task templates, exactly one of which is
//! marked initial. Task templates describe actions and the data pipes wiring
//! them; the engine turns them into runnable tasks. Validation here is purely
//! structural - action construction (unknown struct names, bad params) is
//! checked by the engine's registry on top of this.

use crate::{ProtocolError, Value};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Blueprint for a single action inside a task template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub name: String,
    pub struct_name: String,
    #[serde(default)]
    pub constructor_params: HashMap<String, Value>,
}

impl ActionTemplate {
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.constructor_params.get(key)
    }

    /// Required string param; missing or mistyped is a validation error.
    pub fn require_str(&self, key: &str) -> Result<&str, ProtocolError> {
        match self.param(key) {
            Some(value) => value.as_str().ok_or_else(|| ProtocolError::ParamType {
                action: self.name.clone(),
                param: key.to_string(),
                expected: "str",
                got: value.type_name(),
            }),
            None => Err(ProtocolError::MissingParam {
                action: self.name.clone(),
                param: key.to_string(),
            }),
        }
    }

    /// Required list-of-strings param.
    pub fn require_strings(&self, key: &str) -> Result<Vec<String>, ProtocolError> {
        match self.param(key) {
            Some(value) => value
                .as_strings()
                .map(|s| s.to_vec())
                .ok_or_else(|| ProtocolError::ParamType {
                    action: self.name.clone(),
                    param: key.to_string(),
                    expected: "strings",
                    got: value.type_name(),
                }),
            None => Err(ProtocolError::MissingParam {
                action: self.name.clone(),
                param: key.to_string(),
            }),
        }
    }

    /// Optional string param; `None` when absent, error when mistyped.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>, ProtocolError> {
        match self.param(key) {
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| ProtocolError::ParamType {
                    action: self.name.clone(),
                    param: key.to_string(),
                    expected: "str",
                    got: value.type_name(),
                }),
            None => Ok(None),
        }
    }

    /// Optional bool param; `None` when absent, error when mistyped.
    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, ProtocolError> {
        match self.param(key) {
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| ProtocolError::ParamType {
                    action: self.name.clone(),
                    param: key.to_string(),
                    expected: "bool",
                    got: value.type_name(),
                }),
            None => Ok(None),
        }
    }
}

/// Blueprint for one data pipe. Up to six optional fields, of which exactly
/// one of the four shapes returned by [`DataPipeTemplate::shape`] must hold.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPipeTemplate {
    pub source_action_name: Option<String>,
    pub source_output_name: Option<String>,
    pub dest_action_name: Option<String>,
    pub dest_input_name: Option<String>,
    pub task_input_name: Option<String>,
    pub task_output_name: Option<String>,
    pub const_value: Option<Value>,
}

/// The four valid pipe-template shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum PipeShape {
    ActionToAction {
        source_action: String,
        source_output: String,
        dest_action: String,
        dest_input: String,
    },
    TaskInputToAction {
        task_input: String,
        dest_action: String,
        dest_input: String,
    },
    ActionToTaskOutput {
        source_action: String,
        source_output: String,
        task_output: String,
    },
    ConstToAction {
        value: Value,
        dest_action: String,
        dest_input: String,
    },
}

impl DataPipeTemplate {
    /// Classify this template, rejecting ambiguous or incomplete field sets.
    pub fn shape(&self, task: &str, index: usize) -> Result<PipeShape, ProtocolError> {
        let invalid = || ProtocolError::InvalidPipeShape {
            task: task.to_string(),
            index,
        };

        match (
            &self.source_action_name,
            &self.source_output_name,
            &self.dest_action_name,
            &self.dest_input_name,
            &self.task_input_name,
            &self.task_output_name,
            &self.const_value,
        ) {
            (Some(sa), Some(so), Some(da), Some(di), None, None, None) => {
                Ok(PipeShape::ActionToAction {
                    source_action: sa.clone(),
                    source_output: so.clone(),
                    dest_action: da.clone(),
                    dest_input: di.clone(),
                })
            }
            (None, None, Some(da), Some(di), Some(ti), None, None) => {
                Ok(PipeShape::TaskInputToAction {
                    task_input: ti.clone(),
                    dest_action: da.clone(),
                    dest_input: di.clone(),
                })
            }
            (Some(sa), Some(so), None, None, None, Some(to), None) => {
                Ok(PipeShape::ActionToTaskOutput {
                    source_action: sa.clone(),
                    source_output: so.clone(),
                    task_output: to.clone(),
                })
            }
            (None, None, Some(da), Some(di), None, None, Some(value)) => {
                Ok(PipeShape::ConstToAction {
                    value: value.clone(),
                    dest_action: da.clone(),
                    dest_input: di.clone(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

/// Blueprint for a runnable task: actions plus the pipes wiring them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub task_name: String,
    #[serde(default)]
    pub initial: bool,
    pub action_templates: Vec<ActionTemplate>,
    pub data_pipe_templates: Vec<DataPipeTemplate>,
}

impl TaskTemplate {
    pub fn find_action_template(&self, name: &str) -> Option<&ActionTemplate> {
        self.action_templates.iter().find(|a| a.name == name)
    }

    /// Task input names, deduplicated, in declaration order.
    pub fn task_input_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.data_pipe_templates
            .iter()
            .filter_map(|p| p.task_input_name.clone())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    /// Task output names, deduplicated, in declaration order.
    pub fn task_output_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.data_pipe_templates
            .iter()
            .filter_map(|p| p.task_output_name.clone())
            .filter(|name| seen.insert(name.clone()))
            .collect()
    }

    fn validate(&self) -> Result<(), ProtocolError> {
        let mut action_names = HashSet::new();
        for action in &self.action_templates {
            if !action_names.insert(action.name.as_str()) {
                return Err(ProtocolError::DuplicateActionName {
                    task: self.task_name.clone(),
                    action: action.name.clone(),
                });
            }
        }

        let known = |name: &str| action_names.contains(name);
        for (index, pipe) in self.data_pipe_templates.iter().enumerate() {
            let refs = match pipe.shape(&self.task_name, index)? {
                PipeShape::ActionToAction {
                    source_action,
                    dest_action,
                    ..
                } => vec![source_action, dest_action],
                PipeShape::TaskInputToAction { dest_action, .. } => vec![dest_action],
                PipeShape::ActionToTaskOutput { source_action, .. } => vec![source_action],
                PipeShape::ConstToAction { dest_action, .. } => vec![dest_action],
            };
            for name in refs {
                if !known(&name) {
                    return Err(ProtocolError::UnknownActionRef {
                        task: self.task_name.clone(),
                        action: name,
                    });
                }
            }
        }

        Ok(())
    }
}

/// A named, versioned set of task templates. Immutable once a job starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub name: String,
    pub version: String,
    pub task_templates: Vec<TaskTemplate>,
}

impl Workflow {
    pub fn find_task_template(&self, name: &str) -> Option<&TaskTemplate> {
        self.task_templates.iter().find(|t| t.task_name == name)
    }

    pub fn initial_templates(&self) -> impl Iterator<Item = &TaskTemplate> {
        self.task_templates.iter().filter(|t| t.initial)
    }

    /// Structural validation: exactly one initial template, unique names,
    /// well-shaped pipe templates with resolvable endpoints.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        let initial_count = self.initial_templates().count();
        if initial_count == 0 {
            return Err(ProtocolError::NoInitialTask {
                workflow: self.name.clone(),
            });
        }
        if initial_count > 1 {
            return Err(ProtocolError::MultipleInitialTasks {
                workflow: self.name.clone(),
                count: initial_count,
            });
        }

        let mut task_names = HashSet::new();
        for template in &self.task_templates {
            if !task_names.insert(template.task_name.as_str()) {
                return Err(ProtocolError::DuplicateTaskName(template.task_name.clone()));
            }
            template.validate()?;
        }

        Ok(())
    }
}
