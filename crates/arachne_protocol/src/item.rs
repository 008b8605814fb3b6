//! Items: the terminal output of a scraping job.

use crate::Value;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A named field bag emitted by a field-join action wired to a task output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub uuid: Uuid,
    pub name: String,
    pub workflow_name: String,
    pub job_uuid: Uuid,
    pub task_uuid: Uuid,
    pub scraped_at: DateTime<Utc>,
    pub fields: HashMap<String, Value>,
}

impl Item {
    pub fn new(name: &str, workflow_name: &str, job_uuid: Uuid, task_uuid: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.to_string(),
            workflow_name: workflow_name.to_string(),
            job_uuid,
            task_uuid,
            scraped_at: Utc::now(),
            fields: HashMap::new(),
        }
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Flat string rendering of a field; empty string when the field is absent.
    pub fn field_string(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(Value::coerce_string)
            .unwrap_or_default()
    }

    /// Field names in sorted order, for deterministic headers.
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.fields.keys().cloned().collect();
        names.sort();
        names
    }
}
