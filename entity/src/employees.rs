use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::departments;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    /// Present when the backend expands the relation inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<departments::Model>,
    #[serde(default = "default_active", alias = "active")]
    pub is_active: bool,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub hire_date: Option<DateTime<Utc>>,
}

impl Model {
    /// Department id from either the flat column or the expanded relation.
    pub fn department_ref(&self) -> Option<i64> {
        self.department_id
            .or_else(|| self.department.as_ref().map(|dept| dept.id))
    }
}

fn default_active() -> bool {
    true
}

/// Body for `POST /employees` and `PUT /employees/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}
