use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub id: i64,
    pub employee_id: i64,
    pub training_id: i64,
    #[serde(default)]
    pub status: Status,
    /// Completion percentage. May be absent, null, or the column default 0
    /// when nothing has been recorded yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "crate::datetime::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub completed_date: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Enrolled,
    InProgress,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl Status {
    /// Statuses a client may filter on.
    pub const KNOWN: [Status; 4] = [
        Status::Enrolled,
        Status::InProgress,
        Status::Completed,
        Status::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Enrolled => "enrolled",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Cancelled => "cancelled",
            Status::Unknown => "unknown",
        }
    }

    /// Enrolled or in progress: the employee is currently in training.
    pub fn is_active(&self) -> bool {
        matches!(self, Status::Enrolled | Status::InProgress)
    }

    /// Completed and cancelled rows can never become overdue.
    pub fn is_closed(&self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "enrolled" => Some(Status::Enrolled),
            "in_progress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            "cancelled" | "canceled" => Some(Status::Cancelled),
            _ => None,
        }
    }
}

/// Body for `POST /enrollments` and `PUT /enrollments/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    pub employee_id: i64,
    pub training_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_status_does_not_fail_the_row() {
        let row: Model = serde_json::from_value(json!({
            "id": 1,
            "employee_id": 2,
            "training_id": 3,
            "status": "on_hold",
            "start_date": "2024-01-01",
            "end_date": null
        }))
        .unwrap();
        assert_eq!(row.status, Status::Unknown);
        assert!(row.start_date.is_some());
        assert!(row.end_date.is_none());
        assert!(row.progress.is_none());
    }

    #[test]
    fn status_parse_accepts_cli_spellings() {
        assert_eq!(Status::parse("In-Progress"), Some(Status::InProgress));
        assert_eq!(Status::parse("canceled"), Some(Status::Cancelled));
        assert_eq!(Status::parse("paused"), None);
    }

    #[test]
    fn known_statuses_parse_from_their_wire_names() {
        for status in Status::KNOWN {
            assert_eq!(Status::parse(status.as_str()), Some(status));
            assert_eq!(serde_json::to_value(status).unwrap(), json!(status.as_str()));
        }
    }
}
