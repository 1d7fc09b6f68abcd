use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body for `POST /api/compliance/report` and the export endpoints.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub training_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Report {
    pub overall_compliance_rate: f64,
    pub total_employees: u64,
    pub compliant_employees: u64,
    pub non_compliant_employees: u64,
    pub departments: Vec<DepartmentCompliance>,
    /// Anything else the backend includes, kept verbatim for export.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepartmentCompliance {
    pub department_id: Option<i64>,
    pub department_name: String,
    pub total_employees: u64,
    pub compliant_employees: u64,
    pub compliance_rate: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Excel,
}

impl ExportFormat {
    /// Path segment used by `POST /api/compliance/export/{format}`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "excel",
        }
    }

    pub fn default_filename(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "compliance_report.pdf",
            ExportFormat::Excel => "compliance_report.xlsx",
        }
    }
}
