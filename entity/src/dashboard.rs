use serde::{Deserialize, Serialize};

use crate::{certifications, departments, employees, enrollments, trainings};

/// `GET /api/dashboard/stats`. Every counter defaults to zero so a partial
/// payload still decodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub total_employees: u64,
    pub total_trainings: u64,
    pub active_enrollments: u64,
    pub completed_enrollments: u64,
    pub total_certifications: u64,
    pub active_certifications: u64,
    pub expiring_certifications: u64,
    pub compliance_rate: f64,
}

/// `GET /api/dashboard/dashboard-data`: the raw collections in one round trip.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Data {
    pub employees: Vec<employees::Model>,
    pub trainings: Vec<trainings::Model>,
    pub enrollments: Vec<enrollments::Model>,
    pub certifications: Vec<certifications::Model>,
    pub departments: Vec<departments::Model>,
    pub stats: Option<Stats>,
}
