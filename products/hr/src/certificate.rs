use chrono::{DateTime, Utc};
use entity::{Certification, Employee, Training, certifications};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateError {
    #[error("certificate {cert_number} references unknown employee {employee_id}")]
    MissingEmployee { cert_number: String, employee_id: i64 },
    #[error("certificate {cert_number} references unknown training {training_id}")]
    MissingTraining { cert_number: String, training_id: i64 },
}

/// Everything a certificate rendering needs, resolved from ids to names.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CertificateView {
    pub recipient: String,
    pub training: String,
    pub cert_number: String,
    pub issue_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub status: certifications::Status,
    pub file_stem: String,
}

impl CertificateView {
    pub fn resolve(
        cert: &Certification,
        employees: &[Employee],
        trainings: &[Training],
    ) -> Result<Self, CertificateError> {
        let employee = employees
            .iter()
            .find(|e| e.id == cert.employee_id)
            .ok_or_else(|| CertificateError::MissingEmployee {
                cert_number: cert.cert_number.clone(),
                employee_id: cert.employee_id,
            })?;
        let training = trainings
            .iter()
            .find(|t| t.id == cert.training_id)
            .ok_or_else(|| CertificateError::MissingTraining {
                cert_number: cert.cert_number.clone(),
                training_id: cert.training_id,
            })?;
        Ok(Self {
            recipient: employee.name.clone(),
            training: training.name.clone(),
            cert_number: cert.cert_number.clone(),
            issue_date: cert.issue_date,
            expiry_date: cert.expiry_date,
            status: cert.status,
            file_stem: file_stem(&cert.cert_number, cert.id),
        })
    }
}

/// `certificate-<cert_number>` with anything outside `[A-Za-z0-9._-]`
/// replaced; falls back to the record id when the number is blank.
fn file_stem(cert_number: &str, id: i64) -> String {
    let cleaned: String = cert_number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        format!("certificate-{id}")
    } else {
        format!("certificate-{cleaned}")
    }
}
