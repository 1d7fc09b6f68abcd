//! Dashboard view-model derivation.
//!
//! [`aggregate`] is a pure function: it reads an immutable snapshot of the
//! backend collections plus an explicit clock value and returns a fresh
//! [`DashboardView`]. Nothing here touches the network.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use entity::{
    Certification, Department, Employee, Enrollment, Training, certifications, dashboard,
    enrollments,
};
use serde::Serialize;

pub const PROGRESS_LIST_LIMIT: usize = 8;
pub const METRICS_LIST_LIMIT: usize = 4;
pub const EXPIRY_WINDOW_DAYS: i64 = 30;

pub const UNKNOWN_EMPLOYEE: &str = "Unknown Employee";
pub const UNKNOWN_TRAINING: &str = "Unknown Training";
pub const NO_DEPARTMENT: &str = "No Department";

/// Raw collections as fetched for one dashboard load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardInput {
    pub employees: Vec<Employee>,
    pub trainings: Vec<Training>,
    pub enrollments: Vec<Enrollment>,
    pub certifications: Vec<Certification>,
    pub departments: Vec<Department>,
    pub stats: dashboard::Stats,
}

impl From<dashboard::Data> for DashboardInput {
    fn from(data: dashboard::Data) -> Self {
        Self {
            employees: data.employees,
            trainings: data.trainings,
            enrollments: data.enrollments,
            certifications: data.certifications,
            departments: data.departments,
            stats: data.stats.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardView {
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
    pub employee_status: EmployeeStatusDistribution,
    pub top_performer: TopPerformer,
    pub certification_status: CertificationBreakdown,
    pub training_progress: Vec<TrainingProgress>,
    pub hr_metrics: HrMetrics,
}

/// Headline counters. Backend stats win when non-zero; otherwise the value
/// is derived from the fetched collections.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_employees: u64,
    pub active_employees: u64,
    pub total_trainings: u64,
    pub active_enrollments: u64,
    pub completed_enrollments: u64,
    pub total_certifications: u64,
    pub active_certifications: u64,
    pub expiring_certifications: u64,
    pub overdue_enrollments: u64,
    pub compliance_rate: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum EmployeeStatus {
    #[serde(rename = "In Training")]
    InTraining,
    Certified,
    Available,
    Completed,
}

impl EmployeeStatus {
    /// Display order of the distribution buckets.
    pub const ALL: [EmployeeStatus; 4] = [
        EmployeeStatus::InTraining,
        EmployeeStatus::Certified,
        EmployeeStatus::Available,
        EmployeeStatus::Completed,
    ];
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusBucket {
    pub status: EmployeeStatus,
    pub count: usize,
    pub percentage: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmployeeStatusDistribution {
    pub total: usize,
    pub buckets: Vec<StatusBucket>,
}

impl EmployeeStatusDistribution {
    pub fn bucket(&self, status: EmployeeStatus) -> Option<&StatusBucket> {
        self.buckets.iter().find(|bucket| bucket.status == status)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopPerformer {
    pub employee_id: Option<i64>,
    pub name: String,
    pub department: String,
    pub certifications: usize,
    pub performance: u32,
}

impl TopPerformer {
    pub fn placeholder() -> Self {
        Self {
            employee_id: None,
            name: "No Data".to_string(),
            department: "N/A".to_string(),
            certifications: 0,
            performance: 0,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.employee_id.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreakdownBucket {
    pub label: &'static str,
    pub count: usize,
    pub percentage: u32,
}

/// Certification progress against the training catalogue. Percentages use
/// total trainings as the denominator, unlike the employee distribution.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CertificationBreakdown {
    pub total_trainings: u64,
    pub buckets: Vec<BreakdownBucket>,
}

impl CertificationBreakdown {
    pub fn bucket(&self, label: &str) -> Option<&BreakdownBucket> {
        self.buckets.iter().find(|bucket| bucket.label == label)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainingProgress {
    pub enrollment_id: i64,
    pub employee_id: i64,
    pub employee_name: String,
    pub training_id: i64,
    pub training_name: String,
    pub status: enrollments::Status,
    pub progress: u8,
    pub is_overdue: bool,
    pub has_certification: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HrMetrics {
    pub employees: Vec<EmployeeMetric>,
    pub trainings: Vec<TrainingMetric>,
    pub departments: Vec<DepartmentMetric>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmployeeMetric {
    pub id: i64,
    pub name: String,
    pub position: String,
    pub department: String,
    pub status: EmployeeStatus,
    pub certifications: usize,
    pub active_enrollments: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainingMetric {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub enrolled: usize,
    pub completed: usize,
    pub status: &'static str,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DepartmentMetric {
    pub id: i64,
    pub name: String,
    pub employees: usize,
    pub certified_employees: usize,
}

/// Derive every dashboard view-model from one snapshot.
pub fn aggregate(input: &DashboardInput, now: DateTime<Utc>) -> DashboardView {
    let index = Index::build(input);
    let summary = summarize(input, &index, now);
    DashboardView {
        generated_at: now,
        employee_status: employee_status_distribution(input, &index),
        top_performer: top_performer(input, &index, summary.total_trainings),
        certification_status: certification_breakdown(input, summary.total_trainings),
        training_progress: training_progress(input, &index, now),
        hr_metrics: hr_metrics(input, &index),
        summary,
    }
}

/// Lookup tables shared by the individual derivations.
struct Index<'a> {
    employees: HashMap<i64, &'a Employee>,
    trainings: HashMap<i64, &'a Training>,
    departments: HashMap<i64, &'a Department>,
    in_training: HashSet<i64>,
    completed: HashSet<i64>,
    active_certs: HashMap<i64, usize>,
    active_enrollments: HashMap<i64, usize>,
    certified_pairs: HashSet<(i64, i64)>,
}

impl<'a> Index<'a> {
    fn build(input: &'a DashboardInput) -> Self {
        let mut in_training = HashSet::new();
        let mut completed = HashSet::new();
        let mut active_enrollments = HashMap::new();
        for enrollment in &input.enrollments {
            if enrollment.status.is_active() {
                in_training.insert(enrollment.employee_id);
                *active_enrollments.entry(enrollment.employee_id).or_insert(0) += 1;
            } else if enrollment.status == enrollments::Status::Completed {
                completed.insert(enrollment.employee_id);
            }
        }

        let mut active_certs = HashMap::new();
        let mut certified_pairs = HashSet::new();
        for cert in input.certifications.iter().filter(|c| c.is_active()) {
            *active_certs.entry(cert.employee_id).or_insert(0) += 1;
            certified_pairs.insert((cert.employee_id, cert.training_id));
        }

        Self {
            employees: input.employees.iter().map(|e| (e.id, e)).collect(),
            trainings: input.trainings.iter().map(|t| (t.id, t)).collect(),
            departments: input.departments.iter().map(|d| (d.id, d)).collect(),
            in_training,
            completed,
            active_certs,
            active_enrollments,
            certified_pairs,
        }
    }

    fn classify(&self, employee_id: i64) -> EmployeeStatus {
        if self.in_training.contains(&employee_id) {
            EmployeeStatus::InTraining
        } else if self.active_certs.contains_key(&employee_id) {
            EmployeeStatus::Certified
        } else if self.completed.contains(&employee_id) {
            EmployeeStatus::Completed
        } else {
            EmployeeStatus::Available
        }
    }

    fn active_cert_count(&self, employee_id: i64) -> usize {
        self.active_certs.get(&employee_id).copied().unwrap_or(0)
    }

    fn department_name(&self, employee: &Employee) -> String {
        employee
            .department
            .as_ref()
            .map(|dept| dept.name.clone())
            .filter(|name| !name.is_empty())
            .or_else(|| {
                employee
                    .department_ref()
                    .and_then(|id| self.departments.get(&id))
                    .map(|dept| dept.name.clone())
            })
            .unwrap_or_else(|| NO_DEPARTMENT.to_string())
    }

    fn employee_name(&self, employee_id: i64) -> String {
        self.employees
            .get(&employee_id)
            .map(|e| e.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_EMPLOYEE)
            .to_string()
    }

    fn training_name(&self, training_id: i64) -> String {
        self.trainings
            .get(&training_id)
            .map(|t| t.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_TRAINING)
            .to_string()
    }
}

fn summarize(input: &DashboardInput, index: &Index<'_>, now: DateTime<Utc>) -> Summary {
    let stats = &input.stats;
    let prefer = |reported: u64, derived: usize| {
        if reported > 0 { reported } else { derived as u64 }
    };
    let count_enrollments = |status: enrollments::Status| {
        input
            .enrollments
            .iter()
            .filter(|e| e.status == status)
            .count()
    };
    let active_enrollments = input
        .enrollments
        .iter()
        .filter(|e| e.status.is_active())
        .count();
    let active_certifications = index.active_certs.values().sum::<usize>();
    let expiry_horizon = now + Duration::days(EXPIRY_WINDOW_DAYS);
    let expiring = input
        .certifications
        .iter()
        .filter(|c| c.is_active())
        .filter(|c| c.expiry_date.is_some_and(|at| at > now && at <= expiry_horizon))
        .count();

    Summary {
        total_employees: prefer(stats.total_employees, input.employees.len()),
        active_employees: input.employees.iter().filter(|e| e.is_active).count() as u64,
        total_trainings: prefer(stats.total_trainings, input.trainings.len()),
        active_enrollments: prefer(stats.active_enrollments, active_enrollments),
        completed_enrollments: prefer(
            stats.completed_enrollments,
            count_enrollments(enrollments::Status::Completed),
        ),
        total_certifications: prefer(stats.total_certifications, input.certifications.len()),
        active_certifications: prefer(stats.active_certifications, active_certifications),
        expiring_certifications: prefer(stats.expiring_certifications, expiring),
        overdue_enrollments: input
            .enrollments
            .iter()
            .filter(|e| is_overdue(e, now))
            .count() as u64,
        compliance_rate: stats.compliance_rate,
    }
}

fn employee_status_distribution(
    input: &DashboardInput,
    index: &Index<'_>,
) -> EmployeeStatusDistribution {
    let mut counts = [0usize; 4];
    for employee in &input.employees {
        let status = index.classify(employee.id);
        let slot = EmployeeStatus::ALL
            .iter()
            .position(|s| *s == status)
            .unwrap_or(0);
        counts[slot] += 1;
    }
    let total = input.employees.len();
    let percentages = distribute_percentages(&counts, total);
    let buckets = EmployeeStatus::ALL
        .iter()
        .zip(counts.iter().zip(percentages))
        .map(|(status, (count, percentage))| StatusBucket {
            status: *status,
            count: *count,
            percentage,
        })
        .collect();
    EmployeeStatusDistribution { total, buckets }
}

/// Integer percentages of `total` that sum to exactly 100 when the counts
/// partition the total (largest-remainder rounding). All zero when `total`
/// is zero.
pub fn distribute_percentages(counts: &[usize], total: usize) -> Vec<u32> {
    if total == 0 {
        return vec![0; counts.len()];
    }
    if counts.iter().sum::<usize>() != total {
        return counts.iter().map(|c| percent_of(*c, total as u64)).collect();
    }
    let mut shares: Vec<u32> = counts
        .iter()
        .map(|count| (count * 100 / total) as u32)
        .collect();
    let assigned: u32 = shares.iter().sum();
    let mut by_remainder: Vec<usize> = (0..counts.len()).collect();
    by_remainder.sort_by_key(|&slot| std::cmp::Reverse(counts[slot] * 100 % total));
    for slot in by_remainder.into_iter().take(100u32.saturating_sub(assigned) as usize) {
        shares[slot] += 1;
    }
    shares
}

/// `round(part / whole * 100)`, zero when `whole` is zero. Not capped.
fn percent_of(part: usize, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round() as u32
}

fn top_performer(input: &DashboardInput, index: &Index<'_>, total_trainings: u64) -> TopPerformer {
    let counts: Vec<usize> = input
        .employees
        .iter()
        .map(|e| index.active_cert_count(e.id))
        .collect();
    let best = counts.iter().copied().max().unwrap_or(0);
    // Nobody stands out when every count is equal, a lone employee included.
    if counts.iter().all(|c| *c == best) {
        return TopPerformer::placeholder();
    }
    let Some(slot) = counts.iter().position(|c| *c == best) else {
        return TopPerformer::placeholder();
    };
    let employee = &input.employees[slot];
    TopPerformer {
        employee_id: Some(employee.id),
        name: index.employee_name(employee.id),
        department: index.department_name(employee),
        certifications: best,
        performance: percent_of(best, total_trainings).min(100),
    }
}

fn certification_breakdown(input: &DashboardInput, total_trainings: u64) -> CertificationBreakdown {
    let count_certs = |status: certifications::Status| {
        input
            .certifications
            .iter()
            .filter(|c| c.status == status)
            .count()
    };
    let count_enrollments = |status: enrollments::Status| {
        input
            .enrollments
            .iter()
            .filter(|e| e.status == status)
            .count()
    };
    let rows = [
        ("Certified", count_certs(certifications::Status::Active)),
        ("In Progress", count_enrollments(enrollments::Status::InProgress)),
        ("Not Started", count_enrollments(enrollments::Status::Enrolled)),
        ("Expired", count_certs(certifications::Status::Expired)),
    ];
    CertificationBreakdown {
        total_trainings,
        buckets: rows
            .into_iter()
            .map(|(label, count)| BreakdownBucket {
                label,
                count,
                percentage: percent_of(count, total_trainings),
            })
            .collect(),
    }
}

fn training_progress(
    input: &DashboardInput,
    index: &Index<'_>,
    now: DateTime<Utc>,
) -> Vec<TrainingProgress> {
    input
        .enrollments
        .iter()
        .take(PROGRESS_LIST_LIMIT)
        .map(|enrollment| TrainingProgress {
            enrollment_id: enrollment.id,
            employee_id: enrollment.employee_id,
            employee_name: index.employee_name(enrollment.employee_id),
            training_id: enrollment.training_id,
            training_name: index.training_name(enrollment.training_id),
            status: enrollment.status,
            progress: enrollment_progress(enrollment, now),
            is_overdue: is_overdue(enrollment, now),
            has_certification: index
                .certified_pairs
                .contains(&(enrollment.employee_id, enrollment.training_id)),
            start_date: enrollment.start_date,
            end_date: enrollment.end_date,
        })
        .collect()
}

/// Display progress for one enrollment, always within 0..=100.
///
/// Completed rows read 100. In-progress rows without a recorded value are
/// interpolated from how much of the scheduled window has elapsed; a stored
/// zero counts as not recorded, since the backend defaults the column to 0.
pub fn enrollment_progress(enrollment: &Enrollment, now: DateTime<Utc>) -> u8 {
    let recorded = enrollment.progress.filter(|p| *p != 0.0);
    let raw = match (enrollment.status, recorded) {
        (enrollments::Status::Completed, _) => 100.0,
        (enrollments::Status::InProgress, None) => {
            elapsed_fraction(enrollment.start_date, enrollment.end_date, now)
                .map_or(0.0, |fraction| fraction * 100.0)
        }
        (_, Some(progress)) => progress,
        (_, None) => 0.0,
    };
    clamp_percent(raw)
}

/// Past its end date and neither completed nor cancelled.
pub fn is_overdue(enrollment: &Enrollment, now: DateTime<Utc>) -> bool {
    !enrollment.status.is_closed() && enrollment.end_date.is_some_and(|end| end < now)
}

fn elapsed_fraction(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Option<f64> {
    let (start, end) = (start?, end?);
    let span = (end - start).num_milliseconds();
    if span <= 0 {
        return Some(if now >= end { 1.0 } else { 0.0 });
    }
    Some((now - start).num_milliseconds() as f64 / span as f64)
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

fn hr_metrics(input: &DashboardInput, index: &Index<'_>) -> HrMetrics {
    let employees = input
        .employees
        .iter()
        .take(METRICS_LIST_LIMIT)
        .map(|employee| EmployeeMetric {
            id: employee.id,
            name: index.employee_name(employee.id),
            position: employee
                .position
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "N/A".to_string()),
            department: index.department_name(employee),
            status: index.classify(employee.id),
            certifications: index.active_cert_count(employee.id),
            active_enrollments: index
                .active_enrollments
                .get(&employee.id)
                .copied()
                .unwrap_or(0),
        })
        .collect();

    let trainings = input
        .trainings
        .iter()
        .take(METRICS_LIST_LIMIT)
        .map(|training| {
            let rows = input
                .enrollments
                .iter()
                .filter(|e| e.training_id == training.id);
            let (enrolled, completed) = rows.fold((0, 0), |(enrolled, completed), e| {
                match e.status {
                    s if s.is_active() => (enrolled + 1, completed),
                    enrollments::Status::Completed => (enrolled, completed + 1),
                    _ => (enrolled, completed),
                }
            });
            TrainingMetric {
                id: training.id,
                name: training.name.clone(),
                category: training
                    .category
                    .clone()
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| "General".to_string()),
                enrolled,
                completed,
                status: if training.is_active { "Active" } else { "Inactive" },
            }
        })
        .collect();

    let departments = input
        .departments
        .iter()
        .take(METRICS_LIST_LIMIT)
        .map(|department| {
            let members: Vec<&Employee> = input
                .employees
                .iter()
                .filter(|e| e.department_ref() == Some(department.id))
                .collect();
            DepartmentMetric {
                id: department.id,
                name: department.name.clone(),
                employees: members.len(),
                certified_employees: members
                    .iter()
                    .filter(|e| index.active_cert_count(e.id) > 0)
                    .count(),
            }
        })
        .collect();

    HrMetrics {
        employees,
        trainings,
        departments,
    }
}
