//! Client-side search over fetched collections.

use std::collections::HashMap;

use entity::{Certification, Department, Employee, Enrollment, Training, certifications, enrollments};

fn contains(field: Option<&str>, needle: &str) -> bool {
    field.is_some_and(|value| value.to_lowercase().contains(needle))
}

fn needle(query: &str) -> Option<String> {
    let query = query.trim();
    (!query.is_empty()).then(|| query.to_lowercase())
}

/// Match on name, position or department name. The embedded department wins
/// over a lookup in `departments`. A blank query matches everything.
pub fn search_employees<'a>(
    employees: &'a [Employee],
    departments: &[Department],
    query: &str,
) -> Vec<&'a Employee> {
    let Some(needle) = needle(query) else {
        return employees.iter().collect();
    };
    let names: HashMap<i64, &str> = departments
        .iter()
        .map(|d| (d.id, d.name.as_str()))
        .collect();
    employees
        .iter()
        .filter(|e| {
            let department = e
                .department
                .as_ref()
                .map(|d| d.name.as_str())
                .or_else(|| e.department_ref().and_then(|id| names.get(&id).copied()));
            contains(Some(&e.name), &needle)
                || contains(e.position.as_deref(), &needle)
                || contains(department, &needle)
        })
        .collect()
}

pub fn search_trainings<'a>(trainings: &'a [Training], query: &str) -> Vec<&'a Training> {
    let Some(needle) = needle(query) else {
        return trainings.iter().collect();
    };
    trainings
        .iter()
        .filter(|t| {
            contains(Some(&t.name), &needle)
                || contains(t.category.as_deref(), &needle)
                || contains(t.description.as_deref(), &needle)
        })
        .collect()
}

pub fn active_employees<'a>(employees: impl IntoIterator<Item = &'a Employee>) -> Vec<&'a Employee> {
    employees.into_iter().filter(|e| e.is_active).collect()
}

pub fn active_trainings<'a>(trainings: impl IntoIterator<Item = &'a Training>) -> Vec<&'a Training> {
    trainings.into_iter().filter(|t| t.is_active).collect()
}

pub fn enrollments_with_status(
    enrollments: &[Enrollment],
    status: enrollments::Status,
) -> Vec<&Enrollment> {
    enrollments.iter().filter(|e| e.status == status).collect()
}

pub fn certifications_with_status(
    certifications: &[Certification],
    status: certifications::Status,
) -> Vec<&Certification> {
    certifications
        .iter()
        .filter(|c| c.status == status)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn employees() -> Vec<Employee> {
        serde_json::from_value(json!([
            { "id": 1, "name": "Ada Lovelace", "position": "Analyst", "department_id": 10 },
            { "id": 2, "name": "Grace Hopper", "position": "Admiral",
              "department": { "id": 20, "name": "Navy" }, "is_active": false },
            { "id": 3, "name": "Alan Turing", "position": null, "department_id": 30 }
        ]))
        .unwrap()
    }

    fn departments() -> Vec<Department> {
        serde_json::from_value(json!([
            { "id": 10, "name": "Research" },
            { "id": 30, "name": "Cryptography" }
        ]))
        .unwrap()
    }

    fn ids<T>(rows: &[&T], id: impl Fn(&T) -> i64) -> Vec<i64> {
        rows.iter().map(|r| id(*r)).collect()
    }

    #[test]
    fn employee_search_is_case_insensitive_across_fields() {
        let employees = employees();
        let departments = departments();
        let by_name = search_employees(&employees, &departments, "  GRACE ");
        assert_eq!(ids(&by_name, |e| e.id), vec![2]);
        let by_position = search_employees(&employees, &departments, "analyst");
        assert_eq!(ids(&by_position, |e| e.id), vec![1]);
        let by_department = search_employees(&employees, &departments, "crypto");
        assert_eq!(ids(&by_department, |e| e.id), vec![3]);
        let embedded = search_employees(&employees, &[], "navy");
        assert_eq!(ids(&embedded, |e| e.id), vec![2]);
    }

    #[test]
    fn blank_query_matches_everything() {
        let employees = employees();
        assert_eq!(search_employees(&employees, &[], "   ").len(), 3);
    }

    #[test]
    fn active_filter_composes_with_search() {
        let employees = employees();
        let found = search_employees(&employees, &departments(), "a");
        let active = active_employees(found);
        assert_eq!(ids(&active, |e| e.id), vec![1, 3]);
    }

    #[test]
    fn training_search_checks_category_and_description() {
        let trainings: Vec<Training> = serde_json::from_value(json!([
            { "id": 1, "name": "Forklift", "category": "Safety" },
            { "id": 2, "name": "Onboarding", "description": "First week essentials", "is_active": false }
        ]))
        .unwrap();
        assert_eq!(ids(&search_trainings(&trainings, "safe"), |t| t.id), vec![1]);
        assert_eq!(ids(&search_trainings(&trainings, "WEEK"), |t| t.id), vec![2]);
        assert!(active_trainings(&trainings).iter().all(|t| t.id == 1));
    }

    #[test]
    fn status_filters() {
        let enrollments: Vec<Enrollment> = serde_json::from_value(json!([
            { "id": 1, "employee_id": 1, "training_id": 1, "status": "completed" },
            { "id": 2, "employee_id": 1, "training_id": 2, "status": "in_progress" }
        ]))
        .unwrap();
        let done = enrollments_with_status(&enrollments, enrollments::Status::Completed);
        assert_eq!(ids(&done, |e| e.id), vec![1]);

        let certifications: Vec<Certification> = serde_json::from_value(json!([
            { "id": 5, "employee_id": 1, "training_id": 1, "cert_number": "C-5", "status": "expired" },
            { "id": 6, "employee_id": 2, "training_id": 1, "cert_number": "C-6", "status": "active" }
        ]))
        .unwrap();
        let expired = certifications_with_status(&certifications, certifications::Status::Expired);
        assert_eq!(ids(&expired, |c| c.id), vec![5]);
    }
}
