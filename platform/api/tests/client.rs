mod common;

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use common::{TOKEN, spawn_backend, unreachable_client};
use entity::{compliance, employees, enrollments};
use platform_api::ApiError;
use serde_json::{Value, json};

fn employee(id: i64, name: &str) -> Value {
    json!({ "id": id, "name": name, "position": "Engineer", "department_id": 1, "is_active": true })
}

#[tokio::test]
async fn list_accepts_bare_arrays() {
    let router = Router::new().route(
        "/employees",
        get(|| async { Json(json!([employee(1, "Ada"), employee(2, "Grace")])) }),
    );
    let client = spawn_backend(router).await;

    let rows = client.list_employees().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].name, "Grace");
    assert_eq!(rows[0].department_ref(), Some(1));
}

#[tokio::test]
async fn list_accepts_wrapped_objects() {
    let router = Router::new().route(
        "/trainings",
        get(|| async {
            Json(json!({
                "trainings": [{ "id": 7, "name": "Safety", "category": "Compliance", "duration_hours": 4 }],
                "total": 1
            }))
        }),
    );
    let client = spawn_backend(router).await;

    let rows = client.list_trainings().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 7);
    assert_eq!(rows[0].duration_hours, Some(4.0));
    assert!(rows[0].is_active);
}

#[tokio::test]
async fn list_with_absent_key_or_empty_array_is_empty() {
    let router = Router::new()
        .route("/certifications", get(|| async { Json(json!({ "total": 0 })) }))
        .route("/departments", get(|| async { Json(json!([])) }));
    let client = spawn_backend(router).await;

    assert!(client.list_certifications().await.unwrap().is_empty());
    assert!(client.list_departments().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_with_no_content_resolves_to_unit() {
    let router = Router::new().route(
        "/enrollments/{id}",
        delete(|Path(id): Path<i64>| async move {
            assert_eq!(id, 12);
            StatusCode::NO_CONTENT
        }),
    );
    let client = spawn_backend(router).await;

    client.delete_enrollment(12).await.unwrap();
}

#[tokio::test]
async fn non_success_status_carries_code_and_body() {
    let router = Router::new().route(
        "/employees",
        post(|| async {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":"department does not exist"}"#,
            )
        }),
    );
    let client = spawn_backend(router).await;

    let draft = employees::Draft {
        name: "Ada".into(),
        department_id: Some(99),
        ..Default::default()
    };
    let err = client.create_employee(&draft).await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    let message = err.to_string();
    assert!(message.contains("422"), "{message}");
    assert!(message.contains("department does not exist"), "{message}");
}

#[tokio::test]
async fn missing_record_is_reported_as_not_found() {
    let router = Router::new().route(
        "/employees/{id}",
        get(|| async { (StatusCode::NOT_FOUND, "Employee not found") }),
    );
    let client = spawn_backend(router).await;

    let err = client.get_employee(404).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn create_sends_the_draft_as_json() {
    let router = Router::new().route(
        "/enrollments",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["employee_id"], 3);
            assert_eq!(body["training_id"], 5);
            assert_eq!(body["status"], "in_progress");
            assert!(body.get("progress").is_none());
            (
                StatusCode::CREATED,
                Json(json!({ "id": 40, "employee_id": 3, "training_id": 5, "status": "in_progress" })),
            )
        }),
    );
    let client = spawn_backend(router).await;

    let draft = enrollments::Draft {
        employee_id: 3,
        training_id: 5,
        status: Some(enrollments::Status::InProgress),
        ..Default::default()
    };
    let created = client.create_enrollment(&draft).await.unwrap();
    assert_eq!(created.id, 40);
    assert_eq!(created.status, enrollments::Status::InProgress);
}

#[tokio::test]
async fn progress_is_sent_as_a_clamped_query_parameter() {
    let router = Router::new().route(
        "/enrollments/{id}/progress",
        patch(
            |Path(id): Path<i64>, Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({ "id": id, "progress": params.get("progress") }))
            },
        ),
    );
    let client = spawn_backend(router).await;

    let body = client.update_enrollment_progress(8, 250).await.unwrap();
    assert_eq!(body["id"], 8);
    assert_eq!(body["progress"], "100");
}

#[tokio::test]
async fn complete_tolerates_an_empty_body() {
    let router = Router::new().route(
        "/enrollments/{id}/complete",
        post(|| async { StatusCode::NO_CONTENT }),
    );
    let client = spawn_backend(router).await;

    assert_eq!(client.complete_enrollment(1).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn bearer_token_is_attached() {
    let router = Router::new().route(
        "/auth/validate",
        get(|headers: HeaderMap| async move {
            let expected = format!("Bearer {TOKEN}");
            let valid = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                == Some(expected.as_str());
            Json(json!({ "valid": valid, "user": { "username": "admin" } }))
        }),
    );
    let client = spawn_backend(router).await;

    let validation = client.validate_token().await.unwrap();
    assert!(validation.valid);
    assert_eq!(validation.user.unwrap()["username"], "admin");
}

#[tokio::test]
async fn export_uses_content_disposition_filename() {
    let router = Router::new().route(
        "/api/compliance/export/{format}",
        post(|Path(format): Path<String>| async move {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONTENT_TYPE, "application/pdf".parse().unwrap());
            if format == "pdf" {
                headers.insert(
                    header::CONTENT_DISPOSITION,
                    r#"attachment; filename="compliance_q1.pdf""#.parse().unwrap(),
                );
            }
            (headers, b"%PDF-1.4".to_vec()).into_response()
        }),
    );
    let client = spawn_backend(router).await;
    let request = compliance::ReportRequest::default();

    let pdf = client
        .export_compliance(compliance::ExportFormat::Pdf, &request)
        .await
        .unwrap();
    assert_eq!(pdf.filename, "compliance_q1.pdf");
    assert_eq!(pdf.bytes, b"%PDF-1.4");
    assert_eq!(pdf.content_type.as_deref(), Some("application/pdf"));

    let excel = client
        .export_compliance(compliance::ExportFormat::Excel, &request)
        .await
        .unwrap();
    assert_eq!(excel.filename, "compliance_report.xlsx");
}

#[tokio::test]
async fn compliance_report_keeps_unknown_fields() {
    let router = Router::new().route(
        "/api/compliance/report",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["department_id"], 2);
            Json(json!({
                "overall_compliance_rate": 87.5,
                "total_employees": 8,
                "compliant_employees": 7,
                "departments": [{ "department_name": "Ops", "compliance_rate": 87.5 }],
                "generated_at": "2024-05-01T00:00:00Z"
            }))
        }),
    );
    let client = spawn_backend(router).await;

    let request = compliance::ReportRequest {
        department_id: Some(2),
        ..Default::default()
    };
    let report = client.compliance_report(&request).await.unwrap();
    assert_eq!(report.compliant_employees, 7);
    assert_eq!(report.departments[0].department_name, "Ops");
    assert!(report.extra.contains_key("generated_at"));
}

#[tokio::test]
async fn partial_stats_payload_defaults_missing_counters() {
    let router = Router::new().route(
        "/api/dashboard/stats",
        get(|| async { Json(json!({ "total_employees": 12, "compliance_rate": 91.0 })) }),
    );
    let client = spawn_backend(router).await;

    let stats = client.dashboard_stats().await.unwrap();
    assert_eq!(stats.total_employees, 12);
    assert_eq!(stats.total_trainings, 0);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let client = unreachable_client().await;

    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "{err:?}");
    assert_eq!(err.status(), None);
}
