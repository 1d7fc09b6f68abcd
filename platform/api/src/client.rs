use std::time::Duration;

use entity::{
    Certification, Department, Employee, Enrollment, Training, auth, compliance, dashboard,
    departments, employees, enrollments, trainings,
};
use reqwest::{Method, RequestBuilder, Response, header};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::{ApiError, ApiResult, ExportFile, decode_list, filename_from_disposition};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|err| ApiError::InvalidUrl(format!("{base_url}: {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl(format!(
                "{base_url}: scheme must be http or https"
            )));
        }
        Ok(Self {
            base_url,
            token: None,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            token: config.token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // Employees

    pub async fn list_employees(&self) -> ApiResult<Vec<Employee>> {
        self.list("/employees", "employees").await
    }

    pub async fn get_employee(&self, id: i64) -> ApiResult<Employee> {
        self.json(Method::GET, &format!("/employees/{id}"), None::<&()>)
            .await
    }

    pub async fn create_employee(&self, draft: &employees::Draft) -> ApiResult<Employee> {
        self.json(Method::POST, "/employees", Some(draft)).await
    }

    pub async fn update_employee(&self, id: i64, draft: &employees::Draft) -> ApiResult<Employee> {
        self.json(Method::PUT, &format!("/employees/{id}"), Some(draft))
            .await
    }

    pub async fn delete_employee(&self, id: i64) -> ApiResult<()> {
        self.unit(Method::DELETE, &format!("/employees/{id}")).await
    }

    // Departments

    pub async fn list_departments(&self) -> ApiResult<Vec<Department>> {
        self.list("/departments", "departments").await
    }

    pub async fn create_department(&self, draft: &departments::Draft) -> ApiResult<Department> {
        self.json(Method::POST, "/departments", Some(draft)).await
    }

    pub async fn update_department(
        &self,
        id: i64,
        draft: &departments::Draft,
    ) -> ApiResult<Department> {
        self.json(Method::PUT, &format!("/departments/{id}"), Some(draft))
            .await
    }

    pub async fn delete_department(&self, id: i64) -> ApiResult<()> {
        self.unit(Method::DELETE, &format!("/departments/{id}"))
            .await
    }

    // Trainings

    pub async fn list_trainings(&self) -> ApiResult<Vec<Training>> {
        self.list("/trainings", "trainings").await
    }

    pub async fn get_training(&self, id: i64) -> ApiResult<Training> {
        self.json(Method::GET, &format!("/trainings/{id}"), None::<&()>)
            .await
    }

    pub async fn create_training(&self, draft: &trainings::Draft) -> ApiResult<Training> {
        self.json(Method::POST, "/trainings", Some(draft)).await
    }

    pub async fn update_training(&self, id: i64, draft: &trainings::Draft) -> ApiResult<Training> {
        self.json(Method::PUT, &format!("/trainings/{id}"), Some(draft))
            .await
    }

    pub async fn delete_training(&self, id: i64) -> ApiResult<()> {
        self.unit(Method::DELETE, &format!("/trainings/{id}")).await
    }

    // Enrollments

    pub async fn list_enrollments(&self) -> ApiResult<Vec<Enrollment>> {
        self.list("/enrollments", "enrollments").await
    }

    pub async fn create_enrollment(&self, draft: &enrollments::Draft) -> ApiResult<Enrollment> {
        self.json(Method::POST, "/enrollments", Some(draft)).await
    }

    pub async fn update_enrollment(
        &self,
        id: i64,
        draft: &enrollments::Draft,
    ) -> ApiResult<Enrollment> {
        self.json(Method::PUT, &format!("/enrollments/{id}"), Some(draft))
            .await
    }

    pub async fn delete_enrollment(&self, id: i64) -> ApiResult<()> {
        self.unit(Method::DELETE, &format!("/enrollments/{id}"))
            .await
    }

    /// `PATCH /enrollments/{id}/progress?progress=N`. The value is clamped to
    /// 0..=100 before it goes on the wire.
    pub async fn update_enrollment_progress(&self, id: i64, progress: u8) -> ApiResult<Value> {
        let path = format!("/enrollments/{id}/progress");
        let builder = self
            .request(Method::PATCH, &path)?
            .query(&[("progress", progress.min(100))]);
        let response = self.execute(builder, &Method::PATCH, &path).await?;
        read_value(response, &path).await
    }

    pub async fn complete_enrollment(&self, id: i64) -> ApiResult<Value> {
        let path = format!("/enrollments/{id}/complete");
        let response = self
            .execute(self.request(Method::POST, &path)?, &Method::POST, &path)
            .await?;
        read_value(response, &path).await
    }

    // Certifications

    pub async fn list_certifications(&self) -> ApiResult<Vec<Certification>> {
        self.list("/certifications", "certifications").await
    }

    pub async fn get_certification(&self, id: i64) -> ApiResult<Certification> {
        self.json(Method::GET, &format!("/certifications/{id}"), None::<&()>)
            .await
    }

    // Dashboard

    pub async fn dashboard_stats(&self) -> ApiResult<dashboard::Stats> {
        self.json(Method::GET, "/api/dashboard/stats", None::<&()>)
            .await
    }

    pub async fn dashboard_data(&self) -> ApiResult<dashboard::Data> {
        self.json(Method::GET, "/api/dashboard/dashboard-data", None::<&()>)
            .await
    }

    // Compliance

    pub async fn compliance_report(
        &self,
        request: &compliance::ReportRequest,
    ) -> ApiResult<compliance::Report> {
        self.json(Method::POST, "/api/compliance/report", Some(request))
            .await
    }

    pub async fn export_compliance(
        &self,
        format: compliance::ExportFormat,
        request: &compliance::ReportRequest,
    ) -> ApiResult<ExportFile> {
        let path = format!("/api/compliance/export/{}", format.as_str());
        let builder = self.request(Method::POST, &path)?.json(request);
        let response = self.execute(builder, &Method::POST, &path).await?;
        let headers = response.headers().clone();
        let filename = headers
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| format.default_filename().to_string());
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await?.to_vec();
        debug!(path = %path, filename = %filename, size = bytes.len(), "export downloaded");
        Ok(ExportFile {
            filename,
            content_type,
            bytes,
        })
    }

    // Auth + health

    pub async fn validate_token(&self) -> ApiResult<auth::TokenValidation> {
        self.json(Method::GET, "/auth/validate", None::<&()>).await
    }

    pub async fn health(&self) -> ApiResult<auth::Health> {
        self.json(Method::GET, "/health", None::<&()>).await
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<RequestBuilder> {
        let url = format!("{}{}", self.base_url, path);
        let url = Url::parse(&url).map_err(|err| ApiError::InvalidUrl(format!("{url}: {err}")))?;
        let mut builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        method: &Method,
        path: &str,
    ) -> ApiResult<Response> {
        let response = builder.send().await.inspect_err(|err| {
            warn!(%method, path, error = %err, "backend unreachable");
        })?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "backend responded");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%method, path, status = status.as_u16(), "backend rejected request");
        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn json<T, B>(&self, method: Method, path: &str, body: Option<&B>) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut builder = self.request(method.clone(), path)?;
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.execute(builder, &method, path).await?;
        match read_value(response, path).await? {
            Value::Null => Err(ApiError::EmptyBody {
                path: path.to_string(),
            }),
            value => serde_json::from_value(value).map_err(|err| ApiError::decode(path, err)),
        }
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, key: &str) -> ApiResult<Vec<T>> {
        let response = self
            .execute(self.request(Method::GET, path)?, &Method::GET, path)
            .await?;
        let value = read_value(response, path).await?;
        decode_list(value, key).map_err(|err| ApiError::decode(path, err))
    }

    async fn unit(&self, method: Method, path: &str) -> ApiResult<()> {
        let builder = self.request(method.clone(), path)?;
        self.execute(builder, &method, path).await?;
        Ok(())
    }
}

/// Read a JSON body; 204 and zero-length bodies read as `Value::Null`.
async fn read_value(response: Response, path: &str) -> ApiResult<Value> {
    if response.status() == reqwest::StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let bytes = response.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&bytes).map_err(|err| ApiError::decode(path, err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_base_urls() {
        assert!(matches!(
            ClientConfig::new("ftp://example.test"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            ClientConfig::new("not a url"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn trailing_slash_is_dropped_and_blank_tokens_ignored() {
        let config = ClientConfig::new("http://localhost:8000/")
            .unwrap()
            .with_token(Some("  ".into()));
        assert!(config.token.is_none());
        let client = ApiClient::new(config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
