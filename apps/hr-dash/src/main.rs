mod config;

use std::{ops::ControlFlow, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand, ValueEnum};
use entity::{certifications, compliance, departments, employees, enrollments, trainings};
use platform_api::ApiClient;
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use products_hr::{
    CertificateView, CombinedSource, DashboardPage, DashboardSource, PageState, ToastQueue,
    filter, run_action,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::info;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "hr-dash", version, about = "HR training and certification dashboard")]
struct Cli {
    /// Backend base URL; overrides HR_API_URL.
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,
    /// Bearer token; overrides HR_API_TOKEN.
    #[arg(long, global = true, value_name = "TOKEN")]
    token: Option<String>,
    /// Debug-level logging for the workspace crates.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and print the aggregated dashboard.
    Dashboard {
        #[arg(long, help = "Keep refreshing until Ctrl+C")]
        watch: bool,
        #[arg(long, help = "Use the combined dashboard-data endpoint")]
        combined: bool,
    },
    #[command(subcommand)]
    Employees(EmployeeCommand),
    #[command(subcommand)]
    Departments(DepartmentCommand),
    #[command(subcommand)]
    Trainings(TrainingCommand),
    #[command(subcommand)]
    Enrollments(EnrollmentCommand),
    #[command(subcommand)]
    Certifications(CertificationCommand),
    #[command(subcommand)]
    Compliance(ComplianceCommand),
    /// Check that the backend is up.
    Health,
    #[command(subcommand)]
    Auth(AuthCommand),
}

#[derive(Args, Debug)]
struct JsonBody {
    #[arg(long, value_name = "JSON", help = "Request body as a JSON object")]
    json: String,
}

#[derive(Subcommand, Debug)]
enum EmployeeCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        active_only: bool,
    },
    Get { id: i64 },
    Create(JsonBody),
    Update {
        id: i64,
        #[command(flatten)]
        body: JsonBody,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum DepartmentCommand {
    List,
    Create(JsonBody),
    Update {
        id: i64,
        #[command(flatten)]
        body: JsonBody,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum TrainingCommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        active_only: bool,
    },
    Get { id: i64 },
    Create(JsonBody),
    Update {
        id: i64,
        #[command(flatten)]
        body: JsonBody,
    },
    Delete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum EnrollmentCommand {
    List {
        #[arg(long, help = "enrolled, in_progress, completed or cancelled")]
        status: Option<String>,
    },
    Create(JsonBody),
    Update {
        id: i64,
        #[command(flatten)]
        body: JsonBody,
    },
    Delete { id: i64 },
    /// Set completion percentage (clamped to 100).
    Progress { id: i64, progress: u8 },
    /// Mark an enrollment completed.
    Complete { id: i64 },
}

#[derive(Subcommand, Debug)]
enum CertificationCommand {
    List {
        #[arg(long, help = "active, expired or revoked")]
        status: Option<String>,
    },
    Get { id: i64 },
    /// Resolve a certification into printable certificate fields.
    Certificate { id: i64 },
}

#[derive(Args, Debug, Default)]
struct ReportFilters {
    #[arg(long)]
    department_id: Option<i64>,
    #[arg(long)]
    training_id: Option<i64>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    start_date: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    end_date: Option<String>,
}

impl From<ReportFilters> for compliance::ReportRequest {
    fn from(value: ReportFilters) -> Self {
        Self {
            department_id: value.department_id,
            training_id: value.training_id,
            start_date: value.start_date,
            end_date: value.end_date,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum ExportKind {
    Pdf,
    Excel,
}

impl From<ExportKind> for compliance::ExportFormat {
    fn from(value: ExportKind) -> Self {
        match value {
            ExportKind::Pdf => compliance::ExportFormat::Pdf,
            ExportKind::Excel => compliance::ExportFormat::Excel,
        }
    }
}

#[derive(Subcommand, Debug)]
enum ComplianceCommand {
    Report(ReportFilters),
    Export {
        format: ExportKind,
        #[arg(long, value_name = "DIR", default_value = ".")]
        out: PathBuf,
        #[command(flatten)]
        filters: ReportFilters,
    },
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Ask the backend whether the configured token is valid.
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let obs = if cli.verbose {
        ObsConfig::default().verbose()
    } else {
        ObsConfig::default()
    };
    init_tracing(obs)?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load()?;
    if let Some(url) = cli.api_url.as_deref() {
        config.override_url(url)?;
    }
    if let Some(token) = cli.token {
        config.override_token(token);
    }
    let client = ApiClient::new(config.client_config()?)?;
    let toasts = ToastQueue::with_ttl(config.toast_ttl);
    info!(api = %client.base_url(), "hr-dash starting");

    let result = execute(cli.command, &client, &config, &toasts).await;
    flush_toasts(&toasts);
    result
}

async fn execute(
    command: Command,
    client: &ApiClient,
    config: &AppConfig,
    toasts: &ToastQueue,
) -> Result<()> {
    match command {
        Command::Dashboard { watch, combined } => {
            if combined {
                let source = CombinedSource(client.clone());
                dashboard(source, config, toasts.clone(), watch).await
            } else {
                dashboard(client.clone(), config, toasts.clone(), watch).await
            }
        }
        Command::Employees(cmd) => employee_command(client, toasts, cmd).await,
        Command::Departments(cmd) => department_command(client, toasts, cmd).await,
        Command::Trainings(cmd) => training_command(client, toasts, cmd).await,
        Command::Enrollments(cmd) => enrollment_command(client, toasts, cmd).await,
        Command::Certifications(cmd) => certification_command(client, toasts, cmd).await,
        Command::Compliance(cmd) => compliance_command(client, toasts, cmd).await,
        Command::Health => print_json(&client.health().await?),
        Command::Auth(AuthCommand::Validate) => {
            let validation = client.validate_token().await?;
            print_json(&validation)?;
            if !validation.valid {
                return Err(anyhow!("token rejected by backend"));
            }
            Ok(())
        }
    }
}

async fn dashboard<S: DashboardSource>(
    source: S,
    config: &AppConfig,
    toasts: ToastQueue,
    watch: bool,
) -> Result<()> {
    let page = DashboardPage::new(source, toasts);
    if !watch {
        page.load().await.context("dashboard load failed")?;
        return print_json(&page.view());
    }

    let refresh = page.refresh_every(config.refresh_interval, |state| {
        match state {
            PageState::Ready { data } => {
                if let Err(err) = print_json(data) {
                    eprintln!("error: {err:#}");
                }
            }
            PageState::Failed { message } => eprintln!("error: dashboard load failed: {message}"),
            PageState::Idle | PageState::Loading => {}
        }
        flush_toasts(page.toasts());
        ControlFlow::Continue(())
    });
    tokio::select! {
        _ = refresh => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to install Ctrl+C handler")?;
            info!("shutdown signal received");
        }
    }
    Ok(())
}

async fn employee_command(client: &ApiClient, toasts: &ToastQueue, cmd: EmployeeCommand) -> Result<()> {
    match cmd {
        EmployeeCommand::List {
            search,
            active_only,
        } => {
            let (rows, departments) =
                tokio::try_join!(client.list_employees(), client.list_departments())?;
            let found = filter::search_employees(&rows, &departments, search.as_deref().unwrap_or(""));
            let found = if active_only {
                filter::active_employees(found)
            } else {
                found
            };
            print_json(&found)
        }
        EmployeeCommand::Get { id } => print_json(&client.get_employee(id).await?),
        EmployeeCommand::Create(body) => {
            let draft: employees::Draft = parse_body(&body)?;
            let created = run_action(toasts, "Employee created", client.create_employee(&draft)).await?;
            print_json(&created)
        }
        EmployeeCommand::Update { id, body } => {
            let draft: employees::Draft = parse_body(&body)?;
            let updated =
                run_action(toasts, "Employee updated", client.update_employee(id, &draft)).await?;
            print_json(&updated)
        }
        EmployeeCommand::Delete { id } => {
            run_action(toasts, "Employee deleted", client.delete_employee(id)).await?;
            Ok(())
        }
    }
}

async fn department_command(
    client: &ApiClient,
    toasts: &ToastQueue,
    cmd: DepartmentCommand,
) -> Result<()> {
    match cmd {
        DepartmentCommand::List => print_json(&client.list_departments().await?),
        DepartmentCommand::Create(body) => {
            let draft: departments::Draft = parse_body(&body)?;
            let created =
                run_action(toasts, "Department created", client.create_department(&draft)).await?;
            print_json(&created)
        }
        DepartmentCommand::Update { id, body } => {
            let draft: departments::Draft = parse_body(&body)?;
            let updated = run_action(
                toasts,
                "Department updated",
                client.update_department(id, &draft),
            )
            .await?;
            print_json(&updated)
        }
        DepartmentCommand::Delete { id } => {
            run_action(toasts, "Department deleted", client.delete_department(id)).await?;
            Ok(())
        }
    }
}

async fn training_command(client: &ApiClient, toasts: &ToastQueue, cmd: TrainingCommand) -> Result<()> {
    match cmd {
        TrainingCommand::List {
            search,
            active_only,
        } => {
            let rows = client.list_trainings().await?;
            let found = filter::search_trainings(&rows, search.as_deref().unwrap_or(""));
            let found = if active_only {
                filter::active_trainings(found)
            } else {
                found
            };
            print_json(&found)
        }
        TrainingCommand::Get { id } => print_json(&client.get_training(id).await?),
        TrainingCommand::Create(body) => {
            let draft: trainings::Draft = parse_body(&body)?;
            let created = run_action(toasts, "Training created", client.create_training(&draft)).await?;
            print_json(&created)
        }
        TrainingCommand::Update { id, body } => {
            let draft: trainings::Draft = parse_body(&body)?;
            let updated =
                run_action(toasts, "Training updated", client.update_training(id, &draft)).await?;
            print_json(&updated)
        }
        TrainingCommand::Delete { id } => {
            run_action(toasts, "Training deleted", client.delete_training(id)).await?;
            Ok(())
        }
    }
}

async fn enrollment_command(
    client: &ApiClient,
    toasts: &ToastQueue,
    cmd: EnrollmentCommand,
) -> Result<()> {
    match cmd {
        EnrollmentCommand::List { status } => {
            let rows = client.list_enrollments().await?;
            match status {
                Some(raw) => {
                    let status = enrollments::Status::parse(&raw)
                        .ok_or_else(|| {
                        let known = enrollments::Status::KNOWN.map(|s| s.as_str());
                        unknown_status("enrollment", &raw, &known)
                    })?;
                    print_json(&filter::enrollments_with_status(&rows, status))
                }
                None => print_json(&rows),
            }
        }
        EnrollmentCommand::Create(body) => {
            let draft: enrollments::Draft = parse_body(&body)?;
            let created =
                run_action(toasts, "Enrollment created", client.create_enrollment(&draft)).await?;
            print_json(&created)
        }
        EnrollmentCommand::Update { id, body } => {
            let draft: enrollments::Draft = parse_body(&body)?;
            let updated = run_action(
                toasts,
                "Enrollment updated",
                client.update_enrollment(id, &draft),
            )
            .await?;
            print_json(&updated)
        }
        EnrollmentCommand::Delete { id } => {
            run_action(toasts, "Enrollment deleted", client.delete_enrollment(id)).await?;
            Ok(())
        }
        EnrollmentCommand::Progress { id, progress } => {
            let body = run_action(
                toasts,
                "Progress updated",
                client.update_enrollment_progress(id, progress),
            )
            .await?;
            print_json(&body)
        }
        EnrollmentCommand::Complete { id } => {
            let body = run_action(
                toasts,
                "Enrollment completed",
                client.complete_enrollment(id),
            )
            .await?;
            print_json(&body)
        }
    }
}

async fn certification_command(
    client: &ApiClient,
    toasts: &ToastQueue,
    cmd: CertificationCommand,
) -> Result<()> {
    match cmd {
        CertificationCommand::List { status } => {
            let rows = client.list_certifications().await?;
            match status {
                Some(raw) => {
                    let status = certifications::Status::parse(&raw)
                        .ok_or_else(|| {
                        let known = certifications::Status::KNOWN.map(|s| s.as_str());
                        unknown_status("certification", &raw, &known)
                    })?;
                    print_json(&filter::certifications_with_status(&rows, status))
                }
                None => print_json(&rows),
            }
        }
        CertificationCommand::Get { id } => print_json(&client.get_certification(id).await?),
        CertificationCommand::Certificate { id } => {
            let (cert, employees, trainings) = tokio::try_join!(
                client.get_certification(id),
                client.list_employees(),
                client.list_trainings(),
            )?;
            let view = CertificateView::resolve(&cert, &employees, &trainings)
                .inspect_err(|err| {
                    toasts.error(err.to_string());
                })?;
            print_json(&view)
        }
    }
}

async fn compliance_command(
    client: &ApiClient,
    toasts: &ToastQueue,
    cmd: ComplianceCommand,
) -> Result<()> {
    match cmd {
        ComplianceCommand::Report(filters) => {
            let request = compliance::ReportRequest::from(filters);
            print_json(&client.compliance_report(&request).await?)
        }
        ComplianceCommand::Export {
            format,
            out,
            filters,
        } => {
            let request = compliance::ReportRequest::from(filters);
            let file = run_action(
                toasts,
                "Report exported",
                client.export_compliance(format.into(), &request),
            )
            .await?;
            tokio::fs::create_dir_all(&out)
                .await
                .with_context(|| format!("failed to create {}", out.display()))?;
            let path = out.join(&file.filename);
            tokio::fs::write(&path, &file.bytes)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), size = file.bytes.len(), "report saved");
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn unknown_status(kind: &str, raw: &str, known: &[&str]) -> anyhow::Error {
    anyhow!(
        "unknown {kind} status {raw:?}, expected one of: {}",
        known.join(", ")
    )
}

fn parse_body<T: DeserializeOwned>(body: &JsonBody) -> Result<T> {
    serde_json::from_str(&body.json).context("--json is not a valid request body")
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn flush_toasts(toasts: &ToastQueue) {
    for toast in toasts.drain() {
        eprintln!("[{}] {}", toast.kind.as_str(), toast.message);
    }
}
