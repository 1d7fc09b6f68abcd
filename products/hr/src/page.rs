//! Page controllers: load state, stale-response guarding, action feedback.

use std::{
    future::Future,
    ops::ControlFlow,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::Utc;
use parking_lot::Mutex;
use platform_api::{ApiClient, ApiError, ApiResult};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::{
    dashboard::{DashboardInput, DashboardView, aggregate},
    toast::ToastQueue,
};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageState<T> {
    Idle,
    Loading,
    Ready { data: T },
    Failed { message: String },
}

impl<T> PageState<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            PageState::Ready { data } => Some(data),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Monotonic load generations. Only the most recently issued ticket may
/// write page state; responses for older tickets are discarded.
#[derive(Clone, Debug, Default)]
pub struct LoadGuard {
    latest: Arc<AtomicU64>,
}

impl LoadGuard {
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started while this one was in flight.
    Stale,
}

/// State slot for one page.
#[derive(Debug)]
pub struct Page<T> {
    state: Mutex<PageState<T>>,
    guard: LoadGuard,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            state: Mutex::new(PageState::Idle),
            guard: LoadGuard::default(),
        }
    }
}

impl<T: Clone> Page<T> {
    pub fn state(&self) -> PageState<T> {
        self.state.lock().clone()
    }

    pub fn data(&self) -> Option<T> {
        self.state.lock().data().cloned()
    }

    /// Run `fetch` and store its result unless a newer load has started.
    ///
    /// A failed load moves the page to `Failed` and returns the error; a
    /// stale result, successful or not, leaves the state untouched.
    pub async fn load<F>(&self, fetch: F) -> ApiResult<LoadOutcome>
    where
        F: Future<Output = ApiResult<T>>,
    {
        let ticket = self.guard.begin();
        self.apply(ticket, PageState::Loading);
        let applied = match fetch.await {
            Ok(data) => self.apply(ticket, PageState::Ready { data }),
            Err(err) => {
                let failed = PageState::Failed {
                    message: err.to_string(),
                };
                if self.apply(ticket, failed) {
                    return Err(err);
                }
                false
            }
        };
        if applied {
            Ok(LoadOutcome::Applied)
        } else {
            debug!(ticket = ticket.0, "discarding stale page response");
            Ok(LoadOutcome::Stale)
        }
    }

    fn apply(&self, ticket: LoadTicket, next: PageState<T>) -> bool {
        let mut state = self.state.lock();
        if !self.guard.is_current(ticket) {
            return false;
        }
        *state = next;
        true
    }
}

/// Where the dashboard gets its raw collections.
pub trait DashboardSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = ApiResult<DashboardInput>> + Send;
}

impl DashboardSource for ApiClient {
    /// Fan out one request per collection and fail the load if any fails.
    async fn fetch(&self) -> ApiResult<DashboardInput> {
        let (employees, trainings, enrollments, certifications, departments, stats) = tokio::try_join!(
            self.list_employees(),
            self.list_trainings(),
            self.list_enrollments(),
            self.list_certifications(),
            self.list_departments(),
            self.dashboard_stats(),
        )?;
        Ok(DashboardInput {
            employees,
            trainings,
            enrollments,
            certifications,
            departments,
            stats,
        })
    }
}

/// Single-request source backed by `GET /api/dashboard/dashboard-data`.
#[derive(Clone, Debug)]
pub struct CombinedSource(pub ApiClient);

impl DashboardSource for CombinedSource {
    async fn fetch(&self) -> ApiResult<DashboardInput> {
        Ok(self.0.dashboard_data().await?.into())
    }
}

/// Dashboard screen controller.
pub struct DashboardPage<S = ApiClient> {
    source: S,
    page: Page<DashboardView>,
    toasts: ToastQueue,
}

impl<S: DashboardSource> DashboardPage<S> {
    pub fn new(source: S, toasts: ToastQueue) -> Self {
        Self {
            source,
            page: Page::default(),
            toasts,
        }
    }

    pub fn state(&self) -> PageState<DashboardView> {
        self.page.state()
    }

    pub fn view(&self) -> Option<DashboardView> {
        self.page.data()
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub async fn load(&self) -> ApiResult<LoadOutcome> {
        let outcome = self
            .page
            .load(async {
                let input = self.source.fetch().await?;
                Ok::<_, ApiError>(aggregate(&input, Utc::now()))
            })
            .await
            .inspect_err(|err| {
                warn!(code = err.code(), error = %err, "dashboard load failed");
            })?;
        if outcome == LoadOutcome::Applied {
            info!("dashboard refreshed");
        }
        Ok(outcome)
    }

    /// Reload on a fixed period until `on_tick` breaks. The first load runs
    /// immediately. Failures land in page state and do not stop the loop.
    pub async fn refresh_every<F>(&self, period: Duration, mut on_tick: F)
    where
        F: FnMut(&PageState<DashboardView>) -> ControlFlow<()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = self.load().await {
                debug!(code = err.code(), "refresh failed, retrying next tick");
            }
            if on_tick(&self.state()).is_break() {
                break;
            }
        }
    }
}

/// Run a secondary action (save, delete, progress update). The outcome is
/// reported as a toast and the error is handed back so the caller can keep
/// its form open.
pub async fn run_action<T, F>(toasts: &ToastQueue, success: &str, action: F) -> ApiResult<T>
where
    F: Future<Output = ApiResult<T>>,
{
    match action.await {
        Ok(value) => {
            toasts.success(success);
            Ok(value)
        }
        Err(err) => {
            toasts.error(action_failure_message(&err));
            Err(err)
        }
    }
}

fn action_failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Transport(_) => "Could not reach the server".to_string(),
        other => format!("Request failed: {other}"),
    }
}
