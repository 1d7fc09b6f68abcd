//! HR dashboard slice: aggregation, page controllers, toasts.

pub mod certificate;
pub mod dashboard;
pub mod filter;
pub mod page;
pub mod toast;

pub use certificate::{CertificateError, CertificateView};
pub use dashboard::{DashboardInput, DashboardView, aggregate};
pub use page::{
    CombinedSource, DEFAULT_REFRESH_INTERVAL, DashboardPage, DashboardSource, LoadGuard,
    LoadOutcome, Page, PageState, run_action,
};
pub use toast::{Toast, ToastKind, ToastQueue};
