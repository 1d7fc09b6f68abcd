//! Ephemeral notifications with timed auto-dismiss.

use std::{
    collections::HashMap,
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

impl ToastKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToastKind::Success => "success",
            ToastKind::Error => "error",
            ToastKind::Warning => "warning",
            ToastKind::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Toast {
    pub id: Uuid,
    pub message: String,
    pub kind: ToastKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    toasts: Vec<Toast>,
    timers: HashMap<Uuid, AbortHandle>,
}

/// Ordered toast list owned by a page controller. Clones share the queue.
///
/// Each toast expires after the queue's TTL. Dismissing a toast cancels its
/// timer; removing an id that is already gone is a no-op.
#[derive(Clone)]
pub struct ToastQueue {
    inner: Arc<Mutex<Inner>>,
    ttl: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ToastQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToastQueue")
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            ttl,
        }
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.push(message, ToastKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.push(message, ToastKind::Error)
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.push(message, ToastKind::Info)
    }

    /// Append a toast and arm its expiry timer.
    ///
    /// Outside a tokio runtime no timer can be armed and the toast stays
    /// until dismissed.
    pub fn push(&self, message: impl Into<String>, kind: ToastKind) -> Uuid {
        let toast = Toast {
            id: Uuid::new_v4(),
            message: message.into(),
            kind,
            created_at: Utc::now(),
        };
        let id = toast.id;
        match kind {
            ToastKind::Error => error!(toast = %id, message = %toast.message, "toast"),
            ToastKind::Warning => warn!(toast = %id, message = %toast.message, "toast"),
            ToastKind::Success | ToastKind::Info => {
                info!(toast = %id, message = %toast.message, "toast")
            }
        }

        // Held across the spawn so the timer cannot fire before it is recorded.
        let mut inner = self.inner.lock();
        inner.toasts.push(toast);
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let queue = Arc::downgrade(&self.inner);
                let ttl = self.ttl;
                let task = runtime.spawn(async move {
                    tokio::time::sleep(ttl).await;
                    expire(&queue, id);
                });
                inner.timers.insert(id, task.abort_handle());
            }
            Err(_) => debug!(toast = %id, "no runtime; toast will not auto-dismiss"),
        }
        id
    }

    /// Remove a toast and cancel its timer. Returns whether it was present.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut inner = self.inner.lock();
        if let Some(timer) = inner.timers.remove(&id) {
            timer.abort();
        }
        let before = inner.toasts.len();
        inner.toasts.retain(|toast| toast.id != id);
        before != inner.toasts.len()
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.inner.lock().toasts.clone()
    }

    /// Remove and return every toast, cancelling their timers.
    pub fn drain(&self) -> Vec<Toast> {
        let mut inner = self.inner.lock();
        for (_, timer) in inner.timers.drain() {
            timer.abort();
        }
        std::mem::take(&mut inner.toasts)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[cfg(test)]
    fn pending_timers(&self) -> usize {
        self.inner.lock().timers.len()
    }
}

fn expire(queue: &Weak<Mutex<Inner>>, id: Uuid) {
    let Some(inner) = queue.upgrade() else {
        return;
    };
    let mut inner = inner.lock();
    inner.timers.remove(&id);
    inner.toasts.retain(|toast| toast.id != id);
}
