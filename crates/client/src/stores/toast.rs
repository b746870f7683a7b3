//! Transient user-feedback messages (the toast).
//!
//! Deliberately a single slot, not a queue: rapid-fire `show` calls
//! coalesce to the latest message, which is all a toast surface can render
//! anyway. A generation counter guards the auto-hide timer so an old
//! timer never hides a newer message.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::registry::ChangeNotifier;

/// How long a toast stays visible before auto-hiding.
pub const TOAST_DWELL: Duration = Duration::from_secs(3);

/// Visual flavor of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// A visible transient message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub kind: ToastKind,
}

/// Single-slot transient message bus.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    inner: Arc<BusInner>,
}

#[derive(Debug)]
struct BusInner {
    state: Mutex<BusState>,
    notifier: ChangeNotifier,
}

#[derive(Debug, Default)]
struct BusState {
    current: Option<Toast>,
    generation: u64,
}

impl NotificationBus {
    pub(crate) fn new(notifier: ChangeNotifier) -> Self {
        Self {
            inner: Arc::new(BusInner {
                state: Mutex::new(BusState::default()),
                notifier,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Show a message, replacing whatever is currently shown (last write
    /// wins), and schedule its auto-hide.
    pub fn show(&self, message: impl Into<String>, kind: ToastKind) {
        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.current = Some(Toast {
                message: message.into(),
                kind,
            });
            state.generation
        };
        self.inner.notifier.notify();

        // Auto-hide only works inside a runtime; without one the toast
        // stays until the next show/hide.
        if tokio::runtime::Handle::try_current().is_ok() {
            let bus = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(TOAST_DWELL).await;
                bus.expire(generation);
            });
        }
    }

    /// Clear the current message immediately.
    pub fn hide(&self) {
        {
            let mut state = self.lock();
            state.generation += 1;
            state.current = None;
        }
        self.inner.notifier.notify();
    }

    /// The currently visible toast, if any.
    #[must_use]
    pub fn current(&self) -> Option<Toast> {
        self.lock().current.clone()
    }

    fn expire(&self, generation: u64) {
        let expired = {
            let mut state = self.lock();
            if state.generation == generation && state.current.is_some() {
                state.current = None;
                true
            } else {
                false
            }
        };
        if expired {
            self.inner.notifier.notify();
        }
    }
}
