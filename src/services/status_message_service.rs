use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

impl MessageKind {
    pub fn css_class(self) -> &'static str {
        match self {
            MessageKind::Success => "success",
            MessageKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: MessageKind,
}

/// A visible message and how long it has left on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayedMessage {
    pub message: StatusMessage,
    pub remaining: Duration,
}

#[derive(Default)]
struct BannerState {
    current: Option<StatusMessage>,
    shown_at: Option<Instant>,
    generation: u64,
    pending_hide: Option<JoinHandle<()>>,
}

/// The single transient message under the signup form.
///
/// Showing a message replaces whatever is displayed and restarts the hide
/// timer: the previous timer is aborted, and a timer that already fired can
/// only clear the message it was scheduled for.
pub struct StatusBanner {
    hide_after: Duration,
    state: Arc<Mutex<BannerState>>,
}

impl StatusBanner {
    pub fn new(hide_after: Duration) -> Self {
        Self {
            hide_after,
            state: Arc::new(Mutex::new(BannerState::default())),
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn show(&self, text: impl Into<String>, kind: MessageKind) {
        let mut state = self.state.lock();
        state.generation += 1;
        let generation = state.generation;
        state.current = Some(StatusMessage {
            text: text.into(),
            kind,
        });
        state.shown_at = Some(Instant::now());

        if let Some(previous) = state.pending_hide.take() {
            previous.abort();
        }

        let shared = Arc::clone(&self.state);
        let hide_after = self.hide_after;
        state.pending_hide = Some(tokio::spawn(async move {
            tokio::time::sleep(hide_after).await;
            let mut state = shared.lock();
            if state.generation == generation {
                state.current = None;
                state.shown_at = None;
                state.pending_hide = None;
            }
        }));
    }

    pub fn current(&self) -> Option<StatusMessage> {
        self.state.lock().current.clone()
    }

    pub fn displayed(&self) -> Option<DisplayedMessage> {
        let state = self.state.lock();
        let message = state.current.clone()?;
        let elapsed = state.shown_at.map(|t| t.elapsed()).unwrap_or_default();
        Some(DisplayedMessage {
            message,
            remaining: self.hide_after.saturating_sub(elapsed),
        })
    }

    pub fn hide_after(&self) -> Duration {
        self.hide_after
    }
}

impl Drop for StatusBanner {
    fn drop(&mut self) {
        if let Some(pending) = self.state.lock().pending_hide.take() {
            pending.abort();
        }
    }
}
