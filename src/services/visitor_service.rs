use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::services::status_message_service::{DisplayedMessage, MessageKind, StatusBanner};

pub fn new_visitor_id() -> String {
    Uuid::new_v4().to_string()
}

/// Only ids this process could have issued are accepted from a cookie.
pub fn is_visitor_id(candidate: &str) -> bool {
    Uuid::parse_str(candidate).is_ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorForm {
    pub selected_activity: Option<String>,
    pub email_draft: String,
}

/// One browser's signup form and status message.
pub struct VisitorSession {
    form: Mutex<VisitorForm>,
    banner: StatusBanner,
}

impl VisitorSession {
    pub fn new(hide_after: Duration) -> Self {
        Self {
            form: Mutex::new(VisitorForm::default()),
            banner: StatusBanner::new(hide_after),
        }
    }

    pub fn form(&self) -> VisitorForm {
        self.form.lock().clone()
    }

    pub fn keep_draft(&self, email: &str, activity: &str) {
        let mut form = self.form.lock();
        form.email_draft = email.to_string();
        form.selected_activity = Some(activity.to_string()).filter(|a| !a.is_empty());
    }

    pub fn reset_form(&self) {
        *self.form.lock() = VisitorForm::default();
    }

    pub fn show(&self, text: impl Into<String>, kind: MessageKind) {
        self.banner.show(text, kind);
    }

    pub fn message(&self) -> Option<DisplayedMessage> {
        self.banner.displayed()
    }
}

struct VisitorEntry {
    session: Arc<VisitorSession>,
    last_seen: Instant,
}

/// Sessions keyed by visitor id. Entries idle for longer than `idle_ttl`
/// are dropped the next time any session is looked up.
pub struct VisitorRegistry {
    hide_after: Duration,
    idle_ttl: Duration,
    visitors: Mutex<HashMap<String, VisitorEntry>>,
}

impl VisitorRegistry {
    pub fn new(hide_after: Duration, idle_ttl: Duration) -> Self {
        Self {
            hide_after,
            idle_ttl,
            visitors: Mutex::new(HashMap::new()),
        }
    }

    pub fn session(&self, visitor_id: &str) -> Arc<VisitorSession> {
        let now = Instant::now();
        let mut visitors = self.visitors.lock();

        let before = visitors.len();
        let idle_ttl = self.idle_ttl;
        visitors.retain(|id, entry| {
            id == visitor_id || now.duration_since(entry.last_seen) < idle_ttl
        });
        if visitors.len() < before {
            debug!("Dropped {} idle visitor sessions", before - visitors.len());
        }

        let hide_after = self.hide_after;
        let entry = visitors
            .entry(visitor_id.to_string())
            .or_insert_with(|| VisitorEntry {
                session: Arc::new(VisitorSession::new(hide_after)),
                last_seen: now,
            });
        entry.last_seen = now;
        Arc::clone(&entry.session)
    }

    pub fn hide_after(&self) -> Duration {
        self.hide_after
    }

    pub fn len(&self) -> usize {
        self.visitors.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.lock().is_empty()
    }
}
