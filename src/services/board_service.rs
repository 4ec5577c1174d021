use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{BoardAnchors, DEFAULT_VISITOR_IDLE_SECS};
use crate::models::ActivityCatalog;
use crate::services::activities_api_service::{ActivitiesApi, ActivitiesApiError};
use crate::services::board_view_service::{self, BoardView};
use crate::services::status_message_service::{DisplayedMessage, MessageKind};
use crate::services::visitor_service::{VisitorRegistry, VisitorSession};

pub const EMPTY_EMAIL_TEXT: &str = "Please enter an email address.";
pub const SIGNUP_FAILED_TEXT: &str = "Failed to sign up. Please try again.";
pub const UNREGISTER_FAILED_TEXT: &str = "Failed to unregister participant. Please try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CatalogState {
    #[default]
    NotLoaded,
    Loaded(ActivityCatalog),
    Failed,
}

/// Point-in-time copy of everything one visitor's view is derived from.
#[derive(Debug, Clone)]
pub struct BoardSnapshot {
    pub catalog: CatalogState,
    pub selected_activity: Option<String>,
    pub email_draft: String,
    pub message: Option<DisplayedMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    /// A newer load was issued while this one was in flight.
    Stale,
}

#[derive(Default)]
struct CatalogLoads {
    catalog: CatalogState,
    issued_loads: u64,
}

/// The catalog is shared by every visitor; the signup form and status
/// message belong to the visitor that submitted them. `load`, `signup` and
/// `unregister` are the only mutators; everything rendered comes from `view`.
pub struct ActivityBoard {
    api: Arc<dyn ActivitiesApi>,
    anchors: BoardAnchors,
    loads: Mutex<CatalogLoads>,
    visitors: VisitorRegistry,
}

impl ActivityBoard {
    pub fn new(api: Arc<dyn ActivitiesApi>, anchors: BoardAnchors, hide_after: Duration) -> Self {
        Self {
            api,
            anchors,
            loads: Mutex::new(CatalogLoads::default()),
            visitors: VisitorRegistry::new(
                hide_after,
                Duration::from_secs(DEFAULT_VISITOR_IDLE_SECS),
            ),
        }
    }

    pub fn with_visitor_idle_ttl(mut self, idle_ttl: Duration) -> Self {
        let hide_after = self.visitors.hide_after();
        self.visitors = VisitorRegistry::new(hide_after, idle_ttl);
        self
    }

    pub async fn load(&self) -> LoadOutcome {
        let seq = {
            let mut loads = self.loads.lock();
            loads.issued_loads += 1;
            loads.issued_loads
        };
        self.fetch_and_apply(seq).await
    }

    /// Loads only if nothing has been requested yet. The first caller claims
    /// load #1 under the lock; concurrent callers see the claim and return.
    pub async fn ensure_loaded(&self) -> Option<LoadOutcome> {
        let seq = {
            let mut loads = self.loads.lock();
            if loads.issued_loads != 0 {
                return None;
            }
            loads.issued_loads = 1;
            loads.issued_loads
        };
        Some(self.fetch_and_apply(seq).await)
    }

    async fn fetch_and_apply(&self, seq: u64) -> LoadOutcome {
        let result = self.api.list_activities().await;

        let mut loads = self.loads.lock();
        if seq != loads.issued_loads {
            debug!(
                "Discarding stale activities load #{} (latest #{})",
                seq, loads.issued_loads
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(catalog) => {
                info!("Loaded {} activities (load #{})", catalog.len(), seq);
                loads.catalog = CatalogState::Loaded(catalog);
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!("Activities load failed: {}", e);
                loads.catalog = CatalogState::Failed;
                LoadOutcome::Failed
            }
        }
    }

    pub async fn signup(&self, visitor: &str, email: &str, activity: &str) -> MessageKind {
        let session = self.visitors.session(visitor);
        let email = email.trim();
        session.keep_draft(email, activity);

        if email.is_empty() {
            session.show(EMPTY_EMAIL_TEXT, MessageKind::Error);
            return MessageKind::Error;
        }

        match self.api.signup(activity, email).await {
            Ok(resp) => {
                info!("Signed up {} for {}", email, activity);
                session.show(resp.message, MessageKind::Success);
                session.reset_form();
                self.load().await;
                MessageKind::Success
            }
            Err(e) => {
                warn!("Signup of {} for {} failed: {}", email, activity, e);
                show_failure(&session, &e, SIGNUP_FAILED_TEXT);
                MessageKind::Error
            }
        }
    }

    /// Returns whether the service confirmed the removal.
    pub async fn unregister(&self, visitor: &str, activity: &str, email: &str) -> bool {
        match self.api.unregister(activity, email).await {
            Ok(()) => {
                let mut loads = self.loads.lock();
                let removed = match &mut loads.catalog {
                    CatalogState::Loaded(catalog) => catalog
                        .get_mut(activity)
                        .map(|d| d.remove_participant(email))
                        .unwrap_or(false),
                    _ => false,
                };
                info!(
                    "Unregistered {} from {} (row removed: {})",
                    email, activity, removed
                );
                true
            }
            Err(e) => {
                warn!("Unregister of {} from {} failed: {}", email, activity, e);
                show_failure(&self.visitors.session(visitor), &e, UNREGISTER_FAILED_TEXT);
                false
            }
        }
    }

    pub fn catalog(&self) -> CatalogState {
        self.loads.lock().catalog.clone()
    }

    pub fn snapshot(&self, visitor: &str) -> BoardSnapshot {
        let session = self.visitors.session(visitor);
        let form = session.form();
        BoardSnapshot {
            catalog: self.catalog(),
            selected_activity: form.selected_activity,
            email_draft: form.email_draft,
            message: session.message(),
        }
    }

    pub fn view(&self, visitor: &str) -> BoardView {
        board_view_service::build_board_view(&self.snapshot(visitor), &self.anchors)
    }

    pub fn anchors(&self) -> &BoardAnchors {
        &self.anchors
    }
}

fn show_failure(session: &VisitorSession, err: &ActivitiesApiError, fallback: &str) {
    session.show(err.detail().unwrap_or(fallback), MessageKind::Error);
}
