use crate::config::BoardAnchors;
use crate::services::board_service::{BoardSnapshot, CatalogState};
use crate::services::status_message_service::DisplayedMessage;

pub const NO_PARTICIPANTS_TEXT: &str = "No participants yet";
pub const LOADING_TEXT: &str = "Loading activities...";
pub const LOAD_FAILED_TEXT: &str = "Failed to load activities. Please try again later.";

pub struct BoardView {
    pub anchors: BoardAnchors,
    /// Replaces the card list while loading or after a failed load.
    pub catalog_notice: Option<&'static str>,
    pub cards: Vec<ActivityCardView>,
    pub options: Vec<ActivityOptionView>,
    pub email_draft: String,
    pub message: Option<MessageView>,
}

pub struct ActivityCardView {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub spots_left: i64,
    pub spots_left_label: String,
    pub rows: Vec<ParticipantRowView>,
}

impl ActivityCardView {
    pub fn participant_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_placeholder).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRowView {
    pub text: String,
    pub is_placeholder: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityOptionView {
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub text: String,
    pub css_class: &'static str,
    /// Time left before the page hides the message on its own.
    pub hide_after_ms: u64,
}

pub fn build_board_view(snapshot: &BoardSnapshot, anchors: &BoardAnchors) -> BoardView {
    let (catalog_notice, cards, options) = match &snapshot.catalog {
        CatalogState::NotLoaded => (Some(LOADING_TEXT), Vec::new(), Vec::new()),
        CatalogState::Failed => (Some(LOAD_FAILED_TEXT), Vec::new(), Vec::new()),
        CatalogState::Loaded(catalog) => {
            let cards = catalog
                .iter()
                .map(|activity| {
                    let details = &activity.details;
                    let spots_left = details.spots_left();
                    ActivityCardView {
                        name: activity.name.clone(),
                        description: details.description.clone(),
                        schedule: details.schedule.clone(),
                        spots_left,
                        spots_left_label: format!("{} spots left", spots_left),
                        rows: participant_rows(&details.participants),
                    }
                })
                .collect();
            let selected = snapshot.selected_activity.as_deref();
            let options = catalog
                .names()
                .map(|name| ActivityOptionView {
                    name: name.to_string(),
                    selected: selected == Some(name),
                })
                .collect();
            (None, cards, options)
        }
    };

    BoardView {
        anchors: anchors.clone(),
        catalog_notice,
        cards,
        options,
        email_draft: snapshot.email_draft.clone(),
        message: snapshot.message.as_ref().map(message_view),
    }
}

fn participant_rows(participants: &[String]) -> Vec<ParticipantRowView> {
    if participants.is_empty() {
        return vec![ParticipantRowView {
            text: NO_PARTICIPANTS_TEXT.to_string(),
            is_placeholder: true,
        }];
    }
    participants
        .iter()
        .map(|email| ParticipantRowView {
            text: email.clone(),
            is_placeholder: false,
        })
        .collect()
}

fn message_view(shown: &DisplayedMessage) -> MessageView {
    MessageView {
        text: shown.message.text.clone(),
        css_class: shown.message.kind.css_class(),
        hide_after_ms: u64::try_from(shown.remaining.as_millis()).unwrap_or(u64::MAX),
    }
}
