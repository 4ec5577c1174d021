use std::sync::Arc;

use askama::Template;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use cookie::{Cookie, SameSite};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::services::board_service::ActivityBoard;
use crate::services::board_view_service::BoardView;
use crate::services::visitor_service::{is_visitor_id, new_visitor_id};

pub const BOARD_PATH: &str = "/board";
pub const BUILD_ID: &str = env!("ACTIVITY_BOARD_BUILD_ID");
pub const VISITOR_COOKIE: &str = "board_visitor";

#[derive(Template)]
#[template(path = "board.html")]
pub struct BoardTemplate {
    pub view: BoardView,
    pub build_id: &'static str,
}

/// The browser a request came from. `issued` is set when the request
/// carried no usable cookie and the response must hand one out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visitor {
    pub id: String,
    pub issued: bool,
}

impl Visitor {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let existing = headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|raw| Cookie::split_parse(raw).filter_map(Result::ok))
            .find(|c| c.name() == VISITOR_COOKIE && is_visitor_id(c.value()))
            .map(|c| c.value().to_string());

        match existing {
            Some(id) => Self { id, issued: false },
            None => {
                let id = new_visitor_id();
                debug!("Issuing visitor id {}", id);
                Self { id, issued: true }
            }
        }
    }

    /// Attaches the visitor cookie when this request was the first one.
    pub fn respond(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        if self.issued {
            let mut visitor_cookie = Cookie::new(VISITOR_COOKIE, self.id.clone());
            visitor_cookie.set_path("/");
            visitor_cookie.set_http_only(true);
            visitor_cookie.set_same_site(SameSite::Lax);
            match HeaderValue::from_str(&visitor_cookie.to_string()) {
                Ok(value) => {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Err(e) => warn!("Visitor cookie is not a valid header value: {}", e),
            }
        }
        response
    }
}

pub async fn board_page_handler(
    State(board): State<Arc<ActivityBoard>>,
    headers: HeaderMap,
) -> Response {
    let visitor = Visitor::from_headers(&headers);
    board.ensure_loaded().await;
    visitor.respond(render_board(board.view(&visitor.id)))
}

pub fn render_board(view: BoardView) -> Response {
    let template = BoardTemplate {
        view,
        build_id: BUILD_ID,
    };
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            warn!("Board template render failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn refresh_handler(
    State(board): State<Arc<ActivityBoard>>,
    headers: HeaderMap,
) -> Response {
    let visitor = Visitor::from_headers(&headers);
    board.load().await;
    visitor.respond(Redirect::to(BOARD_PATH))
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub activity: String,
}

pub async fn signup_handler(
    State(board): State<Arc<ActivityBoard>>,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> Response {
    let visitor = Visitor::from_headers(&headers);
    board.signup(&visitor.id, &form.email, &form.activity).await;
    visitor.respond(Redirect::to(BOARD_PATH))
}

#[derive(Debug, Deserialize)]
pub struct UnregisterForm {
    pub activity: String,
    pub email: String,
}

pub async fn unregister_handler(
    State(board): State<Arc<ActivityBoard>>,
    headers: HeaderMap,
    Form(form): Form<UnregisterForm>,
) -> Response {
    let visitor = Visitor::from_headers(&headers);
    board.unregister(&visitor.id, &form.activity, &form.email).await;
    visitor.respond(Redirect::to(BOARD_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BoardAnchors;
    use crate::services::board_view_service::{
        ActivityCardView, ActivityOptionView, MessageView, ParticipantRowView,
        LOAD_FAILED_TEXT, NO_PARTICIPANTS_TEXT,
    };

    fn row(text: &str, is_placeholder: bool) -> ParticipantRowView {
        ParticipantRowView {
            text: text.to_string(),
            is_placeholder,
        }
    }

    fn chess_club_view() -> BoardView {
        BoardView {
            anchors: BoardAnchors::default(),
            catalog_notice: None,
            cards: vec![
                ActivityCardView {
                    name: "Chess Club".to_string(),
                    description: "Learn strategies and compete in chess tournaments".to_string(),
                    schedule: "Fridays, 3:30 PM - 5:00 PM".to_string(),
                    spots_left: 8,
                    spots_left_label: "8 spots left".to_string(),
                    rows: vec![row("a@x.com", false), row("b@x.com", false)],
                },
                ActivityCardView {
                    name: "Art Studio".to_string(),
                    description: "Paint and draw".to_string(),
                    schedule: "Mondays".to_string(),
                    spots_left: 4,
                    spots_left_label: "4 spots left".to_string(),
                    rows: vec![row(NO_PARTICIPANTS_TEXT, true)],
                },
            ],
            options: vec![
                ActivityOptionView {
                    name: "Chess Club".to_string(),
                    selected: false,
                },
                ActivityOptionView {
                    name: "Art Studio".to_string(),
                    selected: true,
                },
            ],
            email_draft: "c@x.com".to_string(),
            message: Some(MessageView {
                text: "Activity full".to_string(),
                css_class: "error",
                hide_after_ms: 5000,
            }),
        }
    }

    fn render(view: BoardView) -> String {
        BoardTemplate {
            view,
            build_id: "test",
        }
        .render()
        .unwrap()
    }

    #[test]
    fn page_exposes_every_anchor() {
        let html = render(chess_club_view());
        for id in ["activities-list", "activity", "signup-form", "message", "email"] {
            assert!(html.contains(&format!("id=\"{}\"", id)), "missing anchor {}", id);
        }
    }

    #[test]
    fn page_renders_cards_rows_and_placeholder() {
        let html = render(chess_club_view());
        assert!(html.contains("<h4>Chess Club</h4>"));
        assert!(html.contains("8 spots left"));
        assert_eq!(html.matches("class=\"participant-row\"").count(), 2);
        assert_eq!(html.matches("class=\"no-participants\"").count(), 1);
        assert!(html.contains(NO_PARTICIPANTS_TEXT));
        // One removal form per real participant row.
        assert_eq!(html.matches("action=\"/board/unregister\"").count(), 2);
    }

    #[test]
    fn page_keeps_form_draft_selection_and_message() {
        let html = render(chess_club_view());
        assert!(html.contains("value=\"c@x.com\""));
        assert!(html.contains("<option value=\"Art Studio\" selected>Art Studio</option>"));
        assert!(html.contains("<option value=\"Chess Club\">Chess Club</option>"));
        assert!(html.contains("class=\"message error auto-hide\""));
        assert!(html.contains("Activity full"));
    }

    #[test]
    fn message_hides_itself_after_its_remaining_time() {
        let html = render(chess_club_view());
        assert!(html.contains("style=\"animation-delay: 5000ms\">Activity full</div>"));

        let mut view = chess_club_view();
        view.message.as_mut().unwrap().hide_after_ms = 1200;
        assert!(render(view).contains("animation-delay: 1200ms"));
    }

    fn cookie_headers(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(raw).unwrap());
        headers
    }

    #[test]
    fn visitor_cookie_is_reused_when_valid() {
        let id = new_visitor_id();
        let visitor =
            Visitor::from_headers(&cookie_headers(&format!("theme=dark; board_visitor={}", id)));
        assert_eq!(visitor, Visitor { id, issued: false });

        let response = visitor.respond(Redirect::to(BOARD_PATH));
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn missing_or_forged_visitor_cookie_gets_a_fresh_id() {
        let visitor = Visitor::from_headers(&cookie_headers("board_visitor=alice"));
        assert!(visitor.issued);
        assert_ne!(visitor.id, "alice");
        assert!(is_visitor_id(&visitor.id));

        let response = visitor.respond(Redirect::to(BOARD_PATH));
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(set_cookie.starts_with(&format!("board_visitor={}", visitor.id)));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));
        assert!(set_cookie.contains("Path=/"));

        assert!(Visitor::from_headers(&HeaderMap::new()).issued);
    }

    #[test]
    fn failed_catalog_renders_notice_without_options() {
        let mut view = chess_club_view();
        view.catalog_notice = Some(LOAD_FAILED_TEXT);
        view.cards.clear();
        view.options.clear();
        view.message = None;

        let html = render(view);
        assert!(html.contains(LOAD_FAILED_TEXT));
        assert!(!html.contains("<option value=\"Chess Club\""));
        assert!(html.contains("class=\"message hidden\""));
    }

    #[test]
    fn custom_anchor_ids_are_used() {
        let mut view = chess_club_view();
        view.anchors.activities_list = "board-cards".to_string();
        let html = render(view);
        assert!(html.contains("id=\"board-cards\""));
        assert!(!html.contains("id=\"activities-list\""));
    }
}
