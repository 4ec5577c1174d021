#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;

use activity_board::config::BoardAnchors;
use activity_board::models::{ActivityCatalog, ActivityDetails, SignupResponse};
use activity_board::services::activities_api_service::HttpActivitiesApi;
use activity_board::services::board_service::ActivityBoard;
use activity_board::web;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    Ok,
    Garbage,
    Unavailable,
    /// Non-JSON error page, as a proxy in front of the service would send.
    PlainError,
}

pub struct UpstreamState {
    pub catalog: ActivityCatalog,
    pub list_mode: ListMode,
    pub list_calls: usize,
    pub requests: Vec<String>,
}

type Shared = Arc<Mutex<UpstreamState>>;

/// In-process stand-in for the activities service.
pub struct FakeUpstream {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl FakeUpstream {
    pub async fn start(catalog: ActivityCatalog) -> Self {
        let state = Arc::new(Mutex::new(UpstreamState {
            catalog,
            list_mode: ListMode::Ok,
            list_calls: 0,
            requests: Vec::new(),
        }));

        let app = Router::new()
            .route("/activities", get(list_activities))
            .route("/activities/:name/signup", post(signup))
            .route("/activities/:name/signup/:email", delete(unregister))
            .with_state(state.clone());

        let addr = serve(app).await;
        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().list_calls
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().requests.clone()
    }

    pub fn set_list_mode(&self, mode: ListMode) {
        self.state.lock().list_mode = mode;
    }

    pub fn participants(&self, activity: &str) -> Vec<String> {
        self.state
            .lock()
            .catalog
            .get(activity)
            .map(|d| d.participants.clone())
            .unwrap_or_default()
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn record(state: &Shared, method: Method, uri: &Uri) {
    state.lock().requests.push(format!("{} {}", method, uri));
}

fn detail(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "detail": text }))).into_response()
}

async fn list_activities(State(state): State<Shared>, uri: Uri) -> Response {
    record(&state, Method::GET, &uri);
    let mut s = state.lock();
    s.list_calls += 1;
    match s.list_mode {
        ListMode::Ok => Json(s.catalog.clone()).into_response(),
        ListMode::Garbage => (StatusCode::OK, "<html>not json</html>").into_response(),
        ListMode::Unavailable => detail(StatusCode::SERVICE_UNAVAILABLE, "maintenance"),
        ListMode::PlainError => (StatusCode::BAD_GATEWAY, "<h1>502 Bad Gateway</h1>").into_response(),
    }
}

#[derive(Deserialize)]
struct EmailQuery {
    email: String,
}

async fn signup(
    State(state): State<Shared>,
    Path(name): Path<String>,
    Query(query): Query<EmailQuery>,
    uri: Uri,
) -> Response {
    record(&state, Method::POST, &uri);
    let email = query.email.trim().to_lowercase();
    let mut s = state.lock();
    let Some(details) = s.catalog.get_mut(&name) else {
        return detail(StatusCode::NOT_FOUND, "Activity not found");
    };
    if details.participants.contains(&email) {
        return detail(StatusCode::BAD_REQUEST, "Student is already signed up");
    }
    if details.participants.len() >= details.max_participants as usize {
        return detail(StatusCode::BAD_REQUEST, "Activity full");
    }
    details.participants.push(email.clone());
    Json(SignupResponse {
        message: format!("Signed up {} for {}", email, name),
    })
    .into_response()
}

async fn unregister(
    State(state): State<Shared>,
    Path((name, email)): Path<(String, String)>,
    uri: Uri,
) -> Response {
    record(&state, Method::DELETE, &uri);
    let email = email.trim().to_lowercase();
    let mut s = state.lock();
    let Some(details) = s.catalog.get_mut(&name) else {
        return detail(StatusCode::NOT_FOUND, "Activity not found");
    };
    if !details.remove_participant(&email) {
        return detail(
            StatusCode::NOT_FOUND,
            "Student is not signed up for this activity",
        );
    }
    Json(json!({ "message": format!("Unregistered {} from {}", email, name) })).into_response()
}

pub fn details(max: u32, participants: &[&str]) -> ActivityDetails {
    ActivityDetails {
        description: "Learn strategies and compete in chess tournaments".to_string(),
        schedule: "Fridays, 3:30 PM - 5:00 PM".to_string(),
        max_participants: max,
        participants: participants.iter().map(|p| p.to_string()).collect(),
    }
}

pub fn catalog(entries: Vec<(&str, ActivityDetails)>) -> ActivityCatalog {
    entries
        .into_iter()
        .map(|(name, d)| (name.to_string(), d))
        .collect()
}

/// `{"Chess Club": {max_participants: 10, participants: [a@x.com, b@x.com]}}`
pub fn chess_club() -> ActivityCatalog {
    catalog(vec![("Chess Club", details(10, &["a@x.com", "b@x.com"]))])
}

pub fn http_api(base_url: &str) -> HttpActivitiesApi {
    HttpActivitiesApi::new(base_url, reqwest::Client::new())
}

/// A client that keeps cookies, like one browser.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder().cookie_store(true).build().unwrap()
}

/// An address nothing is listening on.
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Runs the board process against `api_base_url` and returns its base url.
pub async fn start_board(api_base_url: &str) -> String {
    let board = Arc::new(ActivityBoard::new(
        Arc::new(http_api(api_base_url)),
        BoardAnchors::default(),
        Duration::from_millis(5000),
    ));
    let addr = serve(web::router(board, "assets")).await;
    format!("http://{}", addr)
}
