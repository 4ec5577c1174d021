pub mod routes;

use std::path::Path;
use std::sync::Arc;

use axum::{
    response::Redirect,
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::services::board_service::ActivityBoard;
use routes::board;

pub fn router(board: Arc<ActivityBoard>, assets_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(|| async { Redirect::to(board::BOARD_PATH) }))
        .route(board::BOARD_PATH, get(board::board_page_handler))
        .route("/board/refresh", post(board::refresh_handler))
        .route("/board/signup", post(board::signup_handler))
        .route("/board/unregister", post(board::unregister_handler))
        .nest_service(
            "/assets",
            get_service(ServeDir::new(assets_dir.as_ref())).layer(
                SetResponseHeaderLayer::if_not_present(
                    CACHE_CONTROL,
                    HeaderValue::from_static("no-store"),
                ),
            ),
        )
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(board)
}
