// src/routes/mod.rs
pub mod chat;

use std::path::Path;

use crate::state::SharedState;
use axum::{
    Router,
    routing::{get, post},
};
use chat::{change_nickname_handler, get_messages_handler, join_handler, send_message_handler};
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// API routes plus the static client bundle under `static_dir`. Unknown GET
/// paths fall back to `index.html` so client-side routing works.
pub fn create_router(static_dir: impl AsRef<Path>) -> Router<SharedState> {
    let static_dir = static_dir.as_ref();
    let client_bundle =
        ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/join", post(join_handler))
        .route("/change-nickname", post(change_nickname_handler))
        .route("/send-message", post(send_message_handler))
        .route("/messages", get(get_messages_handler))
        .route("/health", get(|| async { "OK" }))
        .fallback_service(client_bundle)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
}
