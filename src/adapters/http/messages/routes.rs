//! HTTP routes for message endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    get_conversation, mark_read, search_messages, send_message, unread_count, MessageHandlers,
};

/// Creates the message router. Mounted under `/messages`.
pub fn message_routes(handlers: MessageHandlers) -> Router {
    Router::new()
        .route("/", post(send_message))
        .route("/conversation/:user_id", get(get_conversation))
        .route("/search", get(search_messages))
        .route("/unread-count", get(unread_count))
        .route("/:id/read", put(mark_read))
        .with_state(handlers)
}
