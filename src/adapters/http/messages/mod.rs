//! HTTP adapter for message history, search and read receipts.

mod dto;
mod handlers;
mod routes;

pub use dto::{PageQuery, SearchQuery, SendMessageRequest, StatusMessageResponse, UnreadCountResponse};
pub use handlers::MessageHandlers;
pub use routes::message_routes;
