//! HTTP handlers for message endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::adapters::http::error::{delivery_error_response, ErrorResponse};
use crate::adapters::http::middleware::RequireAuth;
use crate::application::{DeliveryCoordinator, DeliveryError};
use crate::domain::chat::{ConversationKey, MessageEvent, StoredMessage, UserSummary};
use crate::domain::foundation::{DomainError, ErrorCode, MessageId, UserId, ValidationError};
use crate::ports::{MessageStore, StoreError, UserDirectory};

use super::dto::{
    PageQuery, SearchQuery, SendMessageRequest, StatusMessageResponse, UnreadCountResponse,
};

/// Username shown when a message references a user the directory no
/// longer knows.
const UNKNOWN_USERNAME: &str = "unknown";

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct MessageHandlers {
    coordinator: Arc<DeliveryCoordinator>,
    messages: Arc<dyn MessageStore>,
    users: Arc<dyn UserDirectory>,
}

impl MessageHandlers {
    pub fn new(
        coordinator: Arc<DeliveryCoordinator>,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            coordinator,
            messages,
            users,
        }
    }

    /// Attach both usernames to each stored message.
    async fn enrich(&self, rows: Vec<StoredMessage>) -> Result<Vec<MessageEvent>, StoreError> {
        let mut ids: Vec<UserId> = rows
            .iter()
            .flat_map(|m| [m.sender_id, m.receiver_id])
            .collect();
        ids.sort();
        ids.dedup();

        let names: HashMap<UserId, UserSummary> = self
            .users
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let lookup = |id: UserId| {
            names
                .get(&id)
                .cloned()
                .unwrap_or_else(|| UserSummary::new(id, UNKNOWN_USERNAME))
        };

        Ok(rows
            .into_iter()
            .map(|m| {
                let sender = lookup(m.sender_id);
                let receiver = lookup(m.receiver_id);
                m.into_event(&sender, &receiver)
            })
            .collect())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /messages - Send a direct message without a realtime connection
pub async fn send_message(
    State(handlers): State<MessageHandlers>,
    RequireAuth(user): RequireAuth,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let receiver_id = match UserId::new(req.receiver_id) {
        Ok(id) => id,
        Err(e) => return validation_error(e),
    };

    match handlers
        .coordinator
        .handle_incoming_message(&user, receiver_id, &req.content)
        .await
    {
        Ok(event) => (StatusCode::CREATED, Json(event)).into_response(),
        Err(e) => delivery_error_response(e).into_response(),
    }
}

/// GET /messages/conversation/:user_id - History with one partner, newest first
pub async fn get_conversation(
    State(handlers): State<MessageHandlers>,
    RequireAuth(user): RequireAuth,
    Path(partner_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> Response {
    let partner_id = match UserId::new(partner_id) {
        Ok(id) => id,
        Err(e) => return validation_error(e),
    };
    let page = match query.into_page() {
        Ok(page) => page,
        Err(e) => return validation_error(e),
    };

    match handlers.users.find_by_id(partner_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let error = DomainError::new(
                ErrorCode::UserNotFound,
                format!("User {} not found", partner_id),
            );
            return (StatusCode::NOT_FOUND, Json(ErrorResponse::from(error))).into_response();
        }
        Err(e) => return store_error(e),
    }

    let key = ConversationKey::new(user.id, partner_id);
    let rows = match handlers.messages.conversation(key, user.id, page).await {
        Ok(rows) => rows,
        Err(e) => return store_error(e),
    };

    match handlers.enrich(rows).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => store_error(e),
    }
}

/// GET /messages/search?q= - Substring search over the caller's messages
pub async fn search_messages(
    State(handlers): State<MessageHandlers>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<SearchQuery>,
) -> Response {
    let needle = query.q.trim();
    if needle.is_empty() {
        return validation_error(ValidationError::empty_field("q"));
    }
    let page = match query.page().into_page() {
        Ok(page) => page,
        Err(e) => return validation_error(e),
    };

    let rows = match handlers.messages.search(user.id, needle, page).await {
        Ok(rows) => rows,
        Err(e) => return store_error(e),
    };

    match handlers.enrich(rows).await {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(e) => store_error(e),
    }
}

/// PUT /messages/:id/read - Mark a received message read
pub async fn mark_read(
    State(handlers): State<MessageHandlers>,
    RequireAuth(user): RequireAuth,
    Path(message_id): Path<i64>,
) -> Response {
    match handlers
        .messages
        .mark_read(MessageId::from_i64(message_id), user.id)
        .await
    {
        Ok(_) => (
            StatusCode::OK,
            Json(StatusMessageResponse {
                message: "Message marked as read".to_string(),
            }),
        )
            .into_response(),
        Err(StoreError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                ErrorCode::MessageNotFound,
                "Message not found",
            )),
        )
            .into_response(),
        Err(e) => store_error(e),
    }
}

/// GET /messages/unread-count - Number of unread messages for the caller
pub async fn unread_count(
    State(handlers): State<MessageHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    match handlers.messages.unread_count(user.id).await {
        Ok(unread_count) => {
            (StatusCode::OK, Json(UnreadCountResponse { unread_count })).into_response()
        }
        Err(e) => store_error(e),
    }
}

fn validation_error(e: ValidationError) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(e))).into_response()
}

fn store_error(e: StoreError) -> Response {
    delivery_error_response(DeliveryError::from(e)).into_response()
}
