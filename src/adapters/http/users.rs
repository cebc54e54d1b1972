//! HTTP adapter for the user directory and presence queries.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::adapters::http::error::{delivery_error_response, ErrorResponse};
use crate::adapters::http::middleware::RequireAuth;
use crate::application::DeliveryCoordinator;
use crate::domain::chat::UserSummary;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub is_online: bool,
}

impl UserResponse {
    pub fn new(user: UserSummary, is_online: bool) -> Self {
        Self {
            id: user.id,
            username: user.username,
            is_online,
        }
    }
}

#[derive(Clone)]
pub struct UserHandlers {
    coordinator: Arc<DeliveryCoordinator>,
}

impl UserHandlers {
    pub fn new(coordinator: Arc<DeliveryCoordinator>) -> Self {
        Self { coordinator }
    }
}

/// GET /users/online - Everyone online except the caller
pub async fn list_online_users(
    State(handlers): State<UserHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    match handlers.coordinator.online_peers(user.id).await {
        Ok(peers) => {
            let body: Vec<UserResponse> = peers
                .into_iter()
                .map(|peer| UserResponse::new(peer, true))
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => delivery_error_response(e).into_response(),
    }
}

/// GET /users - Every registered user except the caller
pub async fn list_users(
    State(handlers): State<UserHandlers>,
    RequireAuth(user): RequireAuth,
) -> Response {
    match handlers.coordinator.directory(user.id).await {
        Ok(users) => {
            let body: Vec<UserResponse> = users
                .into_iter()
                .map(|(user, is_online)| UserResponse::new(user, is_online))
                .collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => delivery_error_response(e).into_response(),
    }
}

/// GET /users/:user_id - One user by id
pub async fn get_user(
    State(handlers): State<UserHandlers>,
    RequireAuth(_caller): RequireAuth,
    Path(user_id): Path<i64>,
) -> Response {
    let user_id = match UserId::new(user_id) {
        Ok(id) => id,
        Err(e) => return (StatusCode::BAD_REQUEST, Json(ErrorResponse::from(e))).into_response(),
    };

    match handlers.coordinator.profile(user_id).await {
        Ok(Some((user, is_online))) => {
            (StatusCode::OK, Json(UserResponse::new(user, is_online))).into_response()
        }
        Ok(None) => {
            let error = DomainError::new(
                ErrorCode::UserNotFound,
                format!("User {} not found", user_id),
            );
            (StatusCode::NOT_FOUND, Json(ErrorResponse::from(error))).into_response()
        }
        Err(e) => delivery_error_response(e).into_response(),
    }
}

/// Creates the user router. Mounted under `/users`.
pub fn user_routes(handlers: UserHandlers) -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/online", get(list_online_users))
        .route("/:user_id", get(get_user))
        .with_state(handlers)
}
