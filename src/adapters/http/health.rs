//! Liveness endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::application::ConnectionRegistry;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
}

async fn health(State(registry): State<Arc<ConnectionRegistry>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: registry.len().await,
    })
}

pub fn health_routes(registry: Arc<ConnectionRegistry>) -> Router {
    Router::new().route("/health", get(health)).with_state(registry)
}
