//! Top-level router assembly.

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use http::HeaderValue;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_routes, WebSocketState};
use crate::application::realtime::SessionSettings;
use crate::application::DeliveryCoordinator;
use crate::ports::{MessageStore, SessionValidator, UserDirectory};

use super::health::health_routes;
use super::messages::{message_routes, MessageHandlers};
use super::middleware::{auth_middleware, AuthState};
use super::users::{user_routes, UserHandlers};

/// Everything the HTTP surface needs, already wired.
#[derive(Clone)]
pub struct AppServices {
    pub coordinator: Arc<DeliveryCoordinator>,
    pub messages: Arc<dyn MessageStore>,
    pub users: Arc<dyn UserDirectory>,
    pub validator: Arc<dyn SessionValidator>,
    pub session: SessionSettings,
}

/// HTTP-level settings applied as layers.
#[derive(Debug, Clone, Default)]
pub struct RouterSettings {
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Timeout for REST requests. The WebSocket route is exempt.
    pub request_timeout: Option<Duration>,
}

/// Build the application router.
///
/// ```text
/// GET  /health
/// GET  /ws/:token
/// /messages/...  (Bearer auth)
/// /users/...     (Bearer auth)
/// ```
pub fn app_router(services: AppServices, settings: &RouterSettings) -> Router {
    let auth_state: AuthState = services.validator.clone();

    let mut api = Router::new()
        .nest(
            "/messages",
            message_routes(MessageHandlers::new(
                services.coordinator.clone(),
                services.messages.clone(),
                services.users.clone(),
            )),
        )
        .nest(
            "/users",
            user_routes(UserHandlers::new(services.coordinator.clone())),
        )
        .layer(middleware::from_fn_with_state(auth_state, auth_middleware));

    if let Some(timeout) = settings.request_timeout {
        api = api.layer(TimeoutLayer::new(timeout));
    }

    let realtime = websocket_routes(WebSocketState::new(
        services.coordinator.clone(),
        services.validator,
        services.session,
    ));

    Router::new()
        .merge(health_routes(services.coordinator.registry().clone()))
        .merge(realtime)
        .merge(api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&settings.cors_origins)),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}
