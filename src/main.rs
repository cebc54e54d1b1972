use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_relay::adapters::auth::JwtSessionValidator;
use chat_relay::adapters::http::{app_router, AppServices, RouterSettings};
use chat_relay::adapters::postgres::{PostgresMessageStore, PostgresUserDirectory};
use chat_relay::adapters::{RedisEventBus, RedisPresenceStore};
use chat_relay::application::{ConnectionRegistry, DeliveryCoordinator};
use chat_relay::config::AppConfig;
use chat_relay::ports::{MessageStore, SessionValidator, UserDirectory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    tracing::info!("Connected to database");

    if config.database.run_migrations {
        tracing::info!("Applying database migrations...");
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let redis_client = redis::Client::open(config.redis.url.as_str())?;
    let redis_conn = tokio::time::timeout(
        config.redis.timeout(),
        redis_client.get_multiplexed_async_connection(),
    )
    .await
    .map_err(|_| "Timed out connecting to Redis")??;
    tracing::info!("Connected to Redis");

    let presence = Arc::new(RedisPresenceStore::with_key(
        redis_conn.clone(),
        config.redis.presence_key.clone(),
    ));
    let bus = Arc::new(RedisEventBus::new(redis_client, redis_conn));

    let messages: Arc<dyn MessageStore> = Arc::new(PostgresMessageStore::new(pool.clone()));
    let users: Arc<dyn UserDirectory> = Arc::new(PostgresUserDirectory::new(pool));
    let validator: Arc<dyn SessionValidator> = Arc::new(JwtSessionValidator::new(
        &config.auth.jwt_secret,
        config.auth.algorithm()?,
        users.clone(),
    ));

    let coordinator = Arc::new(DeliveryCoordinator::new(
        Arc::new(ConnectionRegistry::new()),
        presence,
        bus,
        messages.clone(),
        users.clone(),
    ));

    let router = app_router(
        AppServices {
            coordinator: coordinator.clone(),
            messages,
            users,
            validator,
            session: config.delivery.session_settings(),
        },
        &RouterSettings {
            cors_origins: config.server.cors_origins_list(),
            request_timeout: Some(config.server.request_timeout()),
        },
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Chat relay listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(
            coordinator,
            config.server.shutdown_grace(),
        ))
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Resolves on SIGINT or SIGTERM, after realtime sessions have been told
/// to close and given `grace` to mark their users offline.
async fn shutdown_signal(coordinator: Arc<DeliveryCoordinator>, grace: Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to register ctrl-c handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to register SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    coordinator.shutdown(grace).await;
}
