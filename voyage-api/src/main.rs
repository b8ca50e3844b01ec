use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voyage_api::{app, AppState, Stores};
use voyage_store::app_config::Config;
use voyage_store::memory::InMemorySessionStore;
use voyage_store::booking_repo::StoreBookingRepository;
use voyage_store::esim_repo::StoreEsimRepository;
use voyage_store::user_repo::StoreUserRepository;
use voyage_store::{DbClient, RedisClient, SessionStore, TimetableTrainRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voyage_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Voyage API on port {}", config.server.port);

    let mut rules = config.business_rules.clone();

    let sessions: Arc<dyn SessionStore> = match &config.redis.url {
        Some(url) => Arc::new(
            RedisClient::new(url)
                .await
                .context("Failed to connect to Redis")?,
        ),
        None => {
            tracing::warn!("No redis.url configured, sessions and rate limits are process-local");
            Arc::new(InMemorySessionStore::new())
        }
    };

    let stores = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;
            rules = db
                .fetch_business_rules(rules)
                .await
                .context("Failed to load business rules")?;

            Stores {
                users: Arc::new(StoreUserRepository::new(db.pool.clone())),
                bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
                esims: Arc::new(StoreEsimRepository::new(db.pool.clone())),
                trains: Arc::new(TimetableTrainRepository::with_default_routes()),
                sessions,
            }
        }
        None => {
            tracing::warn!("No database.url configured, running on in-memory stores");
            Stores {
                sessions,
                ..Stores::in_memory()
            }
        }
    };

    let app = app(AppState::new(&config, rules, stores));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
