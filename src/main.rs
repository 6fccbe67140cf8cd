use secrecy::ExposeSecret;
use std::net::SocketAddr;
use tokio_cron_scheduler::JobScheduler;
use tower_http::trace::TraceLayer;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use froebel_volunteers::api::{
    self,
    middleware::session::{create_session_layer, AppState},
};
use froebel_volunteers::config::Config;
use froebel_volunteers::db;
use froebel_volunteers::jobs::cleanup;
use froebel_volunteers::services::email::EmailClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "froebel_volunteers=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting volunteer server...");

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let pool = db::create_pool(config.database_url.expose_secret()).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Sessions live in Postgres next to the application tables
    let session_store = PostgresStore::new(pool.clone());
    session_store.migrate().await?;
    let session_layer = create_session_layer(session_store.clone(), &config);
    tracing::info!("Session layer initialized");

    let scheduler = JobScheduler::new().await?;
    cleanup::schedule(
        &scheduler,
        &config.cleanup_schedule,
        pool.clone(),
        session_store,
    )
    .await?;
    scheduler.start().await?;

    let email = EmailClient::new(
        &config.resend_api_url,
        config.resend_api_key.clone(),
        &config.email_from,
    )?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    let state = AppState {
        pool,
        config,
        email,
    };

    let app = api::router()
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, cleaning up...");
}
