//! tenant-access server
//!
//! Serves the access API, runs the expiring-trials sweep on an interval and
//! shuts both down on Ctrl-C.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use tenant_access::adapters::http::{access_router, AccessAppState, AccessSettings};
use tenant_access::adapters::{
    InMemoryHandoffStore, InMemoryIdentityProvider, PostgresAuditLog, PostgresRecordStore, RedisHandoffStore,
    SystemClock, TracingTrialNotifier,
};
use tenant_access::application::access::{EnforcementGuard, ResolveStatusHandler, TrialSweepScheduler};
use tenant_access::config::{AppConfig, LogFormat, ServerConfig};
use tenant_access::ports::{Clock, HandoffStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load_validated()?;
    init_tracing(&config.server);

    tracing::info!(environment = ?config.server.environment, "starting tenant-access");

    // Record store
    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("migrations applied");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = Arc::new(PostgresRecordStore::new(pool.clone(), clock.clone()));

    // Handoff store
    let handoff: Arc<dyn HandoffStore> = match &config.redis {
        Some(redis_config) => {
            let client = redis::Client::open(redis_config.url.as_str())?;
            let conn =
                tokio::time::timeout(redis_config.timeout(), client.get_multiplexed_async_connection()).await??;
            tracing::info!("handoff store: redis");
            Arc::new(RedisHandoffStore::new(conn).with_ttl_secs(redis_config.handoff_ttl_secs))
        }
        None => {
            tracing::warn!("no redis configured, denial reasons are kept in memory");
            Arc::new(InMemoryHandoffStore::new())
        }
    };

    // Sessions live in the embedding client; the server only answers the
    // sign-in gate, which never touches the identity provider.
    let resolver = Arc::new(ResolveStatusHandler::new(store.clone(), store.clone(), clock.clone()));
    let guard = EnforcementGuard::new(resolver, Arc::new(InMemoryIdentityProvider::new()), handoff)
        .with_landing_route(config.access.landing_route.clone())
        .with_poll_interval(config.access.guard_poll_interval());

    let state = AccessAppState {
        tenants: store.clone(),
        subscriptions: store.clone(),
        plans: store.clone(),
        trial_configs: store,
        notifier: Arc::new(TracingTrialNotifier),
        event_publisher: Arc::new(PostgresAuditLog::new(pool)),
        clock,
        guard: Arc::new(guard),
        settings: AccessSettings::from_config(&config.access)?,
    };

    // Background sweep
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = TrialSweepScheduler::new(Arc::new(state.sweep_handler()), config.access.sweep_interval());
    let sweep_handle = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    let app = access_router()
        .with_state(state)
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    sweep_handle.await?;
    tracing::info!("tenant-access stopped");
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&server.log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match server.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        return;
    }
    tracing::info!("shutdown requested");
}
