use keywarden::{
    api::{create_router, AppState},
    clock::{Clock, SystemClock},
    config::Config,
    db::{create_pool, run_migrations, PgStore, Store},
    observability::init_tracing,
    rate_limit::{self, LoginLimiter, MemoryLoginLimiter, RedisLoginLimiter},
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    // Initialize tracing/logging
    init_tracing(&config.observability);

    tracing::info!("Starting keywarden service");

    // Create database connection pool
    let db_pool = create_pool(&config.database).await?;

    // Run database migrations
    run_migrations(&db_pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // Select the login limiter backend
    let limiter: Arc<dyn LoginLimiter> = match config.login_limit.backend.as_str() {
        "redis" => {
            let redis_config = config
                .redis
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("Redis config missing for redis backend"))?;
            let manager = rate_limit::redis::create_client(redis_config).await?;
            Arc::new(RedisLoginLimiter::new(
                manager,
                config.login_limit.window_seconds,
                config.login_limit.max_attempts,
            ))
        }
        _ => Arc::new(MemoryLoginLimiter::new(clock.clone(), &config.login_limit)),
    };
    tracing::info!("Login limiter backend: {}", config.login_limit.backend);

    let state = AppState::new(store, clock, limiter, &config);

    // Seed the configured root admin if it does not exist yet
    state.admin.bootstrap().await?;

    // Create router
    let app = create_router(state);

    // Bind server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tracing::info!("Keywarden service is ready to accept requests");

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
