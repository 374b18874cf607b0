use crate::{
    admin::AdminEngine,
    api::{admin, health, keys, middleware::admin_auth, stats},
    clock::Clock,
    config::Config,
    db::Store,
    keys::KeyLifecycle,
    observability::HealthChecker,
    rate_limit::LoginLimiter,
    stats::StatsAggregator,
};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<KeyLifecycle>,
    pub admin: Arc<AdminEngine>,
    pub stats: Arc<StatsAggregator>,
    pub health_checker: Arc<HealthChecker>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        limiter: Arc<dyn LoginLimiter>,
        config: &Config,
    ) -> Self {
        let call_timeout = Duration::from_secs(config.database.call_timeout_seconds);
        Self {
            keys: Arc::new(KeyLifecycle::new(
                store.clone(),
                clock.clone(),
                config.keys.clone(),
                call_timeout,
            )),
            admin: Arc::new(AdminEngine::new(
                store.clone(),
                clock.clone(),
                limiter,
                config.admin.clone(),
                call_timeout,
            )),
            stats: Arc::new(StatsAggregator::new(
                store.clone(),
                clock,
                config.stats.clone(),
                call_timeout,
            )),
            health_checker: Arc::new(HealthChecker::new(store)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        // API v1 routes
        .nest("/v1", v1_routes(state.clone()))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Add state
        .with_state(state)
}

fn v1_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/keys", post(keys::create))
        .route("/keys/:id", get(keys::info))
        .route("/keys/:id/validate", post(keys::validate))
        .route("/users/:user_id/keys", get(keys::list_for_user))
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", post(admin::logout));

    let protected = Router::new()
        .route("/stats", get(stats::key_stats))
        .route("/admin/session", get(admin::introspect))
        .route(
            "/admin/sessions",
            get(admin::list_sessions).delete(admin::clear_sessions),
        )
        .route("/admin/keys", post(keys::create_issued))
        .route("/admin/keys/:id", delete(keys::remove))
        .route(
            "/admin/admins",
            post(admin::create_admin).get(admin::list_admins),
        )
        .route(
            "/admin/admins/:id",
            get(admin::get_admin)
                .put(admin::update_admin)
                .delete(admin::delete_admin),
        )
        .layer(middleware::from_fn_with_state(state, admin_auth));

    public.merge(protected)
}
