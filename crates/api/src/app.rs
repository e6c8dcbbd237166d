use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_admin, security_headers_middleware, trace_id,
};
use crate::routes;
use crate::services::{
    ElasticsearchIndexer, FileStorage, ImporterRegistry, Mailer, PassportRegistry, SlackNotifier,
};
use domain::models::{ConfigNamespace, SearchEvent};
use domain::services::{ConfigService, ProviderLifecycle, SearchIndexer, StoreError};
use persistence::repositories::{ConfigRepository, PageRepository};

/// Capacity of the search progress channel; slow clients miss older events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub settings: Arc<ConfigService>,
    pub providers: Arc<ProviderLifecycle>,
    pub passport: Arc<PassportRegistry>,
    pub slack: Arc<SlackNotifier>,
    pub mailer: Arc<Mailer>,
    pub storage: Arc<FileStorage>,
    /// `None` when no search backend is configured.
    pub searcher: Option<Arc<dyn SearchIndexer>>,
    pub importers: Arc<ImporterRegistry>,
    pub events: broadcast::Sender<SearchEvent>,
}

impl AppState {
    /// Whether pages can be restricted to groups.
    pub fn is_acl_enabled(&self) -> bool {
        !self.config.security.public_wiki_only
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to initialize {service}: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    #[error("failed to load configuration: {0}")]
    Store(#[from] StoreError),
}

/// Builds the shared state. Subsystems start empty; see [`initialize`].
pub fn build_state(config: Config, pool: PgPool) -> Result<AppState, StartupError> {
    let config = Arc::new(config);

    let settings = Arc::new(ConfigService::new(Arc::new(ConfigRepository::new(
        pool.clone(),
    ))));
    let passport = Arc::new(PassportRegistry::new());
    let providers = Arc::new(ProviderLifecycle::new(passport.clone()));
    let slack = Arc::new(SlackNotifier::new(&config.slack).map_err(|e| {
        StartupError::Service {
            service: "slack",
            message: e.to_string(),
        }
    })?);
    let importers = Arc::new(ImporterRegistry::new(&config.importer)?);

    let searcher: Option<Arc<dyn SearchIndexer>> = if config.search.is_enabled() {
        let indexer = ElasticsearchIndexer::new(&config.search, PageRepository::new(pool.clone()))
            .map_err(|e| StartupError::Service {
                service: "search",
                message: e.to_string(),
            })?;
        Some(Arc::new(indexer))
    } else {
        None
    };

    let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    Ok(AppState {
        pool,
        storage: Arc::new(FileStorage::new(&config.storage)),
        mailer: Arc::new(Mailer::new()),
        config,
        settings,
        providers,
        passport,
        slack,
        searcher,
        importers,
        events,
    })
}

/// Loads every configuration namespace and brings the subsystems up from
/// it.
pub async fn initialize(state: &AppState) -> Result<(), StartupError> {
    state.settings.preload().await?;

    let crowi = state.settings.get(ConfigNamespace::Crowi).await?;
    let notification = state.settings.get(ConfigNamespace::Notification).await?;

    state.providers.initialize_all(&crowi).await;
    state.mailer.reinitialize(&crowi).await;
    state.importers.initialize_all(&crowi).await;
    state.slack.reinitialize(&notification).await;

    tracing::info!(
        search_enabled = state.searcher.is_some(),
        acl_enabled = state.is_acl_enabled(),
        "Subsystems initialized"
    );
    Ok(())
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.security.cors_origins.is_empty() {
        // Development default
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Admin views, forms and JSON endpoints
    let admin_routes = Router::new()
        .merge(routes::admin::router())
        .merge(routes::settings::router())
        .merge(routes::markdown::router())
        .merge(routes::notification::router())
        .merge(routes::global_notification::router())
        .merge(routes::users::router())
        .merge(routes::external_accounts::router())
        .merge(routes::user_groups::router())
        .merge(routes::importer::router())
        .merge(routes::search::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let public_routes = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/health/ready", get(routes::health::ready))
        .route("/api/health/live", get(routes::health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(DefaultBodyLimit::max(config.server.max_body_size))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config))
        .with_state(state)
}

/// Builds the router without bringing subsystems up. Used by tests.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, StartupError> {
    Ok(create_router(build_state(config, pool)?))
}
