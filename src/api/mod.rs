use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::email::{LogMailer, Mailer, SmtpMailer};
use crate::services::AuthService;

pub mod auth;
mod difficulty;
mod error;
mod item_config_results;
mod item_configs;
mod observability;
mod test_config_results;
mod test_configs;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub auth: Arc<AuthService>,

    pub config: Arc<Config>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let mailer: Arc<dyn Mailer> = if config.email.smtp_enabled {
        Arc::new(SmtpMailer::new(config.email.clone()))
    } else {
        Arc::new(LogMailer)
    };

    create_app_state_with_mailer(config, prometheus_handle, mailer).await
}

/// Same as [`create_app_state_from_config`] but with an injected mailer,
/// so tests can capture outbound reset links.
pub async fn create_app_state_with_mailer(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
    mailer: Arc<dyn Mailer>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let auth = Arc::new(AuthService::new(
        store.clone(),
        &config.auth,
        config.security.clone(),
        mailer,
    ));

    Ok(Arc::new(AppState {
        store,
        auth,
        config: Arc::new(config),
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/users/register", post(auth::register))
        .route("/users/login", post(auth::login))
        .route("/users/me", get(auth::me))
        .route("/users/logout", post(auth::logout))
        .route("/users/exists/{username}", get(auth::exists))
        .route("/users/forgot-password", post(auth::forgot_password))
        .route("/users/reset-password", post(auth::reset_password))
        .route("/item_configs/", post(item_configs::create_item_config))
        .route("/item_configs/", get(item_configs::list_item_configs))
        .route("/item_configs/{id}", get(item_configs::get_item_config))
        .route("/item_configs/{id}", put(item_configs::update_item_config))
        .route(
            "/item_configs/{id}",
            delete(item_configs::delete_item_config),
        )
        .route("/test_configs/", post(test_configs::create_test_config))
        .route("/test_configs/", get(test_configs::list_test_configs))
        .route("/test_configs/{id}", get(test_configs::get_test_config))
        .route("/test_configs/{id}", put(test_configs::update_test_config))
        .route(
            "/test_configs/{id}",
            delete(test_configs::delete_test_config),
        )
        .route(
            "/item_config_results/",
            post(item_config_results::create_item_config_result),
        )
        .route(
            "/item_config_results/user",
            get(item_config_results::list_for_current_user),
        )
        .route(
            "/item_config_results/item_config/{item_config_id}",
            get(item_config_results::list_for_item_config),
        )
        .route(
            "/item_config_results/{id}",
            get(item_config_results::get_item_config_result),
        )
        .route(
            "/test_config_results/",
            post(test_config_results::create_test_config_result),
        )
        .route(
            "/test_config_results/user",
            get(test_config_results::list_for_current_user),
        )
        .route(
            "/test_config_results/test_config/{test_config_id}",
            get(test_config_results::list_for_test_config),
        )
        .route(
            "/test_config_results/{id}",
            get(test_config_results::get_test_config_result),
        )
        .route(
            "/test_config_results/{id}",
            put(test_config_results::update_test_config_result),
        )
        .route(
            "/test_config_results/{id}",
            delete(test_config_results::delete_test_config_result),
        )
        .route("/difficulty/{level}", get(difficulty::get_by_difficulty))
        .route("/health", get(observability::health))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
