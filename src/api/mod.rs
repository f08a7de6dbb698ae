use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::Config;
use crate::constants::auth::LOGIN_PATH;
use crate::db::Store;
use crate::services::{AuthService, SeaOrmAuthService};

pub mod auth;
mod error;
mod pages;
mod posts;
mod projects;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    pub config: Config,

    pub store: Store,

    pub auth: Arc<dyn AuthService>,

    pub start_time: std::time::Instant,
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    // Bootstrap the credential store from configuration before anything can
    // attempt a login.
    store.ensure_admin(&config.admin, &config.security).await?;

    let auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        config.admin.clone(),
        config.security.clone(),
    ));

    Ok(Arc::new(AppState {
        config,
        store,
        auth,
        start_time: std::time::Instant::now(),
    }))
}

pub async fn router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    // Durable session store sharing the application's sqlite pool, so an
    // established session survives a process restart.
    let session_store = SqliteStore::new(state.store.conn.get_sqlite_connection_pool().clone());
    session_store.migrate().await?;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.config.server.session_expiry_minutes,
        )));

    let api_router = Router::new()
        .merge(create_protected_router())
        .route("/posts", get(posts::list_posts))
        .route("/posts/{slug}", get(posts::get_post))
        .route("/projects", get(projects::list_projects))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/reset", post(auth::reset_password))
        .with_state(state.clone());

    let admin_pages = Router::new()
        .route("/admin", get(pages::admin_page))
        .route("/admin/{*rest}", get(pages::admin_page))
        .route_layer(middleware::from_fn(auth::guard_page));

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Ok(Router::new()
        .nest("/api", api_router)
        .merge(admin_pages)
        .route(LOGIN_PATH, get(pages::login_page))
        .layer(session_layer)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http()))
}

fn create_protected_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/admin/posts", get(posts::list_all_posts))
        .route("/admin/posts", post(posts::create_post))
        .route("/admin/posts/{id}", put(posts::update_post))
        .route("/admin/posts/{id}", delete(posts::delete_post))
        .route("/admin/projects", post(projects::create_project))
        .route("/admin/projects/{id}", put(projects::update_project))
        .route("/admin/projects/{id}", delete(projects::delete_project))
        .route("/system/status", get(system::get_status))
        .route_layer(middleware::from_fn(auth::require_auth))
}
