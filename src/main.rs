use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: RateLimitState,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindtrack_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    let db = db::create_pool(&config.database_url).await;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let state = AppState {
        db,
        config: config.clone(),
        rate_limiter: RateLimitState::new(),
    };

    // Auth routes carry per-IP rate limiting
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .merge(auth_routes);

    let protected_routes = Router::new()
        .route("/api/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Mood entries
        .route("/api/mood", get(handlers::mood::list_entries))
        .route("/api/mood", post(handlers::mood::create_entry))
        .route("/api/mood/stats", get(handlers::mood::get_stats))
        .route("/api/mood/:id", get(handlers::mood::get_entry))
        .route("/api/mood/:id", put(handlers::mood::update_entry))
        .route("/api/mood/:id", delete(handlers::mood::delete_entry))
        // Sleep entries
        .route("/api/sleep", get(handlers::sleep::list_entries))
        .route("/api/sleep", post(handlers::sleep::create_entry))
        .route("/api/sleep/stats", get(handlers::sleep::get_stats))
        .route("/api/sleep/insights", get(handlers::sleep::get_insights))
        .route("/api/sleep/:id", get(handlers::sleep::get_entry))
        .route("/api/sleep/:id", put(handlers::sleep::update_entry))
        .route("/api/sleep/:id", delete(handlers::sleep::delete_entry))
        // Stress entries
        .route("/api/stress", get(handlers::stress::list_entries))
        .route("/api/stress", post(handlers::stress::create_entry))
        .route("/api/stress/stats", get(handlers::stress::get_stats))
        .route("/api/stress/insights", get(handlers::stress::get_insights))
        .route("/api/stress/:id", get(handlers::stress::get_entry))
        .route("/api/stress/:id", put(handlers::stress::update_entry))
        .route("/api/stress/:id", delete(handlers::stress::delete_entry))
        // Affirmations
        .route(
            "/api/affirmations",
            get(handlers::affirmations::list_affirmations),
        )
        .route(
            "/api/affirmations",
            post(handlers::affirmations::create_affirmation),
        )
        .route(
            "/api/affirmations/random",
            get(handlers::affirmations::random_affirmation),
        )
        .route(
            "/api/affirmations/favorites/mine",
            get(handlers::affirmations::my_favorites),
        )
        .route(
            "/api/affirmations/:id",
            get(handlers::affirmations::get_affirmation),
        )
        .route(
            "/api/affirmations/:id",
            put(handlers::affirmations::update_affirmation),
        )
        .route(
            "/api/affirmations/:id",
            delete(handlers::affirmations::delete_affirmation),
        )
        .route(
            "/api/affirmations/:id/favorite",
            post(handlers::affirmations::favorite_affirmation),
        )
        .route(
            "/api/affirmations/:id/favorite",
            delete(handlers::affirmations::unfavorite_affirmation),
        )
        .route(
            "/api/affirmations/:id/rate",
            post(handlers::affirmations::rate_affirmation),
        )
        // Healing roadmap
        .route("/api/roadmap", get(handlers::roadmap::generate_roadmap))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = vec![config
            .frontend_url
            .parse::<axum::http::HeaderValue>()
            .expect("FRONTEND_URL must be a valid origin")];
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    // ConnectInfo provides the client IP for rate limiting
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .expect("Server error");
}
