//! Application state and router builder
//!
//! # Example
//!
//! ```no_run
//! use rentshield_api::{app::{build_router, AppState}, config::Config};
//! use rentshield_shared::store::{memory::MemoryStore, SharedStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store: SharedStore = Arc::new(MemoryStore::new());
//! let state = AppState::new(store, Config::in_memory());
//! let app = build_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    config::Config,
    middleware::{security::SecurityHeadersLayer, session::session_auth_layer},
    routes,
};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, patch, post},
    Router,
};
use rentshield_shared::{
    services::{
        identity::IdentityService,
        photos::{PhotoIntake, ReferencePhotoIntake},
        reviews::ReviewEngine,
        sessions::SessionManager,
        tasks::TaskEngine,
    },
    store::SharedStore,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Largest accepted photo upload request
const PHOTO_BODY_LIMIT: usize = 25 * 1024 * 1024;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Every
/// field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub sessions: SessionManager,
    pub identity: IdentityService,
    pub tasks: TaskEngine,
    pub reviews: ReviewEngine,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the engines over `store` with reference-only photo intake
    pub fn new(store: SharedStore, config: Config) -> Self {
        Self::with_photo_intake(store, config, Arc::new(ReferencePhotoIntake))
    }

    pub fn with_photo_intake(
        store: SharedStore,
        config: Config,
        photos: Arc<dyn PhotoIntake>,
    ) -> Self {
        let sessions = SessionManager::new(store.clone());
        let identity = IdentityService::new(store.clone(), sessions.clone());
        let lookup = Arc::new(identity.clone());

        Self {
            tasks: TaskEngine::new(store.clone(), lookup.clone()),
            reviews: ReviewEngine::new(store.clone(), lookup, photos),
            store,
            sessions,
            identity,
            config: Arc::new(config),
        }
    }

    /// Whether cookies must carry the `Secure` attribute
    pub fn secure_cookies(&self) -> bool {
        self.config.api.production
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                           # Health check (public)
/// └── /v1/
///     ├── /auth/                        # public; /me resolves optionally
///     │   ├── POST /login
///     │   ├── POST /logout
///     │   └── GET  /me
///     └── (session required)
///         ├── GET/POST  /users, GET /users/:id, PATCH /users/:id/status
///         ├── GET       /stats
///         ├── GET/POST  /tasks, GET /tasks/:id
///         ├── GET/POST  /submissions, PATCH /submissions/:id
///         ├── GET/POST  /property-reviews, GET /property-reviews/:id
///         ├── POST      /property-reviews/:id/{photos,tenant-photos,verdict}
///         └── GET       /vouchers
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Security headers
/// 2. CORS
/// 3. Logging (tower-http TraceLayer)
/// 4. Session authentication (protected routes only)
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/me", get(routes::auth::me));

    let review_routes = Router::new()
        .route(
            "/",
            get(routes::property_reviews::list_reviews).post(routes::property_reviews::create_review),
        )
        .route("/:id", get(routes::property_reviews::get_review))
        .route(
            "/:id/photos",
            post(routes::property_reviews::upload_landlord_photos),
        )
        .route(
            "/:id/tenant-photos",
            post(routes::property_reviews::upload_tenant_photos),
        )
        .route("/:id/verdict", post(routes::property_reviews::render_verdict))
        .layer(DefaultBodyLimit::max(PHOTO_BODY_LIMIT));

    let protected_routes = Router::new()
        .route(
            "/users",
            get(routes::users::list_users).post(routes::users::create_user),
        )
        .route("/users/:id", get(routes::users::get_user))
        .route("/users/:id/status", patch(routes::users::set_user_status))
        .route("/stats", get(routes::stats::dashboard_stats))
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/:id", get(routes::tasks::get_task))
        .route(
            "/submissions",
            get(routes::submissions::list_submissions).post(routes::submissions::create_submission),
        )
        .route(
            "/submissions/:id",
            patch(routes::submissions::decide_submission),
        )
        .nest("/property-reviews", review_routes)
        .route("/vouchers", get(routes::vouchers::list_vouchers))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        // Session cookies need credentialed CORS
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}
