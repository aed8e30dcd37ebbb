//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, DiskStorageAdapter, HttpSubscriptionAdapter},
    config::Config,
    error::ApiError,
    web::{
        admin, auth, catalog, load_viewer, progress, require_admin, require_auth, state::AppState,
        upload, ApiDoc,
    },
};
use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, patch, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool.clone()));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let subscription_adapter = Arc::new(
        HttpSubscriptionAdapter::new(
            config.subscription_check_url.clone(),
            config.subscription_timeout,
        )
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?,
    );
    let storage_adapter = Arc::new(DiskStorageAdapter::new(
        config.upload_dir.clone(),
        config.public_base_url.clone(),
    ));

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        auth: db_adapter.clone(),
        catalog: db_adapter.clone(),
        completions: db_adapter,
        subscription: subscription_adapter,
        storage: storage_adapter,
        config: config.clone(),
    });

    let cors = CorsLayer::new()
        .allow_origin(
            config
                .cors_origin
                .parse::<HeaderValue>()
                .map_err(|e| ApiError::Internal(format!("Invalid CORS_ORIGIN: {}", e)))?,
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 5. Create the Web Router ---
    // Public routes (no auth required)
    let auth_routes = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Learner surface: anonymous browsing is fine, the gate decides per
    // lesson. `load_viewer` attaches the optional identity.
    let learner_routes = Router::new()
        .route("/courses", get(catalog::list_courses_handler))
        .route("/courses/{slug}", get(catalog::course_detail_handler))
        .route(
            "/courses/{slug}/lessons/{lesson_slug}",
            get(catalog::lesson_view_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            load_viewer,
        ));

    // Progress mutation and resume require a signed-in user.
    let progress_routes = Router::new()
        .route("/continue", get(progress::continue_learning_handler))
        .route(
            "/lessons/{lesson_id}/completion",
            post(progress::mark_completed_handler).delete(progress::unmark_completed_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    // Authoring surface: allow-listed admins only, enforced server-side.
    let admin_routes = Router::new()
        .route("/admin/courses", post(admin::create_course_handler))
        .route(
            "/admin/courses/{course_id}",
            get(admin::admin_course_detail_handler)
                .patch(admin::update_course_handler)
                .delete(admin::delete_course_handler),
        )
        .route(
            "/admin/courses/{course_id}/chapters",
            post(admin::create_chapter_handler),
        )
        .route(
            "/admin/courses/{course_id}/chapters/order",
            put(admin::reorder_chapters_handler),
        )
        .route(
            "/admin/courses/{course_id}/lessons",
            post(admin::create_course_lesson_handler),
        )
        .route(
            "/admin/courses/{course_id}/lessons/order",
            put(admin::reorder_course_lessons_handler),
        )
        .route(
            "/admin/chapters/{chapter_id}",
            patch(admin::update_chapter_handler).delete(admin::delete_chapter_handler),
        )
        .route(
            "/admin/chapters/{chapter_id}/lessons",
            post(admin::create_chapter_lesson_handler),
        )
        .route(
            "/admin/chapters/{chapter_id}/lessons/order",
            put(admin::reorder_chapter_lessons_handler),
        )
        .route(
            "/admin/lessons/{lesson_id}",
            patch(admin::update_lesson_handler).delete(admin::delete_lesson_handler),
        )
        .route("/admin/uploads", post(upload::upload_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_admin,
        ));

    let api_router = Router::new()
        .merge(auth_routes)
        .merge(learner_routes)
        .merge(progress_routes)
        .merge(admin_routes)
        .layer(DefaultBodyLimit::max(6 * 1024 * 1024))
        .layer(cors)
        .with_state(app_state);

    // Uploaded posters are served straight from disk.
    let app = Router::new()
        .merge(api_router)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
