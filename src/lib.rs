use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod passwords;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated, Admin).
pub mod routes;
use auth::{TokenCodec, require_admin, require_auth};
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

// Makes core state types easily accessible to the main application entry point (main.rs).
pub use audit::{AuditState, MockAuditSink, PostgresAuditSink};
pub use config::AppConfig;
pub use repository::{PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// This struct auto-generates the OpenAPI documentation (Swagger JSON) for the application.
/// It aggregates all API paths and data schemas that have been decorated with
/// the `#[utoipa::path]` and `#[derive(utoipa::ToSchema)]` macros.
/// The resulting JSON is served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    // List all public handler functions here for documentation generation.
    paths(
        handlers::register_user, handlers::login, handlers::get_me, handlers::update_me,
        handlers::get_categories, handlers::get_tracks, handlers::get_track_details,
        handlers::get_trending_tracks, handlers::stream_track,
        handlers::get_my_playlists, handlers::create_playlist, handlers::get_playlist,
        handlers::update_playlist, handlers::delete_playlist,
        handlers::add_playlist_track, handlers::remove_playlist_track,
        handlers::add_favorite, handlers::remove_favorite, handlers::get_my_favorites,
        handlers::get_presigned_upload,
        handlers::get_admin_stats, handlers::get_admin_users, handlers::delete_user,
        handlers::create_track, handlers::update_track, handlers::delete_track,
        handlers::create_category, handlers::update_category, handlers::delete_category,
        handlers::get_grouped_favorites, handlers::get_admin_logs
    ),
    // List all models (schemas) used in the request/response bodies.
    components(
        schemas(
            models::User, models::Track, models::Category, models::Playlist,
            models::PlaylistDetail, models::Favorite, models::UserLog,
            models::TrackSummary, models::UserFavorites,
            models::RegisterRequest, models::LoginRequest, models::LoginResponse,
            models::CreateTrackRequest, models::UpdateTrackRequest,
            models::CreateCategoryRequest, models::UpdateCategoryRequest,
            models::CreatePlaylistRequest, models::UpdatePlaylistRequest,
            models::UpdateProfileRequest, models::AssetKind,
            models::PresignedUploadRequest, models::PresignedUploadResponse,
            models::StreamUrlResponse, models::AdminDashboardStats,
            auth::Role,
        )
    ),
    tags(
        (name = "moodtunes", description = "Mood-based music streaming API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Implements the **Unified State Pattern**. This is the single, thread-safe, and immutable
/// container holding all essential application services and configuration.
/// The application state is shared across all incoming requests.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: Abstracts database access via the PgPool connection.
    /// Doubles as the Credential Store consumed by the login path.
    pub repo: RepositoryState,
    /// Storage Layer: Abstracts S3/MinIO access and presigned URL generation.
    pub storage: StorageState,
    /// Audit Sink: fire-and-forget activity log writes.
    pub audit: AuditState,
    /// Token Codec: issues and verifies the signed session tokens.
    pub codec: TokenCodec,
    /// Configuration: The loaded, immutable environment configuration.
    pub config: AppConfig,
}

impl AppState {
    /// Assembles the state, deriving the codec from the configured secret so the
    /// two can never disagree.
    pub fn new(
        repo: RepositoryState,
        storage: StorageState,
        audit: AuditState,
        config: AppConfig,
    ) -> Self {
        let codec = TokenCodec::new(config.jwt_secret.clone());
        Self {
            repo,
            storage,
            audit,
            codec,
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

// These implementations allow handlers and extractors to selectively pull components
// from the shared AppState. This is critical for dependency injection and keeping the
// authorization layer decoupled from the rest of the state.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AuditState {
    fn from_ref(app_state: &AppState) -> AuditState {
        app_state.audit.clone()
    }
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(app_state: &AppState) -> TokenCodec {
        app_state.codec.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the application's entire routing structure, applies global and scoped
/// middleware, and registers the application state. The three router groups map
/// one-to-one onto the authorization chain: anonymous, token-bearing, admin.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        // Documentation: Serve the auto-generated Swagger UI.
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public Routes: No middleware applied.
        .merge(public::public_routes())
        // Authenticated Routes: Protected by the `require_auth` layer.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_auth,
            )),
        )
        // Admin Routes: Nested under '/admin' and protected by the `require_admin`
        // layer, which runs the full chain (extract, verify, role check) before any
        // admin handler executes.
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_admin,
            )),
        )
        // Apply the Unified State to all routes.
        .with_state(state);

    // 3. Observability and Correlation Layers (Applied outermost/first)
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. Request ID Generation: Generates a unique UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. Request Tracing: Wraps the entire request/response lifecycle in a tracing span.
                // Uses the `trace_span_logger` to include the generated request ID.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Request ID Propagation: Ensures the generated x-request-id header is
                // returned to the client and injected into subsequent service calls.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer (Applied last, allowing all traffic in/out after processing)
        .layer(cors)
}

/// trace_span_logger
///
/// Helper function used by `TraceLayer` to customize the tracing span creation.
/// It extracts the `x-request-id` header (if present) and includes it in the
/// structured logging metadata alongside the HTTP method and URI.
///
/// *Goal*: Ensure every log line for a single request is correlated by a unique ID.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    // The structured log format used by the tracing macros.
    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
