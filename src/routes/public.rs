use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any client
/// (anonymous or logged-in). These routes handle the browse surface of the mobile
/// app (mood categories and the track catalog) plus the identity gateway
/// (registration and login).
///
/// Security Mandate:
/// Nothing here may expose credential material or per-user data. The login and
/// register handlers are the only writers, and both answer with public `User`
/// views only.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // A simple, unauthenticated endpoint used for monitoring and load balancer checks.
        // Returns "ok" immediately to verify the service is running and responsive.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/register
        // Creates a new account with the 'user' role. Passwords are Argon2id-hashed
        // in the handler before persistence.
        .route("/auth/register", post(handlers::register_user))
        // POST /auth/login
        // Verifies credentials and issues the signed session token. Also hosts the
        // configuration-gated seeded-admin path.
        .route("/auth/login", post(handlers::login))
        // GET /categories
        // Lists the mood categories that drive the app's browse screen.
        .route("/categories", get(handlers::get_categories))
        // GET /tracks?category=...&search=...
        // Lists tracks, filterable by mood category and title/artist search.
        .route("/tracks", get(handlers::get_tracks))
        // GET /tracks/trending
        // Retrieves the top 10 tracks ranked by current favorite count.
        .route("/tracks/trending", get(handlers::get_trending_tracks))
        // GET /tracks/{id}
        // Retrieves a single track's metadata (keys, not media bytes).
        .route("/tracks/{id}", get(handlers::get_track_details))
}
