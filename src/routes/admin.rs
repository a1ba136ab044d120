use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Admin Router Module
///
/// Defines the routes exclusively accessible to users with the admin role.
/// These endpoints provide catalog management, user moderation, and statistical
/// oversight.
///
/// Access Control:
/// This entire router is nested under '/admin' and wrapped in the
/// `require_admin` middleware layer, which authenticates the caller and then
/// explicitly checks the claim's role before any handler here can run. A valid
/// non-admin token is rejected with 403 at that layer; handlers never re-check.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/stats
        // Retrieves core dashboard metrics (total users, tracks, playlists, favorites).
        .route("/stats", get(handlers::get_admin_stats))
        // GET /admin/users
        // Lists ALL registered accounts (public views only, no credential material).
        .route("/users", get(handlers::get_admin_users))
        // DELETE /admin/users/{id}
        // Removes an account; dependent rows cascade at the database level.
        .route("/users/{id}", delete(handlers::delete_user))
        // POST /admin/tracks
        // Registers track metadata after the presigned asset upload completes.
        .route("/tracks", post(handlers::create_track))
        // PUT/DELETE /admin/tracks/{id}
        // Catalog maintenance: partial metadata update and removal.
        .route(
            "/tracks/{id}",
            put(handlers::update_track).delete(handlers::delete_track),
        )
        // POST /admin/categories
        // Creates a new mood category for the browse screen.
        .route("/categories", post(handlers::create_category))
        // PUT/DELETE /admin/categories/{id}
        // Category maintenance. Deletion is refused while tracks still reference it.
        .route(
            "/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        // GET /admin/favorites
        // Every favorite in the system, grouped per user in the handler.
        .route("/favorites", get(handlers::get_grouped_favorites))
        // GET /admin/logs?limit=...
        // The activity log written by the audit sink, newest first.
        .route("/logs", get(handlers::get_admin_logs))
}
