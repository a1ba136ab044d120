use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has successfully passed the
/// authentication layer. This module implements all core listener features:
/// profile, playlists, favorites, streaming, and media upload.
///
/// Access Control Strategy:
/// Every handler in this module relies on the `require_auth` middleware being
/// present on the router layer above it. Handlers additionally receive the
/// `AuthUser` extractor, which carries the verified claim used for all
/// Owner-Only authorization checks (e.g., in `update_playlist` and
/// `delete_playlist`).
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PUT /me
        // The authenticated user's own profile: read (re-resolved against the
        // credential store) and partial update.
        .route("/me", get(handlers::get_me).put(handlers::update_me))
        // GET /me/favorites
        // Lists the tracks the user has favorited.
        .route("/me/favorites", get(handlers::get_my_favorites))
        // POST /upload/presigned
        // Initiates the secure media upload pipeline. Generates a short-lived
        // (10-minute) presigned S3 URL which allows the client to upload audio or
        // cover art directly to the storage service, bypassing the application server.
        .route("/upload/presigned", post(handlers::get_presigned_upload))
        // GET /tracks/{id}/stream
        // Returns a short-lived presigned download URL for the track's audio asset.
        .route("/tracks/{id}/stream", get(handlers::stream_track))
        // --- Favorites ---
        // POST/DELETE /tracks/{id}/favorite
        // Marks or unmarks a track as a favorite. The composite primary key on
        // `favorites` enforces **idempotency** (one favorite per user per track).
        .route(
            "/tracks/{id}/favorite",
            post(handlers::add_favorite).delete(handlers::remove_favorite),
        )
        // --- Playlists ---
        // GET/POST /playlists
        // Lists the user's playlists / creates a new one owned by the session user.
        .route(
            "/playlists",
            get(handlers::get_my_playlists).post(handlers::create_playlist),
        )
        // GET/PUT/DELETE /playlists/{id}
        // Detail view (with member tracks), rename, and removal.
        // **Strict ownership check** is enforced at the repository layer.
        .route(
            "/playlists/{id}",
            get(handlers::get_playlist)
                .put(handlers::update_playlist)
                .delete(handlers::delete_playlist),
        )
        // POST/DELETE /playlists/{id}/tracks/{track_id}
        // Adds or removes a track from a playlist the user owns. Adding is
        // idempotent via the composite primary key on `playlist_tracks`.
        .route(
            "/playlists/{id}/tracks/{track_id}",
            post(handlers::add_playlist_track).delete(handlers::remove_playlist_track),
        )
}
