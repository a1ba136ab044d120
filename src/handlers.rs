use crate::{
    AppState,
    auth::{AuthUser, Role, SEED_ADMIN_ID},
    error::ApiError,
    models::{
        self, AdminDashboardStats, Category, CreateCategoryRequest, CreatePlaylistRequest,
        CreateTrackRequest, Favorite, LoginRequest, LoginResponse, Playlist, PlaylistDetail,
        PresignedUploadRequest, PresignedUploadResponse, RegisterRequest, StreamUrlResponse,
        Track, TrackSummary, UpdateCategoryRequest, UpdatePlaylistRequest, UpdateProfileRequest,
        UpdateTrackRequest, User, UserFavorites, UserLog,
    },
    passwords,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

// --- Filter Structs ---

/// TrackFilter
///
/// Defines the accepted query parameters for the public track listing endpoint
/// (GET /tracks). Used by Axum's Query extractor to safely bind HTTP query
/// parameters for mood filtering and search.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct TrackFilter {
    /// Optional filter for tracks in a specific mood category.
    pub category: Option<i32>,
    /// Optional search string matched against track title and artist.
    pub search: Option<String>,
}

/// LogFilter
///
/// Query parameters for the admin activity-log view.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LogFilter {
    /// Maximum number of log rows to return (newest first). Defaults to 100.
    pub limit: Option<i64>,
}

// --- Auth Handlers ---

/// register_user
///
/// [Public Route] Creates a new user account. The password is hashed with Argon2id
/// before it touches the database; the clear text is never persisted or logged.
/// All self-registered accounts get the `user` role; elevation never happens
/// through this endpoint.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 409, description = "Email or username taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let password_hash = passwords::hash_password(&payload.password)?;

    let record = state
        .repo
        .create_user(&payload.username, &payload.email, &password_hash)
        .await
        .ok_or_else(|| ApiError::Conflict("email or username already registered".to_string()))?;

    let user = record.into_public();
    state
        .audit
        .append(user.id, "register", format!("registered as {}", user.email))
        .await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// login
///
/// [Public Route] Authenticates a user and issues a signed token.
///
/// Two paths exist:
/// 1. **Seeded admin**: when enabled in configuration, credentials matching the
///    configured pair bypass the credential store entirely and yield a token with
///    subject id 0, the admin role, and the shorter 24-hour session window.
/// 2. **Regular**: email lookup + Argon2 verification, then a token carrying the
///    record's id and reconciled role with the default 7-day TTL.
///
/// Failed credential checks answer 400 "Invalid credentials", deliberately distinct
/// from the middleware's 401s, and identical for unknown email vs. wrong password.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    // 1. Seeded admin path (configuration-gated).
    if let Some(seed) = &state.config.seed_admin {
        if payload.email == seed.username && payload.password == seed.password {
            let ttl = Duration::from_secs(state.config.session_ttl_hours * 3600);
            let token = state
                .codec
                .issue(SEED_ADMIN_ID, &seed.username, Role::Admin, ttl)?;

            state
                .audit
                .append(SEED_ADMIN_ID, "login", "seeded admin session".to_string())
                .await;

            return Ok(Json(LoginResponse {
                token,
                user: User {
                    id: SEED_ADMIN_ID,
                    username: seed.username.clone(),
                    email: seed.username.clone(),
                    role: Role::Admin,
                },
            }));
        }
    }

    // 2. Regular path: resolve against the credential store.
    let record = state
        .repo
        .find_user_by_email(&payload.email)
        .await
        .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;

    if !passwords::verify_password(&payload.password, &record.password_hash) {
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    }

    let user = record.into_public();
    let ttl = Duration::from_secs(state.config.token_ttl_hours * 3600);
    let token = state.codec.issue(user.id, &user.username, user.role, ttl)?;

    // Fire-and-forget: a sink failure never blocks the login.
    state
        .audit
        .append(user.id, "login", format!("login from {}", user.email))
        .await;

    Ok(Json(LoginResponse { token, user }))
}

/// get_me
///
/// [Authenticated Route] Provides the authenticated user's profile information,
/// re-resolved against the credential store so a freshly-changed profile shows up
/// even while an older token is in flight. The seeded admin is never persisted and
/// resolves from its claim alone.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 404, description = "Account no longer exists")
    )
)]
pub async fn get_me(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    if auth_user.id == SEED_ADMIN_ID {
        return Ok(Json(User {
            id: SEED_ADMIN_ID,
            username: auth_user.username.clone(),
            email: auth_user.username,
            role: Role::Admin,
        }));
    }

    match state.repo.find_user_by_id(auth_user.id).await {
        Some(record) => Ok(Json(record.into_public())),
        // Token is valid but the account was deleted after issuance.
        None => Err(ApiError::NotFound),
    }
}

/// update_me
///
/// [Authenticated Route] Partial update of the caller's own profile. A provided
/// password is re-hashed; omitted fields are left untouched (COALESCE in the
/// repository). The seeded admin has no stored profile to update.
#[utoipa::path(
    put,
    path = "/me",
    request_body = UpdateProfileRequest,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_me(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    if user_id == SEED_ADMIN_ID {
        return Err(ApiError::BadRequest(
            "seeded admin has no stored profile".to_string(),
        ));
    }

    let password_hash = match payload.password {
        Some(ref pw) => Some(passwords::hash_password(pw)?),
        None => None,
    };

    match state
        .repo
        .update_user(user_id, payload.username, payload.email, password_hash)
        .await
    {
        Some(record) => Ok(Json(record.into_public())),
        None => Err(ApiError::NotFound),
    }
}

// --- Catalog Handlers ---

/// get_categories
///
/// [Public Route] Lists all mood categories for the browse screen.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Mood categories", body = [Category]))
)]
pub async fn get_categories(State(state): State<AppState>) -> Json<Vec<models::Category>> {
    let categories = state.repo.get_categories().await;
    Json(categories)
}

/// get_tracks
///
/// [Public Route] Lists tracks with mood filtering and search. All filtering is
/// parameterized at the repository layer; no SQL is built from raw input.
#[utoipa::path(
    get,
    path = "/tracks",
    params(TrackFilter),
    responses((status = 200, description = "List filtered tracks", body = [Track]))
)]
pub async fn get_tracks(
    State(state): State<AppState>,
    Query(filter): Query<TrackFilter>,
) -> Json<Vec<models::Track>> {
    let tracks = state.repo.get_tracks(filter.category, filter.search).await;
    Json(tracks)
}

/// get_track_details
///
/// [Public Route] Retrieves a single track's metadata by ID.
#[utoipa::path(
    get,
    path = "/tracks/{id}",
    params(("id" = i32, Path, description = "Track ID")),
    responses((status = 200, description = "Found", body = Track))
)]
pub async fn get_track_details(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<models::Track>, ApiError> {
    match state.repo.get_track(id).await {
        Some(track) => Ok(Json(track)),
        None => Err(ApiError::NotFound),
    }
}

/// get_trending_tracks
///
/// [Public Route] Retrieves a small list of the most-favorited tracks.
/// The `limit` (10) is hardcoded in the repository call.
#[utoipa::path(
    get,
    path = "/tracks/trending",
    responses((status = 200, description = "Top tracks", body = [Track]))
)]
pub async fn get_trending_tracks(State(state): State<AppState>) -> Json<Vec<models::Track>> {
    let trending = state.repo.get_trending_tracks(10).await;
    Json(trending)
}

/// stream_track
///
/// [Authenticated Route] Returns a short-lived presigned GET URL for the track's
/// audio object. The media bytes flow directly from object storage to the client;
/// this server only signs the URL.
#[utoipa::path(
    get,
    path = "/tracks/{id}/stream",
    params(("id" = i32, Path, description = "Track ID")),
    responses((status = 200, description = "Stream URL", body = StreamUrlResponse))
)]
pub async fn stream_track(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<StreamUrlResponse>, ApiError> {
    let track = state.repo.get_track(id).await.ok_or(ApiError::NotFound)?;

    let url = state
        .storage
        .presigned_download_url(&track.audio_key)
        .await
        .map_err(|e| {
            tracing::error!("stream presign failed: {}", e);
            ApiError::Internal
        })?;

    state
        .audit
        .append(user_id, "stream", format!("track {} ({})", track.id, track.title))
        .await;

    Ok(Json(StreamUrlResponse { stream_url: url }))
}

// --- Playlist Handlers ---

/// get_my_playlists
///
/// [Authenticated Route] Lists all playlists owned by the requesting user.
#[utoipa::path(
    get,
    path = "/playlists",
    responses((status = 200, description = "My Playlists", body = [Playlist]))
)]
pub async fn get_my_playlists(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::Playlist>> {
    let playlists = state.repo.get_my_playlists(id).await;
    Json(playlists)
}

/// create_playlist
///
/// [Authenticated Route] Creates a playlist owned by the session user.
#[utoipa::path(
    post,
    path = "/playlists",
    request_body = CreatePlaylistRequest,
    responses((status = 201, description = "Created", body = Playlist))
)]
pub async fn create_playlist(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<models::Playlist>), ApiError> {
    let playlist = state
        .repo
        .create_playlist(user_id, &payload.name)
        .await
        .ok_or(ApiError::Internal)?;

    state
        .audit
        .append(user_id, "playlist_create", format!("playlist '{}'", playlist.name))
        .await;

    Ok((StatusCode::CREATED, Json(playlist)))
}

/// get_playlist
///
/// [Authenticated Route] Retrieves one of the caller's playlists with its member
/// tracks. **Owner-Only**: another user's playlist id yields 404, not 403, so ids
/// are not probeable.
#[utoipa::path(
    get,
    path = "/playlists/{id}",
    params(("id" = i32, Path, description = "Playlist ID")),
    responses((status = 200, description = "Playlist with tracks", body = PlaylistDetail))
)]
pub async fn get_playlist(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<models::PlaylistDetail>, ApiError> {
    match state.repo.get_playlist_detail(id, user_id).await {
        Some(detail) => Ok(Json(detail)),
        None => Err(ApiError::NotFound),
    }
}

/// update_playlist
///
/// [Authenticated Route] Renames one of the caller's playlists.
///
/// *Authorization*: Enforces the **Owner-Only** check in the repository layer.
#[utoipa::path(
    put,
    path = "/playlists/{id}",
    request_body = UpdatePlaylistRequest,
    responses((status = 200, description = "Updated", body = Playlist))
)]
pub async fn update_playlist(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePlaylistRequest>,
) -> Result<Json<models::Playlist>, ApiError> {
    match state.repo.rename_playlist(id, user_id, payload.name).await {
        Some(playlist) => Ok(Json(playlist)),
        // 404 covers both "missing" and "not the owner".
        None => Err(ApiError::NotFound),
    }
}

/// delete_playlist
///
/// [Authenticated Route] Deletes one of the caller's playlists.
#[utoipa::path(
    delete,
    path = "/playlists/{id}",
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_playlist(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_playlist(id, user_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// add_playlist_track
///
/// [Authenticated Route] Adds a track to one of the caller's playlists.
///
/// *Idempotency*: the composite primary key on `playlist_tracks` makes re-adding a
/// no-op; the repository reports it as a conflict, mapped to 409 here.
#[utoipa::path(
    post,
    path = "/playlists/{id}/tracks/{track_id}",
    params(
        ("id" = i32, Path, description = "Playlist ID"),
        ("track_id" = i32, Path, description = "Track ID")
    ),
    responses(
        (status = 200, description = "Added"),
        (status = 409, description = "Already present or playlist not yours")
    )
)]
pub async fn add_playlist_track(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path((id, track_id)): Path<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    if state.repo.add_playlist_track(id, user_id, track_id).await {
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::Conflict(
            "track already in playlist or playlist not found".to_string(),
        ))
    }
}

/// remove_playlist_track
///
/// [Authenticated Route] Removes a track from one of the caller's playlists.
#[utoipa::path(
    delete,
    path = "/playlists/{id}/tracks/{track_id}",
    params(
        ("id" = i32, Path, description = "Playlist ID"),
        ("track_id" = i32, Path, description = "Track ID")
    ),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn remove_playlist_track(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path((id, track_id)): Path<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    if state
        .repo
        .remove_playlist_track(id, user_id, track_id)
        .await
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Favorite Handlers ---

/// add_favorite
///
/// [Authenticated Route] Records the user's favorite for a track.
///
/// *Idempotency*: the composite primary key on `favorites` enforces the
/// one-favorite-per-user-per-track rule, returning 409 Conflict if violated.
#[utoipa::path(
    post,
    path = "/tracks/{id}/favorite",
    params(("id" = i32, Path, description = "Track ID")),
    responses(
        (status = 200, description = "Favorited"),
        (status = 409, description = "Duplicate")
    )
)]
pub async fn add_favorite(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let fav = Favorite { user_id: id, track_id };

    if state.repo.add_favorite(fav).await {
        state
            .audit
            .append(id, "favorite_add", format!("track {}", track_id))
            .await;
        Ok(StatusCode::OK)
    } else {
        Err(ApiError::Conflict("already favorited".to_string()))
    }
}

/// remove_favorite
///
/// [Authenticated Route] Removes the user's favorite from a track.
#[utoipa::path(
    delete,
    path = "/tracks/{id}/favorite",
    params(("id" = i32, Path, description = "Track ID")),
    responses(
        (status = 204, description = "Removed"),
        (status = 404, description = "Was not favorited")
    )
)]
pub async fn remove_favorite(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(track_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let fav = Favorite { user_id: id, track_id };

    if state.repo.remove_favorite(fav).await {
        state
            .audit
            .append(id, "favorite_remove", format!("track {}", track_id))
            .await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// get_my_favorites
///
/// [Authenticated Route] Lists the caller's favorited tracks.
#[utoipa::path(
    get,
    path = "/me/favorites",
    responses((status = 200, description = "My Favorites", body = [Track]))
)]
pub async fn get_my_favorites(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Json<Vec<models::Track>> {
    let tracks = state.repo.get_my_favorites(id).await;
    Json(tracks)
}

// --- Upload Handler ---

/// get_presigned_upload
///
/// [Authenticated Route] Generates a temporary, secure URL for direct client-to-cloud
/// upload of an audio file or cover image.
///
/// *Security*: The URL is short-lived (10 minutes), constrained to the specified
/// `file_type`, and uses a unique object key (UUID) under the asset-kind prefix, so
/// uploads can never overwrite each other or escape their directory.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUploadRequest,
    responses((status = 200, description = "URL", body = PresignedUploadResponse))
)]
pub async fn get_presigned_upload(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUploadRequest>,
) -> Result<Json<PresignedUploadResponse>, ApiError> {
    // Generate a unique, structured object key (e.g., 'audio/UUID.mp3').
    let extension = std::path::Path::new(&payload.filename)
        .extension()
        .and_then(std::ffi::OsStr::to_str)
        .unwrap_or("bin");
    let unique_id = Uuid::new_v4();
    let object_key = format!("{}/{}.{}", payload.kind.key_prefix(), unique_id, extension);

    let url = state
        .storage
        .presigned_upload_url(&object_key, &payload.file_type)
        .await
        .map_err(|e| {
            // Log the underlying storage error for debugging but return a generic internal error.
            tracing::error!("upload presign failed: {}", e);
            ApiError::Internal
        })?;

    state
        .audit
        .append(user_id, "upload_request", object_key.clone())
        .await;

    Ok(Json(PresignedUploadResponse {
        upload_url: url,
        resource_key: object_key,
    }))
}

// --- Admin Handlers ---
// Role enforcement happens in the `require_admin` middleware wrapping the /admin
// router; these handlers only implement the operation itself.

/// get_admin_stats
///
/// [Admin Route] Retrieves core application statistics for the dashboard.
#[utoipa::path(
    get,
    path = "/admin/stats",
    responses((status = 200, description = "Stats", body = AdminDashboardStats))
)]
pub async fn get_admin_stats(State(state): State<AppState>) -> Json<AdminDashboardStats> {
    Json(state.repo.get_stats().await)
}

/// get_admin_users
///
/// [Admin Route] Lists all registered users (public view, no credential material).
#[utoipa::path(
    get,
    path = "/admin/users",
    responses((status = 200, description = "All users", body = [User]))
)]
pub async fn get_admin_users(State(state): State<AppState>) -> Json<Vec<User>> {
    let users = state
        .repo
        .list_users()
        .await
        .into_iter()
        .map(|record| record.into_public())
        .collect();
    Json(users)
}

/// delete_user
///
/// [Admin Route] Removes a user account. Their playlists, favorites and logs go
/// with it via FK cascade.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    AuthUser { id: admin_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_user(id).await {
        state
            .audit
            .append(admin_id, "user_delete", format!("user {}", id))
            .await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// create_track
///
/// [Admin Route] Registers a track's metadata after its assets were uploaded via
/// the presigned flow.
#[utoipa::path(
    post,
    path = "/admin/tracks",
    request_body = CreateTrackRequest,
    responses((status = 201, description = "Created", body = Track))
)]
pub async fn create_track(
    AuthUser { id: admin_id, .. }: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTrackRequest>,
) -> Result<(StatusCode, Json<models::Track>), ApiError> {
    let track = state
        .repo
        .create_track(payload)
        .await
        // Creation only fails on a bad category reference or a database fault.
        .ok_or_else(|| ApiError::BadRequest("invalid track payload".to_string()))?;

    state
        .audit
        .append(admin_id, "track_create", format!("track {} ({})", track.id, track.title))
        .await;

    Ok((StatusCode::CREATED, Json(track)))
}

/// update_track
///
/// [Admin Route] Partial update of track metadata (COALESCE in the repository).
#[utoipa::path(
    put,
    path = "/admin/tracks/{id}",
    request_body = UpdateTrackRequest,
    responses((status = 200, description = "Updated", body = Track))
)]
pub async fn update_track(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTrackRequest>,
) -> Result<Json<models::Track>, ApiError> {
    match state.repo.update_track(id, payload).await {
        Some(track) => Ok(Json(track)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_track
///
/// [Admin Route] Removes a track from the catalog.
#[utoipa::path(
    delete,
    path = "/admin/tracks/{id}",
    params(("id" = i32, Path, description = "Track ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_track(
    AuthUser { id: admin_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_track(id).await {
        state
            .audit
            .append(admin_id, "track_delete", format!("track {}", id))
            .await;
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// create_category
///
/// [Admin Route] Creates a new mood category.
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CreateCategoryRequest,
    responses((status = 201, description = "Created", body = Category))
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<models::Category>), ApiError> {
    let category = state
        .repo
        .create_category(payload)
        .await
        .ok_or_else(|| ApiError::Conflict("category already exists".to_string()))?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route] Partial update of a mood category.
#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    request_body = UpdateCategoryRequest,
    responses((status = 200, description = "Updated", body = Category))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> Result<Json<models::Category>, ApiError> {
    match state.repo.update_category(id, payload).await {
        Some(category) => Ok(Json(category)),
        None => Err(ApiError::NotFound),
    }
}

/// delete_category
///
/// [Admin Route] Removes a mood category. Refused while tracks still reference it.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found or still referenced")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if state.repo.delete_category(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// get_grouped_favorites
///
/// [Admin Route] All favorites in the system, grouped per user.
///
/// The repository returns flat joined rows ordered by user; the grouping into
/// per-user buckets happens here, in memory, preserving that order.
#[utoipa::path(
    get,
    path = "/admin/favorites",
    responses((status = 200, description = "Favorites grouped by user", body = [UserFavorites]))
)]
pub async fn get_grouped_favorites(State(state): State<AppState>) -> Json<Vec<UserFavorites>> {
    let rows = state.repo.get_all_favorites().await;

    let mut grouped: Vec<UserFavorites> = Vec::new();
    for row in rows {
        let summary = TrackSummary {
            id: row.track_id,
            title: row.title,
            artist: row.artist,
            cover_key: row.cover_key,
        };
        match grouped.last_mut() {
            // Rows arrive ordered by user_id, so each user occupies one contiguous run.
            Some(bucket) if bucket.user_id == row.user_id => bucket.tracks.push(summary),
            _ => grouped.push(UserFavorites {
                user_id: row.user_id,
                username: row.username,
                tracks: vec![summary],
            }),
        }
    }

    Json(grouped)
}

/// get_admin_logs
///
/// [Admin Route] The activity log (audit sink read view), newest first.
#[utoipa::path(
    get,
    path = "/admin/logs",
    params(LogFilter),
    responses((status = 200, description = "Activity log", body = [UserLog]))
)]
pub async fn get_admin_logs(
    State(state): State<AppState>,
    Query(filter): Query<LogFilter>,
) -> Json<Vec<models::UserLog>> {
    let logs = state.repo.get_user_logs(filter.limit.unwrap_or(100)).await;
    Json(logs)
}
