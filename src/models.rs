use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::auth::Role;

// --- Core Application Schemas (Mapped to Database) ---

/// UserRecord
///
/// The raw credential-store row from the `users` table, including the password hash
/// and the legacy `is_admin` flag. This struct never crosses the HTTP boundary: the
/// repository converts it to the public `User` via `into_public`, which is also the
/// single place where `is_admin` is reconciled into the canonical `Role` enum.
#[derive(Debug, Clone, FromRow, Default)]
pub struct UserRecord {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl UserRecord {
    /// Strips the credential material and folds `is_admin` into `Role`.
    pub fn into_public(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            role: Role::from_is_admin(self.is_admin),
        }
    }
}

/// User
///
/// The user's public identity as served to clients. Carries the canonical role and
/// never the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    // The RBAC field, already reconciled from the stored boolean.
    pub role: Role,
}

/// Track
///
/// A music track record from the `tracks` table. The audio and cover fields hold
/// S3 object keys produced by the presigned upload flow, not URLs.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Track {
    pub id: i32,
    // FK to categories.id, the mood this track is filed under.
    pub category_id: i32,
    pub title: String,
    pub artist: String,

    // S3 keys for media assets.
    pub audio_key: String,
    pub cover_key: Option<String>,

    pub duration_secs: i32,

    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Category
///
/// A mood category ("Happy", "Sad", "Focus", ...) from the `categories` table.
/// Tracks reference exactly one category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

/// Playlist
///
/// A user-owned playlist header from the `playlists` table. Track membership lives
/// in the `playlist_tracks` join table and is served via `PlaylistDetail`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Playlist {
    pub id: i32,
    // FK to users.id (Owner).
    pub user_id: i32,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// PlaylistDetail
///
/// A playlist enriched with its member tracks (a join at the repository layer).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PlaylistDetail {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub tracks: Vec<Track>,
}

/// Favorite
///
/// A single favorite record in the `favorites` table. Only used internally by the
/// repository for insertion and idempotency checks.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Favorite {
    // Composite PK component 1: the user who favorited.
    pub user_id: i32,
    // Composite PK component 2: the favorited track.
    pub track_id: i32,
}

/// UserLog
///
/// An activity record from the `user_logs` table, the audit sink's storage.
/// Appended fire-and-forget by handlers; read back only by the admin log view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct UserLog {
    pub id: i64,
    pub user_id: i32,
    // Short machine-readable action kind ("login", "favorite_add", ...).
    pub action: String,
    // Free-text detail for the admin view.
    pub details: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// FavoriteEntry
///
/// Flat joined row (favorites x users x tracks) used by the admin favorites view.
/// The handler groups these rows by user in memory before responding.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct FavoriteEntry {
    pub user_id: i32,
    pub username: String,
    pub track_id: i32,
    pub title: String,
    pub artist: String,
    pub cover_key: Option<String>,
}

/// TrackSummary
///
/// Compact track view used inside grouped responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TrackSummary {
    pub id: i32,
    pub title: String,
    pub artist: String,
    pub cover_key: Option<String>,
}

/// UserFavorites
///
/// One user's favorites, as grouped by the admin favorites endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserFavorites {
    pub user_id: i32,
    pub username: String,
    pub tracks: Vec<TrackSummary>,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /auth/register).
/// The password is hashed (argon2id) before it touches the database and is never
/// logged or persisted in clear text.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// LoginRequest
///
/// Input payload for POST /auth/login. `email` doubles as the seeded-admin
/// username when that identity is enabled in configuration.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// Output of a successful login: the signed token plus the resolved public identity.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// CreateTrackRequest
///
/// Input payload for the admin track-creation endpoint. The S3 keys are provided
/// here after the client completes the direct-to-cloud upload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTrackRequest {
    pub title: String,
    pub artist: String,
    pub category_id: i32,
    // S3 key resulting from the presigned upload flow.
    pub audio_key: String,
    pub cover_key: Option<String>,
    pub duration_secs: i32,
}

/// UpdateTrackRequest
///
/// Partial update payload for modifying an existing track (PUT /admin/tracks/{id}).
///
/// Uses `Option<T>` for all fields and `#[serde(skip_serializing_if = "Option::is_none")]`
/// to efficiently handle partial updates, ensuring only provided fields are included
/// in the JSON payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTrackRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<i32>,
}

/// CreateCategoryRequest
///
/// Input payload for the admin category-creation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

/// UpdateCategoryRequest
///
/// Partial update payload for a category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// CreatePlaylistRequest
///
/// Input payload for creating a playlist. Ownership comes from the session.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

/// UpdatePlaylistRequest
///
/// Partial update payload for renaming a playlist.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdatePlaylistRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// UpdateProfileRequest
///
/// Partial update payload for the authenticated user's own profile (PUT /me).
/// A provided password is re-hashed before storage.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// AssetKind
///
/// The two media asset families the upload pipeline accepts. Selects the key
/// prefix under which the object is stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum AssetKind {
    #[default]
    Audio,
    Cover,
}

impl AssetKind {
    pub fn key_prefix(self) -> &'static str {
        match self {
            AssetKind::Audio => "audio",
            AssetKind::Cover => "covers",
        }
    }
}

/// PresignedUploadRequest
///
/// Input payload for requesting a short-lived S3 upload URL (POST /upload/presigned).
/// The server uses these fields to set security constraints on the generated URL.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUploadRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "rainy_day.mp3")]
    pub filename: String,
    /// The MIME type, used to constrain the S3 upload to the allowed type (security).
    #[schema(example = "audio/mpeg")]
    pub file_type: String,
    /// Which asset family this upload belongs to (audio or cover art).
    pub kind: AssetKind,
}

/// PresignedUploadResponse
///
/// Output schema containing the secure, temporary URL for client-to-cloud file transfer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUploadResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The S3 object key where the file will be stored (referenced by track records).
    pub resource_key: String,
}

/// StreamUrlResponse
///
/// Output of GET /tracks/{id}/stream: a short-lived download URL for the audio asset.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct StreamUrlResponse {
    pub stream_url: String,
}

/// --- Dashboard Schemas (Output) ---

/// AdminDashboardStats
///
/// Output schema for the administrative statistics dashboard (GET /admin/stats).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub total_tracks: i64,
    pub total_playlists: i64,
    pub total_favorites: i64,
}
