use crate::models::{
    AdminDashboardStats, Category, CreateCategoryRequest, CreateTrackRequest, FavoriteEntry,
    Favorite, Playlist, PlaylistDetail, Track, UpdateCategoryRequest, UpdateTrackRequest, UserLog,
    UserRecord,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations. This is the core
/// of the Repository Abstraction pattern, allowing the handlers to interact with
/// the data layer without knowing the specific implementation (Postgres, Mock, etc.).
/// It also doubles as the Credential Store boundary: `find_user_by_email`,
/// `find_user_by_id` and `create_user` are the only operations the login and
/// registration paths consume.
///
/// **Send + Sync + async_trait** are required to make the trait object (`Arc<dyn Repository>`)
/// safely shareable and usable across Axum's asynchronous task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Credential Store ---
    // Consulted only at login/registration time and by the profile endpoint;
    // authorized requests carry their claim in the token instead.
    async fn find_user_by_email(&self, email: &str) -> Option<UserRecord>;
    async fn find_user_by_id(&self, id: i32) -> Option<UserRecord>;
    // Returns None on conflict (duplicate email/username) or database error.
    async fn create_user(&self, username: &str, email: &str, password_hash: &str)
    -> Option<UserRecord>;
    // Partial profile update via COALESCE; None if the user does not exist.
    async fn update_user(
        &self,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> Option<UserRecord>;
    async fn list_users(&self) -> Vec<UserRecord>;
    // Admin action. Cascades to playlists/favorites/logs via FK constraints.
    async fn delete_user(&self, id: i32) -> bool;

    // --- Track Catalog ---
    // Public listing with mood/search filtering.
    async fn get_tracks(&self, category: Option<i32>, search: Option<String>) -> Vec<Track>;
    async fn get_track(&self, id: i32) -> Option<Track>;
    // Retrieves top tracks ranked by favorite count.
    async fn get_trending_tracks(&self, limit: i64) -> Vec<Track>;
    async fn create_track(&self, req: CreateTrackRequest) -> Option<Track>;
    // Uses COALESCE for partial updates.
    async fn update_track(&self, id: i32, req: UpdateTrackRequest) -> Option<Track>;
    async fn delete_track(&self, id: i32) -> bool;

    // --- Mood Categories ---
    async fn get_categories(&self) -> Vec<Category>;
    async fn create_category(&self, req: CreateCategoryRequest) -> Option<Category>;
    async fn update_category(&self, id: i32, req: UpdateCategoryRequest) -> Option<Category>;
    async fn delete_category(&self, id: i32) -> bool;

    // --- Playlists ---
    async fn get_my_playlists(&self, user_id: i32) -> Vec<Playlist>;
    // Owner-Only: resolves only if the user_id matches the playlist owner.
    async fn get_playlist_detail(&self, id: i32, user_id: i32) -> Option<PlaylistDetail>;
    async fn create_playlist(&self, user_id: i32, name: &str) -> Option<Playlist>;
    // Owner-Only rename; None if missing or not owned.
    async fn rename_playlist(&self, id: i32, user_id: i32, name: Option<String>)
    -> Option<Playlist>;
    // Owner-Only: deletes only if the user_id matches the playlist's owner.
    async fn delete_playlist(&self, id: i32, user_id: i32) -> bool;
    // Idempotent membership insert, gated on playlist ownership.
    // Returns true only if a row was inserted.
    async fn add_playlist_track(&self, playlist_id: i32, user_id: i32, track_id: i32) -> bool;
    async fn remove_playlist_track(&self, playlist_id: i32, user_id: i32, track_id: i32) -> bool;

    // --- Favorites ---
    // Idempotent operation: returns true if a row was inserted, false otherwise (conflict).
    async fn add_favorite(&self, fav: Favorite) -> bool;
    async fn remove_favorite(&self, fav: Favorite) -> bool;
    async fn get_my_favorites(&self, user_id: i32) -> Vec<Track>;
    // Admin view: flat joined rows, grouped by user in the handler.
    async fn get_all_favorites(&self) -> Vec<FavoriteEntry>;

    // --- Audit Log Reads & Dashboard ---
    // The write side lives behind the AuditSink; this is the admin read view.
    async fn get_user_logs(&self, limit: i64) -> Vec<UserLog>;
    async fn get_stats(&self) -> AdminDashboardStats;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the PostgreSQL database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Shared column list so every track query deserializes identically.
const TRACK_COLUMNS: &str =
    "id, category_id, title, artist, audio_key, cover_key, duration_secs, created_at, updated_at";

#[async_trait]
impl Repository for PostgresRepository {
    // --- CREDENTIAL STORE ---

    async fn find_user_by_email(&self, email: &str) -> Option<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, is_admin FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_user_by_email error: {:?}", e);
            None
        })
    }

    async fn find_user_by_id(&self, id: i32) -> Option<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, is_admin FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_user_by_id error: {:?}", e);
            None
        })
    }

    /// create_user
    ///
    /// Inserts a new user with `is_admin = false`. Elevation to admin is a manual
    /// database operation, never an API one. A unique violation (duplicate email or
    /// username) comes back as None so the handler can answer 409.
    async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Option<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"INSERT INTO users (username, email, password_hash, is_admin)
               VALUES ($1, $2, $3, false)
               RETURNING id, username, email, password_hash, is_admin"#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map(Some)
        .unwrap_or_else(|e| {
            tracing::error!("create_user error: {:?}", e);
            None
        })
    }

    /// update_user
    ///
    /// Partial profile update. Uses the PostgreSQL `COALESCE` function to only
    /// touch a column when the corresponding field is `Some`.
    async fn update_user(
        &self,
        id: i32,
        username: Option<String>,
        email: Option<String>,
        password_hash: Option<String>,
    ) -> Option<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING id, username, email, password_hash, is_admin
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_user error: {:?}", e);
            None
        })
    }

    async fn list_users(&self) -> Vec<UserRecord> {
        sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, is_admin FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_users error: {:?}", e);
            vec![]
        })
    }

    async fn delete_user(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_user error: {:?}", e);
                false
            }
        }
    }

    // --- TRACK CATALOG ---

    /// get_tracks
    ///
    /// Implements flexible mood/search filtering using QueryBuilder for safe
    /// parameterization. Every user-supplied value goes through push_bind, so no
    /// SQL is ever concatenated from raw input.
    async fn get_tracks(&self, category: Option<i32>, search: Option<String>) -> Vec<Track> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {TRACK_COLUMNS} FROM tracks WHERE true"
        ));

        if let Some(c) = category {
            builder.push(" AND category_id = ");
            builder.push_bind(c);
        }

        if let Some(s) = search {
            // Case-insensitive search across title and artist fields.
            let search_pattern = format!("%{}%", s);
            builder.push(" AND (title ILIKE ");
            builder.push_bind(search_pattern.clone());
            builder.push(" OR artist ILIKE ");
            builder.push_bind(search_pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC");

        let query = builder.build_query_as::<Track>();

        match query.fetch_all(&self.pool).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!("get_tracks error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_track(&self, id: i32) -> Option<Track> {
        sqlx::query_as::<_, Track>(&format!(
            "SELECT {TRACK_COLUMNS} FROM tracks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_track error: {:?}", e);
            None
        })
    }

    /// get_trending_tracks
    ///
    /// Retrieves tracks ranked by the number of favorites.
    async fn get_trending_tracks(&self, limit: i64) -> Vec<Track> {
        sqlx::query_as::<_, Track>(
            r#"SELECT t.id, t.category_id, t.title, t.artist, t.audio_key, t.cover_key,
                      t.duration_secs, t.created_at, t.updated_at
               FROM tracks t LEFT JOIN favorites f ON t.id = f.track_id
               GROUP BY t.id ORDER BY COUNT(f.user_id) DESC LIMIT $1"#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_trending_tracks error: {:?}", e);
            vec![]
        })
    }

    async fn create_track(&self, req: CreateTrackRequest) -> Option<Track> {
        sqlx::query_as::<_, Track>(&format!(
            r#"INSERT INTO tracks (category_id, title, artist, audio_key, cover_key, duration_secs, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
               RETURNING {TRACK_COLUMNS}"#
        ))
        .bind(req.category_id)
        .bind(req.title)
        .bind(req.artist)
        .bind(req.audio_key)
        .bind(req.cover_key)
        .bind(req.duration_secs)
        .fetch_one(&self.pool)
        .await
        .map(Some)
        .unwrap_or_else(|e| {
            // Most likely a missing category (FK violation).
            tracing::error!("create_track error: {:?}", e);
            None
        })
    }

    /// update_track
    ///
    /// Uses the PostgreSQL `COALESCE` function to efficiently handle `Option<T>`
    /// fields, only updating a column if the corresponding field in `req` is `Some`.
    async fn update_track(&self, id: i32, req: UpdateTrackRequest) -> Option<Track> {
        sqlx::query_as::<_, Track>(&format!(
            r#"
            UPDATE tracks
            SET title = COALESCE($2, title),
                artist = COALESCE($3, artist),
                category_id = COALESCE($4, category_id),
                audio_key = COALESCE($5, audio_key),
                cover_key = COALESCE($6, cover_key),
                duration_secs = COALESCE($7, duration_secs),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TRACK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.artist)
        .bind(req.category_id)
        .bind(req.audio_key)
        .bind(req.cover_key)
        .bind(req.duration_secs)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_track error: {:?}", e);
            None
        })
    }

    async fn delete_track(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM tracks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_track error: {:?}", e);
                false
            }
        }
    }

    // --- MOOD CATEGORIES ---

    async fn get_categories(&self) -> Vec<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name, description FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_categories error: {:?}", e);
                vec![]
            })
    }

    async fn create_category(&self, req: CreateCategoryRequest) -> Option<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING id, name, description",
        )
        .bind(req.name)
        .bind(req.description)
        .fetch_one(&self.pool)
        .await
        .map(Some)
        .unwrap_or_else(|e| {
            tracing::error!("create_category error: {:?}", e);
            None
        })
    }

    async fn update_category(&self, id: i32, req: UpdateCategoryRequest) -> Option<Category> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(id)
        .bind(req.name)
        .bind(req.description)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_category error: {:?}", e);
            None
        })
    }

    async fn delete_category(&self, id: i32) -> bool {
        match sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                // Fails while tracks still reference the category (FK restrict).
                tracing::error!("delete_category error: {:?}", e);
                false
            }
        }
    }

    // --- PLAYLISTS ---

    async fn get_my_playlists(&self, user_id: i32) -> Vec<Playlist> {
        sqlx::query_as::<_, Playlist>(
            "SELECT id, user_id, name, created_at FROM playlists WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_my_playlists error: {:?}", e);
            vec![]
        })
    }

    /// get_playlist_detail
    ///
    /// Resolves the playlist header (Owner-Only) and its member tracks in order
    /// of insertion.
    async fn get_playlist_detail(&self, id: i32, user_id: i32) -> Option<PlaylistDetail> {
        let playlist = sqlx::query_as::<_, Playlist>(
            "SELECT id, user_id, name, created_at FROM playlists WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_playlist_detail error: {:?}", e);
            None
        })?;

        let tracks = sqlx::query_as::<_, Track>(
            r#"SELECT t.id, t.category_id, t.title, t.artist, t.audio_key, t.cover_key,
                      t.duration_secs, t.created_at, t.updated_at
               FROM playlist_tracks pt JOIN tracks t ON pt.track_id = t.id
               WHERE pt.playlist_id = $1
               ORDER BY pt.added_at ASC"#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_playlist_detail tracks error: {:?}", e);
            vec![]
        });

        Some(PlaylistDetail {
            id: playlist.id,
            user_id: playlist.user_id,
            name: playlist.name,
            created_at: playlist.created_at,
            tracks,
        })
    }

    async fn create_playlist(&self, user_id: i32, name: &str) -> Option<Playlist> {
        sqlx::query_as::<_, Playlist>(
            r#"INSERT INTO playlists (user_id, name, created_at)
               VALUES ($1, $2, NOW())
               RETURNING id, user_id, name, created_at"#,
        )
        .bind(user_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map(Some)
        .unwrap_or_else(|e| {
            tracing::error!("create_playlist error: {:?}", e);
            None
        })
    }

    async fn rename_playlist(
        &self,
        id: i32,
        user_id: i32,
        name: Option<String>,
    ) -> Option<Playlist> {
        sqlx::query_as::<_, Playlist>(
            r#"
            UPDATE playlists
            SET name = COALESCE($3, name)
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, name, created_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("rename_playlist error: {:?}", e);
            None
        })
    }

    /// delete_playlist
    ///
    /// Deletes a playlist only if the provided `user_id` matches the owner.
    /// This is the **Owner-Only** authorization check.
    async fn delete_playlist(&self, id: i32, user_id: i32) -> bool {
        match sqlx::query("DELETE FROM playlists WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_playlist error: {:?}", e);
                false
            }
        }
    }

    /// add_playlist_track
    ///
    /// Membership insert guarded by ownership: the INSERT..SELECT only produces a
    /// row when the playlist belongs to `user_id`. `ON CONFLICT DO NOTHING` makes
    /// re-adding the same track idempotent; the function returns true only if a
    /// new row was inserted (`rows_affected > 0`).
    async fn add_playlist_track(&self, playlist_id: i32, user_id: i32, track_id: i32) -> bool {
        let result = sqlx::query(
            r#"INSERT INTO playlist_tracks (playlist_id, track_id, added_at)
               SELECT $1, $2, NOW()
               WHERE EXISTS (SELECT 1 FROM playlists WHERE id = $1 AND user_id = $3)
               ON CONFLICT DO NOTHING"#,
        )
        .bind(playlist_id)
        .bind(track_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("add_playlist_track error: {:?}", e);
                false
            }
        }
    }

    async fn remove_playlist_track(&self, playlist_id: i32, user_id: i32, track_id: i32) -> bool {
        let result = sqlx::query(
            r#"DELETE FROM playlist_tracks pt
               USING playlists p
               WHERE pt.playlist_id = p.id AND p.user_id = $3
                 AND pt.playlist_id = $1 AND pt.track_id = $2"#,
        )
        .bind(playlist_id)
        .bind(track_id)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("remove_playlist_track error: {:?}", e);
                false
            }
        }
    }

    // --- FAVORITES ---

    /// add_favorite
    ///
    /// Inserts a favorite. Uses `ON CONFLICT DO NOTHING` to ensure **idempotency**.
    /// The function returns true only if a new row was inserted.
    async fn add_favorite(&self, fav: Favorite) -> bool {
        let result =
            sqlx::query("INSERT INTO favorites (user_id, track_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(fav.user_id)
                .bind(fav.track_id)
                .execute(&self.pool)
                .await;
        match result {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                // A true conflict (double favorite) does not error, only database errors land here.
                tracing::error!("add_favorite error: {:?}", e);
                false
            }
        }
    }

    async fn remove_favorite(&self, fav: Favorite) -> bool {
        match sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND track_id = $2")
            .bind(fav.user_id)
            .bind(fav.track_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("remove_favorite error: {:?}", e);
                false
            }
        }
    }

    async fn get_my_favorites(&self, user_id: i32) -> Vec<Track> {
        sqlx::query_as::<_, Track>(
            r#"SELECT t.id, t.category_id, t.title, t.artist, t.audio_key, t.cover_key,
                      t.duration_secs, t.created_at, t.updated_at
               FROM favorites f JOIN tracks t ON f.track_id = t.id
               WHERE f.user_id = $1
               ORDER BY t.title ASC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_my_favorites error: {:?}", e);
            vec![]
        })
    }

    /// get_all_favorites
    ///
    /// Flat joined rows for the admin view. The per-user grouping happens in the
    /// handler, in memory, over this ordered set.
    async fn get_all_favorites(&self) -> Vec<FavoriteEntry> {
        sqlx::query_as::<_, FavoriteEntry>(
            r#"SELECT f.user_id, u.username, f.track_id, t.title, t.artist, t.cover_key
               FROM favorites f
               JOIN users u ON f.user_id = u.id
               JOIN tracks t ON f.track_id = t.id
               ORDER BY f.user_id, t.title"#,
        )
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_all_favorites error: {:?}", e);
            vec![]
        })
    }

    // --- AUDIT LOG READS & DASHBOARD ---

    async fn get_user_logs(&self, limit: i64) -> Vec<UserLog> {
        sqlx::query_as::<_, UserLog>(
            "SELECT id, user_id, action, details, created_at FROM user_logs ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_user_logs error: {:?}", e);
            vec![]
        })
    }

    /// get_stats
    ///
    /// Compiles all necessary counters for the administrative dashboard in a single call.
    async fn get_stats(&self) -> AdminDashboardStats {
        let total_users = count_scalar(&self.pool, "SELECT COUNT(*) FROM users").await;
        let total_tracks = count_scalar(&self.pool, "SELECT COUNT(*) FROM tracks").await;
        let total_playlists = count_scalar(&self.pool, "SELECT COUNT(*) FROM playlists").await;
        let total_favorites = count_scalar(&self.pool, "SELECT COUNT(*) FROM favorites").await;
        AdminDashboardStats {
            total_users,
            total_tracks,
            total_playlists,
            total_favorites,
        }
    }
}

async fn count_scalar(pool: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}
