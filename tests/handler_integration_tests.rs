use async_trait::async_trait;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use moodtunes::{
    AppState,
    audit::MockAuditSink,
    auth::{AuthUser, Role, SEED_ADMIN_ID},
    config::{AppConfig, SeedAdmin},
    error::ApiError,
    handlers,
    models::{
        AdminDashboardStats, AssetKind, Category, CreateCategoryRequest, CreateTrackRequest,
        Favorite, FavoriteEntry, LoginRequest, Playlist, PlaylistDetail, PresignedUploadRequest,
        RegisterRequest, Track, UpdateCategoryRequest, UpdateProfileRequest, UpdateTrackRequest,
        UserLog, UserRecord,
    },
    passwords,
    repository::Repository,
    storage::MockStorageService,
};
use std::sync::Arc;

// --- MOCK REPOSITORY IMPLEMENTATION ---

// This struct is the central control point for testing handler logic.
// Handlers rely on traits, so we mock the trait implementation.
pub struct MockRepoControl {
    // Pre-canned credential store contents.
    pub user_by_email: Option<UserRecord>,
    pub user_by_id: Option<UserRecord>,
    // None simulates a unique violation on insert.
    pub created_user: Option<UserRecord>,

    // Pre-canned outputs for handler requests.
    pub tracks_to_return: Vec<Track>,
    pub track_to_return: Option<Track>,
    pub favorites_to_return: Vec<FavoriteEntry>,
    pub add_favorite_result: bool,
    pub stats_to_return: AdminDashboardStats,
}

impl Default for MockRepoControl {
    fn default() -> Self {
        MockRepoControl {
            user_by_email: None,
            user_by_id: None,
            created_user: None,
            tracks_to_return: vec![],
            track_to_return: Some(Track::default()),
            favorites_to_return: vec![],
            add_favorite_result: true, // Default to success for simpler tests
            stats_to_return: AdminDashboardStats::default(),
        }
    }
}

#[async_trait]
impl Repository for MockRepoControl {
    async fn find_user_by_email(&self, _email: &str) -> Option<UserRecord> {
        self.user_by_email.clone()
    }
    async fn find_user_by_id(&self, _id: i32) -> Option<UserRecord> {
        self.user_by_id.clone()
    }
    async fn create_user(
        &self,
        _username: &str,
        _email: &str,
        _password_hash: &str,
    ) -> Option<UserRecord> {
        self.created_user.clone()
    }
    async fn update_user(
        &self,
        _id: i32,
        _username: Option<String>,
        _email: Option<String>,
        _password_hash: Option<String>,
    ) -> Option<UserRecord> {
        self.user_by_id.clone()
    }
    async fn list_users(&self) -> Vec<UserRecord> {
        vec![]
    }
    async fn delete_user(&self, _id: i32) -> bool {
        false
    }
    async fn get_tracks(&self, _category: Option<i32>, _search: Option<String>) -> Vec<Track> {
        self.tracks_to_return.clone()
    }
    async fn get_track(&self, _id: i32) -> Option<Track> {
        self.track_to_return.clone()
    }
    async fn get_trending_tracks(&self, _limit: i64) -> Vec<Track> {
        self.tracks_to_return.clone()
    }
    async fn create_track(&self, _req: CreateTrackRequest) -> Option<Track> {
        self.track_to_return.clone()
    }
    async fn update_track(&self, _id: i32, _req: UpdateTrackRequest) -> Option<Track> {
        self.track_to_return.clone()
    }
    async fn delete_track(&self, _id: i32) -> bool {
        false
    }
    async fn get_categories(&self) -> Vec<Category> {
        vec![]
    }
    async fn create_category(&self, _req: CreateCategoryRequest) -> Option<Category> {
        Some(Category::default())
    }
    async fn update_category(&self, _id: i32, _req: UpdateCategoryRequest) -> Option<Category> {
        None
    }
    async fn delete_category(&self, _id: i32) -> bool {
        false
    }
    async fn get_my_playlists(&self, _user_id: i32) -> Vec<Playlist> {
        vec![]
    }
    async fn get_playlist_detail(&self, _id: i32, _user_id: i32) -> Option<PlaylistDetail> {
        None
    }
    async fn create_playlist(&self, user_id: i32, name: &str) -> Option<Playlist> {
        Some(Playlist {
            id: 1,
            user_id,
            name: name.to_string(),
            ..Playlist::default()
        })
    }
    async fn rename_playlist(
        &self,
        _id: i32,
        _user_id: i32,
        _name: Option<String>,
    ) -> Option<Playlist> {
        None
    }
    async fn delete_playlist(&self, _id: i32, _user_id: i32) -> bool {
        false
    }
    async fn add_playlist_track(&self, _playlist_id: i32, _user_id: i32, _track_id: i32) -> bool {
        self.add_favorite_result
    }
    async fn remove_playlist_track(
        &self,
        _playlist_id: i32,
        _user_id: i32,
        _track_id: i32,
    ) -> bool {
        false
    }
    async fn add_favorite(&self, _fav: Favorite) -> bool {
        self.add_favorite_result
    }
    async fn remove_favorite(&self, _fav: Favorite) -> bool {
        self.add_favorite_result
    }
    async fn get_my_favorites(&self, _user_id: i32) -> Vec<Track> {
        self.tracks_to_return.clone()
    }
    async fn get_all_favorites(&self) -> Vec<FavoriteEntry> {
        self.favorites_to_return.clone()
    }
    async fn get_user_logs(&self, _limit: i64) -> Vec<UserLog> {
        vec![]
    }
    async fn get_stats(&self) -> AdminDashboardStats {
        self.stats_to_return.clone()
    }
}

// --- Helpers ---

const TEST_JWT_SECRET: &str = "handler-test-secret-0987654321";

struct TestHarness {
    state: AppState,
    audit: Arc<MockAuditSink>,
}

fn harness_with(repo: MockRepoControl, seed_admin: Option<SeedAdmin>) -> TestHarness {
    let mut config = AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    config.seed_admin = seed_admin;

    let audit = Arc::new(MockAuditSink::new());
    let state = AppState::new(
        Arc::new(repo),
        Arc::new(MockStorageService::new()),
        audit.clone() as moodtunes::AuditState,
        config,
    );
    TestHarness { state, audit }
}

fn stored_user(id: i32, email: &str, password: &str, is_admin: bool) -> UserRecord {
    UserRecord {
        id,
        username: format!("user{}", id),
        email: email.to_string(),
        password_hash: passwords::hash_password(password).unwrap(),
        is_admin,
    }
}

fn auth_user(id: i32, role: Role) -> AuthUser {
    AuthUser {
        id,
        username: format!("user{}", id),
        role,
    }
}

// --- Login Tests ---

#[tokio::test]
async fn test_seeded_admin_login_bypasses_store() {
    // Empty credential store: the seeded path must not consult it at all.
    let harness = harness_with(
        MockRepoControl::default(),
        Some(SeedAdmin {
            username: "admin".to_string(),
            password: "1234".to_string(),
        }),
    );

    let result = handlers::login(
        State(harness.state.clone()),
        Json(LoginRequest {
            email: "admin".to_string(),
            password: "1234".to_string(),
        }),
    )
    .await
    .unwrap();

    let Json(response) = result;
    assert_eq!(response.user.id, SEED_ADMIN_ID);
    assert_eq!(response.user.role, Role::Admin);

    // The issued token carries the same identity.
    let claims = harness.state.codec.verify(&response.token).unwrap();
    assert_eq!(claims.sub, SEED_ADMIN_ID);
    assert_eq!(claims.role, Role::Admin);

    // The login was audited under the sentinel id.
    let recorded = harness.audit.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, SEED_ADMIN_ID);
    assert_eq!(recorded[0].1, "login");
}

#[tokio::test]
async fn test_seeded_admin_login_disabled_without_config() {
    // Same credentials, but the seed is not configured: plain invalid login.
    let harness = harness_with(MockRepoControl::default(), None);

    let result = handlers::login(
        State(harness.state),
        Json(LoginRequest {
            email: "admin".to_string(),
            password: "1234".to_string(),
        }),
    )
    .await;

    assert_eq!(
        result.unwrap_err(),
        ApiError::BadRequest("Invalid credentials".to_string())
    );
}

#[tokio::test]
async fn test_login_success_issues_user_token() {
    let repo = MockRepoControl {
        user_by_email: Some(stored_user(7, "lena@example.com", "hunter2", false)),
        ..Default::default()
    };
    let harness = harness_with(repo, None);

    let Json(response) = handlers::login(
        State(harness.state.clone()),
        Json(LoginRequest {
            email: "lena@example.com".to_string(),
            password: "hunter2".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(response.user.id, 7);
    assert_eq!(response.user.role, Role::User);

    let claims = harness.state.codec.verify(&response.token).unwrap();
    assert_eq!(claims.sub, 7);
    assert_eq!(claims.role, Role::User);
}

#[tokio::test]
async fn test_login_reconciles_is_admin_flag() {
    let repo = MockRepoControl {
        user_by_email: Some(stored_user(3, "boss@example.com", "s3cret", true)),
        ..Default::default()
    };
    let harness = harness_with(repo, None);

    let Json(response) = handlers::login(
        State(harness.state.clone()),
        Json(LoginRequest {
            email: "boss@example.com".to_string(),
            password: "s3cret".to_string(),
        }),
    )
    .await
    .unwrap();

    // The stored boolean surfaces only as the canonical role.
    assert_eq!(response.user.role, Role::Admin);
    let claims = harness.state.codec.verify(&response.token).unwrap();
    assert_eq!(claims.role, Role::Admin);
}

#[tokio::test]
async fn test_login_wrong_password_is_400() {
    let repo = MockRepoControl {
        user_by_email: Some(stored_user(7, "lena@example.com", "hunter2", false)),
        ..Default::default()
    };
    let harness = harness_with(repo, None);

    let result = handlers::login(
        State(harness.state),
        Json(LoginRequest {
            email: "lena@example.com".to_string(),
            password: "wrong".to_string(),
        }),
    )
    .await;

    // 400 "Invalid credentials", deliberately not a 401.
    assert_eq!(
        result.unwrap_err(),
        ApiError::BadRequest("Invalid credentials".to_string())
    );
}

#[tokio::test]
async fn test_login_unknown_email_is_400() {
    let harness = harness_with(MockRepoControl::default(), None);

    let result = handlers::login(
        State(harness.state),
        Json(LoginRequest {
            email: "ghost@example.com".to_string(),
            password: "whatever".to_string(),
        }),
    )
    .await;

    assert_eq!(
        result.unwrap_err(),
        ApiError::BadRequest("Invalid credentials".to_string())
    );
}

// --- Registration Tests ---

#[tokio::test]
async fn test_register_success_records_audit() {
    let repo = MockRepoControl {
        created_user: Some(stored_user(11, "new@example.com", "pw", false)),
        ..Default::default()
    };
    let harness = harness_with(repo, None);

    let (status, Json(user)) = handlers::register_user(
        State(harness.state),
        Json(RegisterRequest {
            username: "newbie".to_string(),
            email: "new@example.com".to_string(),
            password: "pw".to_string(),
        }),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user.id, 11);
    assert_eq!(user.role, Role::User);

    let recorded = harness.audit.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].1, "register");
}

#[tokio::test]
async fn test_register_duplicate_is_409() {
    // created_user: None simulates the unique violation.
    let harness = harness_with(MockRepoControl::default(), None);

    let result = handlers::register_user(
        State(harness.state),
        Json(RegisterRequest {
            username: "dupe".to_string(),
            email: "taken@example.com".to_string(),
            password: "pw".to_string(),
        }),
    )
    .await;

    assert!(matches!(result.unwrap_err(), ApiError::Conflict(_)));
}

// --- Profile Tests ---

#[tokio::test]
async fn test_get_me_seeded_admin_resolves_from_claim() {
    let harness = harness_with(MockRepoControl::default(), None);

    let Json(user) = handlers::get_me(
        AuthUser {
            id: SEED_ADMIN_ID,
            username: "admin".to_string(),
            role: Role::Admin,
        },
        State(harness.state),
    )
    .await
    .unwrap();

    assert_eq!(user.id, SEED_ADMIN_ID);
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_get_me_deleted_account_is_404() {
    // Valid token but the account vanished after issuance.
    let harness = harness_with(MockRepoControl::default(), None);

    let result = handlers::get_me(auth_user(42, Role::User), State(harness.state)).await;

    assert_eq!(result.unwrap_err(), ApiError::NotFound);
}

#[tokio::test]
async fn test_update_me_rejected_for_seeded_admin() {
    let harness = harness_with(MockRepoControl::default(), None);

    let result = handlers::update_me(
        AuthUser {
            id: SEED_ADMIN_ID,
            username: "admin".to_string(),
            role: Role::Admin,
        },
        State(harness.state),
        Json(UpdateProfileRequest::default()),
    )
    .await;

    assert!(matches!(result.unwrap_err(), ApiError::BadRequest(_)));
}

// --- Favorite Tests ---

#[tokio::test]
async fn test_add_favorite_success_records_audit() {
    let harness = harness_with(MockRepoControl::default(), None);

    let status = handlers::add_favorite(
        auth_user(5, Role::User),
        State(harness.state),
        Path(33),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::OK);

    let recorded = harness.audit.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0], (5, "favorite_add".to_string(), "track 33".to_string()));
}

#[tokio::test]
async fn test_add_favorite_duplicate_is_409() {
    let repo = MockRepoControl {
        add_favorite_result: false,
        ..Default::default()
    };
    let harness = harness_with(repo, None);

    let result =
        handlers::add_favorite(auth_user(5, Role::User), State(harness.state), Path(33)).await;

    assert!(matches!(result.unwrap_err(), ApiError::Conflict(_)));
    // The failed attempt is not audited.
    assert!(harness.audit.recorded().is_empty());
}

#[tokio::test]
async fn test_grouped_favorites_groups_by_user_in_order() {
    let entry = |user_id: i32, username: &str, track_id: i32, title: &str| FavoriteEntry {
        user_id,
        username: username.to_string(),
        track_id,
        title: title.to_string(),
        artist: "a".to_string(),
        cover_key: None,
    };
    // Ordered by user_id, as the repository query guarantees.
    let repo = MockRepoControl {
        favorites_to_return: vec![
            entry(1, "ana", 10, "First"),
            entry(1, "ana", 11, "Second"),
            entry(2, "ben", 10, "First"),
        ],
        ..Default::default()
    };
    let harness = harness_with(repo, None);

    let Json(grouped) = handlers::get_grouped_favorites(State(harness.state)).await;

    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[0].user_id, 1);
    assert_eq!(grouped[0].username, "ana");
    assert_eq!(grouped[0].tracks.len(), 2);
    assert_eq!(grouped[1].user_id, 2);
    assert_eq!(grouped[1].tracks.len(), 1);
    assert_eq!(grouped[1].tracks[0].title, "First");
}

// --- Streaming & Upload Tests ---

#[tokio::test]
async fn test_stream_track_returns_presigned_url() {
    let repo = MockRepoControl {
        track_to_return: Some(Track {
            id: 3,
            audio_key: "audio/abc.mp3".to_string(),
            title: "Rainy Day".to_string(),
            ..Track::default()
        }),
        ..Default::default()
    };
    let harness = harness_with(repo, None);

    let Json(response) = handlers::stream_track(
        auth_user(5, Role::User),
        State(harness.state),
        Path(3),
    )
    .await
    .unwrap();

    assert!(response.stream_url.contains("audio/abc.mp3"));

    let recorded = harness.audit.recorded();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].1, "stream");
}

#[tokio::test]
async fn test_stream_unknown_track_is_404() {
    let repo = MockRepoControl {
        track_to_return: None,
        ..Default::default()
    };
    let harness = harness_with(repo, None);

    let result =
        handlers::stream_track(auth_user(5, Role::User), State(harness.state), Path(99)).await;

    assert_eq!(result.unwrap_err(), ApiError::NotFound);
}

#[tokio::test]
async fn test_presigned_upload_uses_kind_prefix_and_extension() {
    let harness = harness_with(MockRepoControl::default(), None);

    let Json(response) = handlers::get_presigned_upload(
        auth_user(5, Role::User),
        State(harness.state),
        Json(PresignedUploadRequest {
            filename: "rainy_day.mp3".to_string(),
            file_type: "audio/mpeg".to_string(),
            kind: AssetKind::Audio,
        }),
    )
    .await
    .unwrap();

    assert!(response.resource_key.starts_with("audio/"));
    assert!(response.resource_key.ends_with(".mp3"));
    assert!(response.upload_url.contains(&response.resource_key));
}

#[tokio::test]
async fn test_presigned_upload_storage_failure_is_500() {
    let mut config = AppConfig::default();
    config.jwt_secret = TEST_JWT_SECRET.to_string();
    let state = AppState::new(
        Arc::new(MockRepoControl::default()),
        Arc::new(MockStorageService::new_failing()),
        Arc::new(MockAuditSink::new()),
        config,
    );

    let result = handlers::get_presigned_upload(
        auth_user(5, Role::User),
        State(state),
        Json(PresignedUploadRequest {
            filename: "cover.png".to_string(),
            file_type: "image/png".to_string(),
            kind: AssetKind::Cover,
        }),
    )
    .await;

    assert_eq!(result.unwrap_err(), ApiError::Internal);
}
