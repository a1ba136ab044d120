use moodtunes::{
    auth::Role,
    models::{AssetKind, LoginResponse, UpdateTrackRequest, User, UserRecord},
};

// --- Tests ---

#[test]
fn test_user_record_conversion_never_leaks_credentials() {
    // The public User carries no password material; the conversion is also the
    // single point where the stored boolean becomes the canonical role.
    let record = UserRecord {
        id: 9,
        username: "maya".to_string(),
        email: "maya@example.com".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$abc$def".to_string(),
        is_admin: true,
    };

    let user = record.into_public();
    assert_eq!(user.role, Role::Admin);

    let json_output = serde_json::to_string(&user).unwrap();
    assert!(!json_output.contains("password"));
    assert!(!json_output.contains("argon2"));
    assert!(!json_output.contains("is_admin"));
    // The role serializes as the lowercase enum string.
    assert!(json_output.contains(r#""role":"admin""#));
}

#[test]
fn test_role_round_trips_through_json() {
    let role: Role = serde_json::from_str(r#""user""#).unwrap();
    assert_eq!(role, Role::User);
    let role: Role = serde_json::from_str(r#""admin""#).unwrap();
    assert_eq!(role, Role::Admin);
    assert!(serde_json::from_str::<Role>(r#""superuser""#).is_err());
}

#[test]
fn test_update_track_request_optionality() {
    // This confirms the structure supports partial updates (all fields are Option<T>)
    let partial_update = UpdateTrackRequest {
        title: Some("New Title Only".to_string()),
        artist: None,
        category_id: None,
        audio_key: None,
        cover_key: None,
        duration_secs: None,
    };

    // The key validation is that None fields are omitted from the payload entirely.
    let json_output = serde_json::to_string(&partial_update).unwrap();
    assert!(json_output.contains(r#""title":"New Title Only""#));
    assert!(!json_output.contains("artist"));
    assert!(!json_output.contains("category_id"));
}

#[test]
fn test_login_response_shape() {
    let response = LoginResponse {
        token: "abc.def.ghi".to_string(),
        user: User {
            id: 1,
            username: "maya".to_string(),
            email: "maya@example.com".to_string(),
            role: Role::User,
        },
    };

    let json_output = serde_json::to_string(&response).unwrap();
    assert!(json_output.contains(r#""token":"abc.def.ghi""#));
    assert!(json_output.contains(r#""role":"user""#));
}

#[test]
fn test_asset_kind_serialization_and_prefix() {
    assert_eq!(serde_json::to_string(&AssetKind::Audio).unwrap(), r#""audio""#);
    assert_eq!(serde_json::to_string(&AssetKind::Cover).unwrap(), r#""cover""#);
    assert_eq!(AssetKind::Audio.key_prefix(), "audio");
    assert_eq!(AssetKind::Cover.key_prefix(), "covers");
}
