use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

/// Subject id reserved for the configuration-seeded administrative identity.
/// That identity is never persisted in the `users` table, so no real record
/// can ever collide with it.
pub const SEED_ADMIN_ID: i32 = 0;

/// Role
///
/// The single canonical role representation consumed by the authorization layer.
/// The `users.is_admin` boolean column is folded into this enum at the repository
/// boundary, so middleware and handlers never see two spellings of the same fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Reconciles the stored `is_admin` flag into the canonical enum.
    pub fn from_is_admin(is_admin: bool) -> Self {
        if is_admin { Role::Admin } else { Role::User }
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// Claims
///
/// Represents the payload structure embedded inside a JSON Web Token (JWT).
/// These claims are signed by the server's secret and validated upon every
/// authenticated request. A claim set is immutable once issued; changing the
/// role or identity requires a fresh login and therefore a fresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): The integer id of the user. 0 is reserved for the seeded admin.
    pub sub: i32,
    /// Display name carried for convenience. Never an authorization input.
    pub username: String,
    /// The authoritative gating field.
    pub role: Role,
    /// Issued At (iat): Timestamp when the JWT was issued.
    pub iat: usize,
    /// Expiration Time (exp): Timestamp after which the JWT must not be accepted.
    /// This is crucial for preventing replay attacks and maintaining session freshness.
    pub exp: usize,
}

/// TokenCodec
///
/// Issues and verifies signed, time-bounded identity tokens (HS256). The codec is
/// pure: given the secret, a claim set and a clock instant, both operations are
/// deterministic and perform no I/O. The secret is read-only process-wide state,
/// safe for unlimited concurrent readers.
///
/// The clock is an explicit parameter on `issue_at`/`verify_at` so expiry behavior
/// is testable without sleeping; the `issue`/`verify` wrappers use the system clock.
#[derive(Clone)]
pub struct TokenCodec {
    secret: String,
}

impl TokenCodec {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// issue_at
    ///
    /// Signs a token for an already-resolved identity. No validation of the claim
    /// fields happens here: authentication against the credential store (or the
    /// seeded-admin check) is the caller's job. The TTL is caller-selected; the
    /// regular login path uses the configured default (7 days) while the seeded
    /// admin session uses the shorter 24-hour window.
    pub fn issue_at(
        &self,
        sub: i32,
        username: &str,
        role: Role,
        ttl: Duration,
        now: SystemTime,
    ) -> Result<String, ApiError> {
        let iat = unix_seconds(now)?;
        let exp = iat + ttl.as_secs() as usize;

        let claims = Claims {
            sub,
            username: username.to_string(),
            role,
            iat,
            exp,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| {
            tracing::error!("token encoding failed: {:?}", e);
            ApiError::Internal
        })
    }

    /// verify_at
    ///
    /// Decodes and validates a token against the secret and the supplied clock
    /// instant. Malformed tokens, bad signatures and expired tokens all collapse
    /// into the single `InvalidToken` result: no caller in the system needs finer
    /// granularity, and a uniform failure leaks nothing to probing clients. The
    /// underlying cause is logged at debug level as a diagnostic side effect.
    pub fn verify_at(&self, token: &str, now: SystemTime) -> Result<Claims, ApiError> {
        // Expiry is checked manually below against the injected clock, so the
        // library's wall-clock check is disabled.
        let mut validation = Validation::default();
        validation.validate_exp = false;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            tracing::debug!("token verification failed: {:?}", e.kind());
            ApiError::InvalidToken
        })?;

        let claims = token_data.claims;
        if unix_seconds(now)? >= claims.exp {
            tracing::debug!("token verification failed: expired");
            return Err(ApiError::InvalidToken);
        }

        Ok(claims)
    }

    /// Issues a token stamped with the current system time.
    pub fn issue(
        &self,
        sub: i32,
        username: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<String, ApiError> {
        self.issue_at(sub, username, role, ttl, SystemTime::now())
    }

    /// Verifies a token against the current system time.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        self.verify_at(token, SystemTime::now())
    }
}

fn unix_seconds(t: SystemTime) -> Result<usize, ApiError> {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .map_err(|_| ApiError::Internal)
}

/// AuthUser Extractor Result
///
/// This struct represents the resolved identity of an authenticated request: the
/// per-request authorization context. It is derived from a verified token, owned
/// exclusively by the request that produced it, and destroyed when the request
/// completes. Handlers use it for every owner/role decision.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user (0 for the seeded admin).
    pub id: i32,
    /// Display name from the claim. Not an authorization input.
    pub username: String,
    /// The user's role. Used for Role-Based Access Control (RBAC).
    pub role: Role,
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a function
/// argument in any authenticated handler. This cleanly separates authentication
/// (middleware/extractor) from business logic (the handler).
///
/// The extraction is a linear, no-retry sequence:
/// 1. Extract: read the Authorization header and require the "Bearer " prefix.
///    A missing or malformed header is terminal: 401 "no token provided".
/// 2. Verify: decode via the TokenCodec. Any failure is terminal: 401 "token failed".
/// 3. Attach: the resolved claim becomes the request's AuthUser.
///
/// No database lookup happens here: the token itself carries the claim, so the
/// credential store is only consulted at login time and by the profile endpoint.
impl<S> FromRequestParts<S> for AuthUser
where
    // S must allow sending across threads and sharing.
    S: Send + Sync,
    // Allows the extractor to pull the codec (and thereby the secret) from app state.
    TokenCodec: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let codec = TokenCodec::from_ref(state);

        // 1. Token Extraction
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::MissingToken)?;

        // 2. Decode and Validate the Token
        let claims = codec.verify(token)?;

        // 3. Success: Return the resolved identity.
        Ok(AuthUser {
            id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// require_auth
///
/// Middleware gating the authenticated router. It attempts to extract `AuthUser`
/// from the request; since `AuthUser` implements `FromRequestParts`, a failed
/// extraction rejects the request with the matching 401 before the handler runs.
/// On success the request proceeds unmodified; the middleware never inspects or
/// alters the handler's response.
pub async fn require_auth(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// require_admin
///
/// Middleware gating the admin router. Runs the same extraction as `require_auth`
/// and additionally requires the admin role, the optional third stage of the
/// authorization chain. A non-admin identity is terminal: 403 "not authorized as
/// admin". The role comes from the verified claim, so no route ever consults a
/// second role representation.
pub async fn require_admin(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !auth_user.role.is_admin() {
        return Err(ApiError::NotAdmin);
    }
    Ok(next.run(request).await)
}
