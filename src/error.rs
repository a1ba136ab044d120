use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// ApiError
///
/// The application-wide failure taxonomy. Every error that crosses the HTTP boundary
/// is one of these variants, and every variant renders as a structured JSON body
/// (`{"message": ...}`) with the matching status code. Handlers and the authorization
/// middleware never leak raw database or storage errors to the client; those are
/// logged server-side and surfaced as the generic `Internal` variant.
#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    /// The request carried no `Authorization: Bearer` header at all.
    #[error("no token provided")]
    MissingToken,

    /// The token was present but failed verification. Malformed, expired and
    /// wrongly-signed tokens all collapse into this one variant; the underlying
    /// cause is logged where verification happens, never reported to the caller.
    #[error("token failed")]
    InvalidToken,

    /// The caller is authenticated but lacks the admin role.
    #[error("not authorized as admin")]
    NotAdmin,

    #[error("{0}")]
    BadRequest(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    /// Upstream failure (database, storage). The real error is logged at the call
    /// site; the client only ever sees this generic message.
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingToken | ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::NotAdmin => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_auth_failures_to_expected_statuses() {
        assert_eq!(ApiError::MissingToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::NotAdmin.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn renders_human_readable_messages() {
        assert_eq!(ApiError::MissingToken.to_string(), "no token provided");
        assert_eq!(ApiError::InvalidToken.to_string(), "token failed");
        assert_eq!(ApiError::NotAdmin.to_string(), "not authorized as admin");
        assert_eq!(
            ApiError::BadRequest("Invalid credentials".into()).to_string(),
            "Invalid credentials"
        );
    }
}
