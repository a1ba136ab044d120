/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated modules,
/// enforcing a Defense-in-Depth strategy. This structure ensures that
/// access control is applied explicitly at the module level (via Axum layers),
/// preventing accidental exposure of protected endpoints.
///
/// The three modules map directly to the authorization chain's stages: anonymous
/// requests stop at the public router, token-bearing requests pass `require_auth`,
/// and only admin claims pass `require_admin`.

/// Routes accessible to all users (anonymous, read-only browse plus the auth gateway).
pub mod public;

/// Routes protected by the `require_auth` middleware layer.
/// Requires a valid bearer token.
pub mod authenticated;

/// Routes restricted exclusively to users with the admin role,
/// enforced by the `require_admin` middleware layer.
pub mod admin;
