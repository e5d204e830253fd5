use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use time::OffsetDateTime;

/// Backend-assigned user identifier (opaque string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

/// Snapshot of the authenticated principal.
///
/// This is a display cache for instant UI paint, not a source of
/// authorization truth — admin-gated screens re-fetch the authoritative role
/// from the backend before trusting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub role: Option<String>,
}

/// Token bundle issued by login, registration, and the OAuth callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub session_info: Option<SessionInfo>,
}

/// Server-issued session metadata.
///
/// `absolute_expiry` is a hard ceiling on session lifetime, independent of
/// access-token expiry: however often the session is refreshed, it must end
/// by this wall-clock time. Unrecognized fields round-trip verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub absolute_expiry: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl SessionInfo {
    /// Session info with only an absolute expiry.
    #[must_use]
    pub fn new(absolute_expiry: OffsetDateTime) -> Self {
        Self {
            absolute_expiry: Some(absolute_expiry),
            extra: Map::new(),
        }
    }
}

/// Best-effort decode of the access-token payload, for display and
/// debugging. None of these fields is verified client-side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[non_exhaustive]
pub struct TokenInfo {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Human-oriented breakdown of the time left before the absolute session
/// expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct RemainingSession {
    pub total_ms: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub formatted: String,
}

// ── Wire DTOs ──────────────────────────────────────────────────────
//
// Field names below are part of the backend compatibility contract.

#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response shape shared by login and the Microsoft OAuth callback.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct AuthPayload {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct RegisterPayload {
    pub user: User,
    #[serde(default)]
    pub tokens: Option<TokenPair>,
    #[serde(default)]
    pub email_verification_required: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Serialize)]
pub struct CallbackRequest {
    pub code: String,
    pub state: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct RefreshResponse {
    pub access: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutRequest {
    pub refresh: String,
}

#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct VerifyEmailResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct VerifyTokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct VerifyTokenResponse {
    pub valid: bool,
}
