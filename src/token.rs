use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use time::OffsetDateTime;
use tracing::warn;

use crate::backend::AuthBackend;
use crate::store::{
    ACCESS_TOKEN_KEY, CredentialStore, REFRESH_TOKEN_KEY, SESSION_INFO_KEY, USER_KEY,
};
use crate::types::{RemainingSession, SessionInfo, TokenInfo};

/// Stateless-per-call inspector of the persisted credential bundle.
///
/// Holds no mutable state of its own — every query re-reads the store, so
/// answers always reflect what is currently persisted. Inspection methods
/// are total: malformed input degrades to `false`/`None`, never an error.
/// Callers asking a yes/no question must never have to handle a failure.
#[derive(Clone)]
pub struct TokenManager {
    store: Arc<dyn CredentialStore>,
}

impl TokenManager {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Whether a well-formed, unexpired access token is persisted.
    ///
    /// Token validity is independent of the absolute session ceiling — see
    /// [`is_session_expired`](Self::is_session_expired). A payload without
    /// an `exp` claim is treated as invalid.
    #[must_use]
    pub fn is_token_valid(&self) -> bool {
        let Some(info) = self.token_info() else {
            return false;
        };
        let Some(exp) = info.exp else {
            return false;
        };
        exp > OffsetDateTime::now_utc().unix_timestamp()
    }

    /// Best-effort decode of the access-token payload for display and
    /// debugging. `None` when no token is persisted or it cannot be decoded.
    #[must_use]
    pub fn token_info(&self) -> Option<TokenInfo> {
        let token = self.store.get(ACCESS_TOKEN_KEY)?;
        decode_payload(&token)
    }

    /// Whether the server-dictated absolute session expiry has passed.
    ///
    /// Fail-open: absent or unparseable session info means no ceiling is
    /// enforced and the answer is `false`. Only a parsed `absolute_expiry`
    /// strictly before now yields `true`.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        match self.session_info().and_then(|info| info.absolute_expiry) {
            Some(expiry) => expiry < OffsetDateTime::now_utc(),
            None => false,
        }
    }

    /// Time left until the absolute session expiry, broken down for
    /// display. `None` when there is no session info or the session has
    /// already expired.
    #[must_use]
    pub fn remaining_session_time(&self) -> Option<RemainingSession> {
        let expiry = self.session_info()?.absolute_expiry?;
        let left = expiry - OffsetDateTime::now_utc();
        if !left.is_positive() {
            return None;
        }
        let total_seconds = left.whole_seconds();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        Some(RemainingSession {
            total_ms: i64::try_from(left.whole_milliseconds()).unwrap_or(i64::MAX),
            hours,
            minutes,
            seconds,
            formatted: format!("{hours}h {minutes:02}m {seconds:02}s"),
        })
    }

    /// Raw parsed session info; `None` when absent or unparseable.
    #[must_use]
    pub fn session_info(&self) -> Option<SessionInfo> {
        let raw = self.store.get(SESSION_INFO_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!(error = %e, "persisted session info is unparseable");
                None
            }
        }
    }

    /// Persist session info verbatim, including unrecognized fields.
    pub fn set_session_info(&self, info: &SessionInfo) {
        match serde_json::to_string(info) {
            Ok(raw) => self.store.set(SESSION_INFO_KEY, &raw),
            Err(e) => warn!(error = %e, "failed to serialize session info"),
        }
    }

    /// Remove the entire credential bundle. Idempotent.
    pub fn clear(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);
        self.store.remove(USER_KEY);
        self.store.remove(SESSION_INFO_KEY);
    }

    /// Server-side verification of the current access token — the one
    /// network operation on this type.
    ///
    /// `true` only when the backend confirms the token; `false` when no
    /// token is persisted or on any transport/API error.
    pub async fn verify_token<B: AuthBackend>(&self, backend: &B) -> bool {
        let Some(token) = self.store.get(ACCESS_TOKEN_KEY) else {
            return false;
        };
        match backend.verify_token(&token).await {
            Ok(valid) => valid,
            Err(e) => {
                warn!(error = %e, "token verification request failed");
                false
            }
        }
    }
}

/// Decode the middle segment of a three-part token as base64url JSON.
///
/// Purely structural — no signature verification happens client-side; the
/// backend re-validates every request.
fn decode_payload(token: &str) -> Option<TokenInfo> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return None;
    }
    // Tolerate padded encoders; the canonical form is unpadded.
    let bytes = URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}
