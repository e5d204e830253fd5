use crate::types::User;

/// What the persisted credential bundle looked like at one instant.
///
/// Capturing the bundle plus the two independent validity answers up front
/// keeps [`classify`] pure: the branching table can be tested without a
/// store or a clock.
#[derive(Debug, Clone)]
pub(crate) struct PersistedSnapshot {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Access token present, well-formed, `exp` in the future.
    pub token_valid: bool,
    /// Absolute session expiry strictly in the past.
    pub session_expired: bool,
}

/// Classification of the persisted credentials at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing usable persisted; idle, nothing to clear.
    NoCredentials,
    /// Only a refresh token survived a prior session; renewal is attempted
    /// optimistically even without a saved user snapshot.
    RefreshOnly,
    /// Token and session are both within their windows; adopt as-is.
    ValidSession,
    /// Token expired or malformed but a refresh token is available.
    ExpiredTokenRenewable,
    /// Token still valid but the session passed its absolute ceiling;
    /// renewal is attempted, then the ceiling is re-checked.
    ExpiredSessionAbsolute,
    /// Token expired with no refresh token; only a full clear remains.
    Unrecoverable,
}

/// Map a persisted snapshot to its session state.
///
/// Token validity and the absolute session window are independent checks;
/// both must hold for [`SessionState::ValidSession`].
pub(crate) fn classify(snapshot: &PersistedSnapshot) -> SessionState {
    if snapshot.user.is_none()
        && snapshot.access_token.is_none()
        && snapshot.refresh_token.is_some()
    {
        return SessionState::RefreshOnly;
    }

    if snapshot.access_token.is_some() && snapshot.user.is_some() {
        if !snapshot.token_valid {
            return if snapshot.refresh_token.is_some() {
                SessionState::ExpiredTokenRenewable
            } else {
                SessionState::Unrecoverable
            };
        }
        return if snapshot.session_expired {
            SessionState::ExpiredSessionAbsolute
        } else {
            SessionState::ValidSession
        };
    }

    SessionState::NoCredentials
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;

    fn user() -> Option<User> {
        Some(User {
            id: UserId("u-1".into()),
            email: "a@b.c".into(),
            first_name: String::new(),
            last_name: String::new(),
            is_active: true,
            role: None,
        })
    }

    fn snapshot() -> PersistedSnapshot {
        PersistedSnapshot {
            user: None,
            access_token: None,
            refresh_token: None,
            token_valid: false,
            session_expired: false,
        }
    }

    #[test]
    fn empty_bundle_is_no_credentials() {
        assert_eq!(classify(&snapshot()), SessionState::NoCredentials);
    }

    #[test]
    fn lone_refresh_token_is_refresh_only() {
        let snap = PersistedSnapshot {
            refresh_token: Some("r".into()),
            ..snapshot()
        };
        assert_eq!(classify(&snap), SessionState::RefreshOnly);
    }

    #[test]
    fn refresh_token_with_user_is_not_refresh_only() {
        // A saved user without an access token falls through to idle; the
        // optimistic-recovery path only fires when nothing but the refresh
        // token survived.
        let snap = PersistedSnapshot {
            user: user(),
            refresh_token: Some("r".into()),
            ..snapshot()
        };
        assert_eq!(classify(&snap), SessionState::NoCredentials);
    }

    #[test]
    fn valid_token_within_window() {
        let snap = PersistedSnapshot {
            user: user(),
            access_token: Some("t".into()),
            token_valid: true,
            ..snapshot()
        };
        assert_eq!(classify(&snap), SessionState::ValidSession);
    }

    #[test]
    fn valid_token_past_absolute_ceiling() {
        let snap = PersistedSnapshot {
            user: user(),
            access_token: Some("t".into()),
            token_valid: true,
            session_expired: true,
            ..snapshot()
        };
        assert_eq!(classify(&snap), SessionState::ExpiredSessionAbsolute);
    }

    #[test]
    fn expired_token_with_refresh_is_renewable() {
        let snap = PersistedSnapshot {
            user: user(),
            access_token: Some("t".into()),
            refresh_token: Some("r".into()),
            ..snapshot()
        };
        assert_eq!(classify(&snap), SessionState::ExpiredTokenRenewable);
    }

    #[test]
    fn expired_token_without_refresh_is_unrecoverable() {
        let snap = PersistedSnapshot {
            user: user(),
            access_token: Some("t".into()),
            ..snapshot()
        };
        assert_eq!(classify(&snap), SessionState::Unrecoverable);
    }

    #[test]
    fn token_expiry_checked_before_absolute_ceiling() {
        // Both windows blown at once: token expiry is checked first, so the
        // renewable path wins over the absolute-ceiling path.
        let snap = PersistedSnapshot {
            user: user(),
            access_token: Some("t".into()),
            refresh_token: Some("r".into()),
            token_valid: false,
            session_expired: true,
            ..snapshot()
        };
        assert_eq!(classify(&snap), SessionState::ExpiredTokenRenewable);
    }

    #[test]
    fn access_token_without_user_is_idle() {
        let snap = PersistedSnapshot {
            access_token: Some("t".into()),
            token_valid: true,
            ..snapshot()
        };
        assert_eq!(classify(&snap), SessionState::NoCredentials);
    }
}
