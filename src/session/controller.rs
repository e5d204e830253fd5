use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::backend::AuthBackend;
use crate::error::Error;
use crate::store::{ACCESS_TOKEN_KEY, CredentialStore, REFRESH_TOKEN_KEY, USER_KEY};
use crate::token::TokenManager;
use crate::types::{
    LoginRequest, RegisterPayload, RegisterRequest, TokenPair, User,
};

use super::classify::{PersistedSnapshot, classify};
use super::SessionState;

/// Point-in-time view of the live session, cloned out for UI reads.
///
/// `loading` is true only until the one-time startup classification
/// completes; readers must treat `is_authenticated`/`user` as provisional
/// while it is set.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct SessionSnapshot {
    pub user: Option<User>,
    pub access_token: Option<String>,
    pub is_authenticated: bool,
    pub loading: bool,
}

/// Single source of truth for "is there a usable, logged-in session".
///
/// One controller is constructed by the application root and handed to
/// dependents — there is deliberately no process-global instance, so tests
/// build a fresh controller per case. Only this type mutates the in-memory
/// session or initiates credential renewal; everything else reads
/// [`snapshot`](Self::snapshot) and calls the action methods.
pub struct SessionController<B: AuthBackend> {
    backend: B,
    store: Arc<dyn CredentialStore>,
    tokens: TokenManager,
    state: Mutex<SessionSnapshot>,
    /// Serializes renewal: concurrent callers queue here and revalidate
    /// after acquiring, so one network refresh serves them all.
    refresh_gate: tokio::sync::Mutex<()>,
    /// Bumped on every clear. A refresh that was in flight when the epoch
    /// moved discards its result instead of resurrecting the session.
    epoch: AtomicU64,
    initialized: AtomicBool,
}

impl<B: AuthBackend> SessionController<B> {
    /// Build a controller over a backend and credential store.
    ///
    /// The snapshot starts with `loading = true`; call
    /// [`initialize`](Self::initialize) once at startup to run the
    /// classification and settle it.
    #[must_use]
    pub fn new(backend: B, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            backend,
            tokens: TokenManager::new(Arc::clone(&store)),
            store,
            state: Mutex::new(SessionSnapshot {
                loading: true,
                ..SessionSnapshot::default()
            }),
            refresh_gate: tokio::sync::Mutex::new(()),
            epoch: AtomicU64::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    /// Current session snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state_guard().clone()
    }

    /// The credential inspector sharing this controller's store.
    #[must_use]
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Run the startup classification.
    ///
    /// Executes exactly once; later calls return immediately. Never fails
    /// outward: any unexpected error ends in a full clear, and `loading` is
    /// false on every exit path.
    pub async fn initialize(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.run_startup_classification().await {
            warn!(error = %e, "startup classification did not recover a session");
        }
        self.state_guard().loading = false;
    }

    async fn run_startup_classification(&self) -> Result<(), Error> {
        let snapshot = self.persisted_snapshot();
        let state = classify(&snapshot);
        match state {
            SessionState::NoCredentials => Ok(()),
            SessionState::ValidSession => {
                let mut guard = self.state_guard();
                guard.user = snapshot.user;
                guard.access_token = snapshot.access_token;
                guard.is_authenticated = true;
                info!("restored persisted session");
                Ok(())
            }
            SessionState::RefreshOnly
            | SessionState::ExpiredTokenRenewable
            | SessionState::ExpiredSessionAbsolute => {
                // Recover whatever renewal can source. `refresh` enforces
                // both validity windows itself, including the post-renewal
                // absolute-ceiling check.
                self.refresh().await?;
                Ok(())
            }
            SessionState::Unrecoverable => {
                self.clear_session();
                Ok(())
            }
        }
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched; no session state changes on
    /// failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, Error> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let payload = self.backend.login(&request).await?;
        self.adopt_authenticated(&payload.user, &payload.tokens);
        info!(user = %payload.user.id, "login successful");
        Ok(payload.user)
    }

    /// Create an account.
    ///
    /// When the backend requires email verification the new user is exposed
    /// in the snapshot for display, but the session stays unauthenticated
    /// with no access token until an explicit login after confirmation.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched.
    pub async fn register(&self, request: &RegisterRequest) -> Result<RegisterPayload, Error> {
        let payload = self.backend.register(request).await?;
        match &payload.tokens {
            Some(tokens) if !payload.email_verification_required => {
                self.adopt_authenticated(&payload.user, tokens);
            }
            _ => {
                let mut guard = self.state_guard();
                guard.user = Some(payload.user.clone());
                guard.access_token = None;
                guard.is_authenticated = false;
            }
        }
        Ok(payload)
    }

    /// Obtain the Microsoft authorization URL.
    ///
    /// The caller is expected to navigate to it — a terminal hand-off to the
    /// identity provider, not a normal return into the app.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched.
    pub async fn microsoft_auth_url(&self) -> Result<String, Error> {
        self.backend.microsoft_auth_url().await
    }

    /// Complete the Microsoft OAuth flow with the provider's callback
    /// parameters.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched; no session state changes on
    /// failure.
    pub async fn handle_microsoft_callback(
        &self,
        code: &str,
        state: &str,
    ) -> Result<User, Error> {
        let payload = self.backend.microsoft_callback(code, state).await?;
        self.adopt_authenticated(&payload.user, &payload.tokens);
        info!(user = %payload.user.id, "microsoft login successful");
        Ok(payload.user)
    }

    /// End the session.
    ///
    /// The local session is cleared unconditionally, even when the
    /// server-side invalidation fails; the failure is rethrown afterwards so
    /// the embedder can report it.
    ///
    /// # Errors
    ///
    /// Returns the server-side invalidation error, after the local clear.
    pub async fn logout(&self) -> Result<(), Error> {
        let result = match self.store.get(REFRESH_TOKEN_KEY) {
            Some(token) => self.backend.logout(&token).await,
            None => Ok(()),
        };
        self.clear_session();
        match result {
            Ok(()) => {
                info!("logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "server-side logout failed; local session cleared anyway");
                Err(e)
            }
        }
    }

    /// Renew the access token from the persisted refresh token.
    ///
    /// Concurrent calls coalesce: while one renewal is in flight, later
    /// callers wait and then observe its result instead of issuing another
    /// network call.
    ///
    /// # Errors
    ///
    /// Any failure (no refresh token, backend rejection, or a renewed token
    /// whose session is past its absolute ceiling) performs a full clear
    /// and leaves the session unauthenticated.
    pub async fn refresh(&self) -> Result<String, Error> {
        let _gate = self.refresh_gate.lock().await;

        // A caller that queued behind an in-flight renewal finds a fresh,
        // still-usable token already persisted and adopts it. The absolute
        // ceiling is part of the check: a valid token inside an expired
        // session still needs the real renewal below.
        if self.tokens.is_token_valid()
            && !self.tokens.is_session_expired()
            && let Some(token) = self.store.get(ACCESS_TOKEN_KEY)
        {
            self.adopt_refreshed(&token);
            return Ok(token);
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let Some(refresh_token) = self.store.get(REFRESH_TOKEN_KEY) else {
            self.clear_session();
            return Err(Error::MissingRefreshToken);
        };

        match self.backend.refresh(&refresh_token).await {
            Ok(access) => {
                if self.epoch.load(Ordering::SeqCst) != epoch {
                    // A logout landed while the renewal was in flight; the
                    // logged-out state wins.
                    return Err(Error::SessionCleared);
                }
                self.store.set(ACCESS_TOKEN_KEY, &access);
                // The refresh exchange carries a token, not a new absolute
                // ceiling: both windows must hold before the session is
                // usable again.
                if self.tokens.is_session_expired() {
                    warn!("renewed token is inside an expired session window; clearing");
                    self.clear_session();
                    return Err(Error::SessionExpired);
                }
                self.adopt_refreshed(&access);
                info!("access token refreshed");
                Ok(access)
            }
            Err(e) => {
                warn!(error = %e, "token refresh failed; clearing session");
                self.clear_session();
                Err(e)
            }
        }
    }

    /// Start the password-reset flow. No session state is touched.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched.
    pub async fn forgot_password(&self, email: &str) -> Result<(), Error> {
        self.backend.forgot_password(email).await
    }

    /// Complete the password-reset flow. No session state is touched.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), Error> {
        self.backend.reset_password(token, new_password).await
    }

    /// Confirm an email-verification token.
    ///
    /// On an activated account only the in-memory user snapshot is updated;
    /// no token is issued and the session stays unauthenticated — the user
    /// still logs in explicitly.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched.
    pub async fn verify_email(&self, token: &str) -> Result<User, Error> {
        let user = self.backend.verify_email(token).await?;
        if user.is_active {
            self.state_guard().user = Some(user.clone());
        }
        Ok(user)
    }

    /// Re-send the verification email. No session state is touched.
    ///
    /// # Errors
    ///
    /// Propagates backend errors untouched.
    pub async fn resend_verification_email(&self, email: &str) -> Result<(), Error> {
        self.backend.resend_verification_email(email).await
    }

    // ── Internals ──────────────────────────────────────────────────

    fn state_guard(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persisted_snapshot(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            user: self.persisted_user(),
            access_token: self.store.get(ACCESS_TOKEN_KEY),
            refresh_token: self.store.get(REFRESH_TOKEN_KEY),
            token_valid: self.tokens.is_token_valid(),
            session_expired: self.tokens.is_session_expired(),
        }
    }

    fn persisted_user(&self) -> Option<User> {
        let raw = self.store.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "persisted user snapshot is unparseable");
                None
            }
        }
    }

    /// Mark the session authenticated on a renewed (or revalidated) access
    /// token, restoring the persisted user snapshot where one exists.
    fn adopt_refreshed(&self, access: &str) {
        let user = self.persisted_user();
        let mut guard = self.state_guard();
        if user.is_some() {
            guard.user = user;
        }
        guard.access_token = Some(access.to_string());
        guard.is_authenticated = true;
    }

    /// Persist a full credential bundle and mark the session authenticated.
    fn adopt_authenticated(&self, user: &User, tokens: &TokenPair) {
        self.store.set(ACCESS_TOKEN_KEY, &tokens.access);
        self.store.set(REFRESH_TOKEN_KEY, &tokens.refresh);
        match serde_json::to_string(user) {
            Ok(raw) => self.store.set(USER_KEY, &raw),
            Err(e) => warn!(error = %e, "failed to serialize user snapshot"),
        }
        if let Some(info) = &tokens.session_info {
            self.tokens.set_session_info(info);
        }

        let mut guard = self.state_guard();
        guard.user = Some(user.clone());
        guard.access_token = Some(tokens.access.clone());
        guard.is_authenticated = true;
    }

    /// Drop everything: persisted bundle and in-memory session.
    fn clear_session(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.tokens.clear();
        let mut guard = self.state_guard();
        guard.user = None;
        guard.access_token = None;
        guard.is_authenticated = false;
    }
}
