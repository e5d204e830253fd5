/// Errors surfaced by explicit session actions.
///
/// Inspection queries (`TokenManager`) never return these — they degrade to
/// `false`/`None`. Only user-initiated actions (login, register, refresh,
/// password flows) propagate them so the UI can render a message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Transport-level failure talking to the backend.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected an exchange. `detail` carries the server's own
    /// message where one was returned, for direct display to the user.
    #[error("{operation} failed (status {status:?}): {detail}")]
    Api {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },

    /// Renewal was requested but no refresh token is persisted.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The session passed its server-dictated absolute expiry and could not
    /// be renewed within that window.
    #[error("session expired")]
    SessionExpired,

    /// The session was cleared (logout) while the operation was in flight;
    /// its result has been discarded.
    #[error("session cleared during operation")]
    SessionCleared,

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
