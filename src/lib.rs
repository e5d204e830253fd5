#![doc = include_str!("../README.md")]

pub mod api;
pub mod backend;
pub mod error;
pub mod session;
pub mod store;
pub mod token;
pub mod types;

// Re-exports for convenient access
pub use api::{ApiClient, ApiConfig};
pub use backend::AuthBackend;
pub use error::Error;
pub use session::{SessionController, SessionSnapshot, SessionState};
pub use store::{CredentialStore, MemoryStore};
pub use token::TokenManager;
pub use types::{
    AuthPayload, RegisterPayload, RegisterRequest, RemainingSession, SessionInfo, TokenInfo,
    TokenPair, User, UserId,
};
