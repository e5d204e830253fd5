//! The live session: startup classification and explicit actions.
//!
//! [`SessionController`] is the only component that mutates the in-memory
//! session or initiates credential renewal. The startup decision logic is a
//! pure function from a persisted-credential snapshot to a
//! [`SessionState`], kept separate from the effects the controller performs
//! on its outcome.

mod classify;
mod controller;

pub use classify::SessionState;
pub use controller::{SessionController, SessionSnapshot};
