use std::collections::HashMap;
use std::sync::Mutex;

/// Persisted credential-bundle keys.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";
pub const SESSION_INFO_KEY: &str = "session_info";

/// Consumer-provided credential persistence.
///
/// A flat key/value store keyed by the `*_KEY` constants above — the analog
/// of browser local storage. Operations are infallible by contract: a store
/// that can fail internally should log and degrade (absent reads, dropped
/// writes) rather than surface errors, since every caller treats persistence
/// as best-effort.
///
/// One process is assumed to be the only writer. Concurrent processes
/// sharing a store are not coordinated by this crate.
///
/// # Example
///
/// ```rust,ignore
/// impl CredentialStore for KeychainStore {
///     fn get(&self, key: &str) -> Option<String> {
///         self.keychain.lookup(key).ok().flatten()
///     }
///     fn set(&self, key: &str, value: &str) {
///         let _ = self.keychain.store(key, value);
///     }
///     fn remove(&self, key: &str) {
///         let _ = self.keychain.delete(key);
///     }
/// }
/// ```
pub trait CredentialStore: Send + Sync {
    /// Read a value; `None` when absent.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any existing one.
    fn set(&self, key: &str, value: &str);

    /// Remove a value; no-op when absent.
    fn remove(&self, key: &str);
}

/// In-memory store for tests and embedders without durable storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

        store.set(ACCESS_TOKEN_KEY, "tok");
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok"));

        store.set(ACCESS_TOKEN_KEY, "tok2");
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("tok2"));

        store.remove(ACCESS_TOKEN_KEY);
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
        // removing again is a no-op
        store.remove(ACCESS_TOKEN_KEY);
    }

    #[test]
    fn keys_are_independent() {
        let store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "a");
        store.set(REFRESH_TOKEN_KEY, "r");
        store.remove(ACCESS_TOKEN_KEY);
        assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("r"));
    }
}
