use std::collections::HashMap;

use parking_lot::RwLock;
use uuid::Uuid;

/// Session key under which a share's password elevation is stored.
pub fn share_password_key(share_id: Uuid) -> String {
    format!("share-password.{}", share_id)
}

/// Key-value view of the caller's session.
///
/// The gate stores exactly one kind of value here: under
/// [`share_password_key`], the hash string of the share password the
/// visitor verified. The elevation is valid only while that string equals
/// the share's current hash, so rotating the password logs everyone out
/// without touching any session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn unset(&self, key: &str);
}

/// In-memory session, for tests and embedded callers.
#[derive(Debug, Default)]
pub struct MemorySession {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) {
        self.values.write().insert(key.to_string(), value);
    }

    fn unset(&self, key: &str) {
        self.values.write().remove(key);
    }
}
