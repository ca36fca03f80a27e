use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::StorageError;
use crate::models::analysis::HistoryEntry;
use crate::session::storage::{MemoryStorage, Storage};

pub const SESSION_ID_KEY: &str = "sessionId";
pub const HISTORY_KEY: &str = "analysisHistory";
pub const HAS_VISITED_KEY: &str = "hasVisited";

const ALL_KEYS: [&str; 3] = [SESSION_ID_KEY, HISTORY_KEY, HAS_VISITED_KEY];

/// Session identity, analysis history and the first-visit flag, persisted in
/// client-local storage.
///
/// Storage failures never reach the caller. The first one switches the store
/// to a `MemoryStorage` seeded with whatever is still readable, and the rest
/// of the session runs in memory only.
pub struct SessionStore {
    backend: Box<dyn Storage>,
    degraded: bool,
}

impl SessionStore {
    pub fn new(backend: Box<dyn Storage>) -> Self {
        Self {
            backend,
            degraded: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Returns the persisted session token, creating and persisting one if absent.
    pub fn get_or_create_session_id(&mut self) -> String {
        if let Some(existing) = self
            .read_json::<String>(SESSION_ID_KEY)
            .filter(|id| !id.is_empty())
        {
            return existing;
        }

        let session_id = Uuid::new_v4().to_string();
        self.write_json(SESSION_ID_KEY, &session_id);
        info!("Created new session {session_id}");
        session_id
    }

    /// Stored history, most recent first. Empty if nothing is stored.
    pub fn load_history(&mut self) -> Vec<HistoryEntry> {
        self.read_json(HISTORY_KEY).unwrap_or_default()
    }

    /// Prepends `entry` and persists the full updated sequence.
    pub fn append_history(&mut self, entry: HistoryEntry) -> Vec<HistoryEntry> {
        // History is never stored without a session to attribute it to.
        self.get_or_create_session_id();

        let mut history = self.load_history();
        history.insert(0, entry);
        self.write_json(HISTORY_KEY, &history);
        debug!("History now holds {} entries", history.len());
        history
    }

    /// Removes history and the session token. The next
    /// [`get_or_create_session_id`](Self::get_or_create_session_id) issues a new token.
    pub fn clear_all(&mut self) {
        for key in [HISTORY_KEY, SESSION_ID_KEY] {
            if let Err(e) = self.backend.remove_item(key) {
                self.degrade(e);
                let _ = self.backend.remove_item(key);
            }
        }
        info!("Cleared analysis history and session");
    }

    pub fn has_visited(&mut self) -> bool {
        self.read_json(HAS_VISITED_KEY).unwrap_or(false)
    }

    pub fn mark_visited(&mut self) {
        self.write_json(HAS_VISITED_KEY, &true);
    }

    fn read_json<T: serde::de::DeserializeOwned>(&mut self, key: &str) -> Option<T> {
        let raw = match self.backend.get_item(key) {
            Ok(raw) => raw,
            Err(e) => {
                self.degrade(e);
                self.backend.get_item(key).ok().flatten()
            }
        }?;

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable value for '{key}': {e}");
                None
            }
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Could not encode value for '{key}': {e}");
                return;
            }
        };
        if let Err(e) = self.backend.set_item(key, &raw) {
            self.degrade(e);
            let _ = self.backend.set_item(key, &raw);
        }
    }

    fn degrade(&mut self, err: StorageError) {
        if self.degraded {
            return;
        }
        warn!("Local storage unavailable, continuing in memory only: {err}");

        let mut fallback = MemoryStorage::new();
        for key in ALL_KEYS {
            if let Ok(Some(value)) = self.backend.get_item(key) {
                let _ = fallback.set_item(key, &value);
            }
        }
        self.backend = Box::new(fallback);
        self.degraded = true;
    }
}
