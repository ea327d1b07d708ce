//! File-Backed Conversation Memory
//!
//! JSON file holding per-user message lists, capped at
//! [`MAX_MESSAGES_PER_USER`] entries each. The store file has no per-key
//! locking, so every read-modify-write is serialized through one mutex per
//! store instance. Coarse, but correct; a known throughput ceiling.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use agent_core::{
    error::Result,
    memory::{MAX_MESSAGES_PER_USER, MemoryProvider, Role, StoredMessage},
};

type StoreData = HashMap<String, Vec<StoredMessage>>;

/// JSON-file memory store
pub struct JsonMemoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonMemoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Read the whole store. A missing or corrupt file reads as empty.
    fn read_all(path: &Path) -> StoreData {
        match fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            Err(_) => StoreData::new(),
        }
    }

    fn write_all(path: &Path, data: &StoreData) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(data)?)?;
        Ok(())
    }

    fn append(&self, user_id: &str, message: StoredMessage) -> Result<()> {
        let _guard = self.lock.lock().unwrap();
        let mut data = Self::read_all(&self.path);
        let messages = data.entry(user_id.to_string()).or_default();
        messages.push(message);
        if messages.len() > MAX_MESSAGES_PER_USER {
            let excess = messages.len() - MAX_MESSAGES_PER_USER;
            messages.drain(..excess);
        }
        Self::write_all(&self.path, &data)
    }
}

impl MemoryProvider for JsonMemoryStore {
    fn append_user(&self, user_id: &str, text: &str) -> Result<()> {
        self.append(user_id, StoredMessage::new(Role::User, text))
    }

    fn append_assistant(&self, user_id: &str, text: &str) -> Result<()> {
        self.append(user_id, StoredMessage::new(Role::Assistant, text))
    }

    fn get_context(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        let _guard = self.lock.lock().unwrap();
        let data = Self::read_all(&self.path);
        let messages = data.get(user_id).map(Vec::as_slice).unwrap_or_default();
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..]
            .iter()
            .map(StoredMessage::context_line)
            .collect())
    }
}
