//! Conversation Memory
//!
//! Per-user persisted message history. The store keeps at most
//! [`MAX_MESSAGES_PER_USER`] entries per user and serves context as
//! role-tagged lines, most recent last.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Maximum stored entries per user; appending beyond this evicts the oldest.
pub const MAX_MESSAGES_PER_USER: usize = 200;

/// Role of a stored message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input
    User,
    /// Assistant (LLM) response
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single persisted message
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: Role,
    pub text: String,
}

impl StoredMessage {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Render as a role-tagged context line
    pub fn context_line(&self) -> String {
        format!("{}: {}", self.role, self.text)
    }
}

/// Persisted conversation-history store.
///
/// Writers across concurrently processing turns must serialize through the
/// implementation's own mutual exclusion; the orchestrator assumes
/// append-then-read ordering per user but takes no lock itself.
pub trait MemoryProvider: Send + Sync {
    /// Append a user message for this user, evicting the oldest entry past
    /// the cap
    fn append_user(&self, user_id: &str, text: &str) -> Result<()>;

    /// Append an assistant message for this user
    fn append_assistant(&self, user_id: &str, text: &str) -> Result<()>;

    /// Most recent `limit` entries as `"<role>: <text>"` lines, oldest first
    fn get_context(&self, user_id: &str, limit: usize) -> Result<Vec<String>>;
}

/// In-memory store for development and testing
pub struct InMemoryStore {
    messages: std::sync::RwLock<std::collections::HashMap<String, Vec<StoredMessage>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            messages: std::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }

    fn append(&self, user_id: &str, message: StoredMessage) {
        let mut map = self.messages.write().unwrap();
        let entry = map.entry(user_id.to_string()).or_default();
        entry.push(message);
        if entry.len() > MAX_MESSAGES_PER_USER {
            let excess = entry.len() - MAX_MESSAGES_PER_USER;
            entry.drain(..excess);
        }
    }
}

impl MemoryProvider for InMemoryStore {
    fn append_user(&self, user_id: &str, text: &str) -> Result<()> {
        self.append(user_id, StoredMessage::new(Role::User, text));
        Ok(())
    }

    fn append_assistant(&self, user_id: &str, text: &str) -> Result<()> {
        self.append(user_id, StoredMessage::new(Role::Assistant, text));
        Ok(())
    }

    fn get_context(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        let map = self.messages.read().unwrap();
        let messages = map.get(user_id).map(Vec::as_slice).unwrap_or_default();
        let start = messages.len().saturating_sub(limit);
        Ok(messages[start..].iter().map(StoredMessage::context_line).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_lines_are_role_tagged_and_ordered() {
        let store = InMemoryStore::new();
        store.append_user("u1", "hi").unwrap();
        store.append_assistant("u1", "hello").unwrap();
        store.append_user("u1", "what's up").unwrap();

        let context = store.get_context("u1", 2).unwrap();
        assert_eq!(context, vec!["assistant: hello", "user: what's up"]);
    }

    #[test]
    fn test_users_are_isolated() {
        let store = InMemoryStore::new();
        store.append_user("u1", "one").unwrap();
        store.append_user("u2", "two").unwrap();

        assert_eq!(store.get_context("u1", 10).unwrap(), vec!["user: one"]);
        assert_eq!(store.get_context("u2", 10).unwrap(), vec!["user: two"]);
    }

    #[test]
    fn test_cap_evicts_oldest_entry() {
        let store = InMemoryStore::new();
        for i in 0..MAX_MESSAGES_PER_USER {
            store.append_user("u1", &format!("msg {i}")).unwrap();
        }
        store.append_user("u1", "the 201st").unwrap();

        let all = store.get_context("u1", MAX_MESSAGES_PER_USER + 10).unwrap();
        assert_eq!(all.len(), MAX_MESSAGES_PER_USER);
        assert_eq!(all.first().unwrap(), "user: msg 1");
        assert_eq!(all.last().unwrap(), "user: the 201st");
    }
}
