//! Saved conversation threads.
//!
//! A `ChatHistoryManager` owns the ordered thread list of one namespace and
//! writes the whole list back to its store after every mutation. Memory is
//! updated first; if the write fails the error is returned and the two copies
//! differ until the next successful save.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

use crate::storage::{clear_document, load_document, save_document, StoreError, StoreRef};
use crate::types::{now_timestamp, Message};

/// Titles longer than this many characters are cut and marked with an ellipsis
pub const TITLE_MAX_CHARS: usize = 50;
const TITLE_ELLIPSIS: &str = "...";

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Chat thread not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type HistoryResult<T> = Result<T, HistoryError>;

/// Which persisted history a manager works on.
///
/// The chat view and the forensic dashboard keep separate histories; they
/// share the interface, never the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryNamespace {
    Chat,
    Forensic,
}

impl HistoryNamespace {
    pub fn storage_key(&self) -> &'static str {
        match self {
            HistoryNamespace::Chat => "chatHistory",
            HistoryNamespace::Forensic => "forensicHistory",
        }
    }
}

impl fmt::Display for HistoryNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.storage_key())
    }
}

/// A saved conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: String,
    pub title: String,
    pub messages: Vec<Message>,
    /// Time of the last update
    pub timestamp: String,
}

impl ChatThread {
    /// Number of user questions in the thread
    pub fn question_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user).count()
    }
}

/// Thread title for a query: first 50 characters, plus "..." iff it was longer.
pub fn thread_title(query: &str) -> String {
    let mut chars = query.chars();
    let head: String = chars.by_ref().take(TITLE_MAX_CHARS).collect();
    if chars.next().is_some() {
        format!("{}{}", head, TITLE_ELLIPSIS)
    } else {
        head
    }
}

/// Ordered, persisted collection of chat threads, newest-created first
#[derive(Debug)]
pub struct ChatHistoryManager {
    store: StoreRef,
    namespace: HistoryNamespace,
    threads: Vec<ChatThread>,
}

impl ChatHistoryManager {
    /// Load the namespace's history from `store`; an absent document is an
    /// empty history.
    pub fn open(store: StoreRef, namespace: HistoryNamespace) -> HistoryResult<Self> {
        let threads: Vec<ChatThread> =
            load_document(store.as_ref(), namespace.storage_key())?.unwrap_or_default();
        info!("Loaded {} threads from {}", threads.len(), namespace);
        Ok(Self {
            store,
            namespace,
            threads,
        })
    }

    pub fn namespace(&self) -> HistoryNamespace {
        self.namespace
    }

    /// All threads, newest-created first
    pub fn threads(&self) -> &[ChatThread] {
        &self.threads
    }

    pub fn len(&self) -> usize {
        self.threads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn load(&self, thread_id: &str) -> Option<&ChatThread> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    /// Record messages in a thread.
    ///
    /// With no `thread_id` a new thread titled after `query` is created and
    /// placed first. Otherwise the messages are appended to the existing
    /// thread and its timestamp refreshed; its position does not change.
    /// Returns the id of the thread written.
    pub fn start_or_continue(
        &mut self,
        thread_id: Option<&str>,
        query: &str,
        messages: &[Message],
    ) -> HistoryResult<String> {
        let id = match thread_id {
            None => {
                let id = self.next_thread_id();
                let thread = ChatThread {
                    id: id.clone(),
                    title: thread_title(query),
                    messages: messages.to_vec(),
                    timestamp: now_timestamp(),
                };
                debug!("Created thread {} in {}", id, self.namespace);
                self.threads.insert(0, thread);
                id
            }
            Some(id) => {
                let thread = self
                    .threads
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| HistoryError::NotFound(id.to_string()))?;
                thread.messages.extend_from_slice(messages);
                thread.timestamp = now_timestamp();
                debug!("Appended {} messages to thread {}", messages.len(), id);
                id.to_string()
            }
        };
        self.sync()?;
        Ok(id)
    }

    /// Give a thread a new title
    pub fn rename(&mut self, thread_id: &str, title: &str) -> HistoryResult<()> {
        let thread = self
            .threads
            .iter_mut()
            .find(|t| t.id == thread_id)
            .ok_or_else(|| HistoryError::NotFound(thread_id.to_string()))?;
        thread.title = title.trim().to_string();
        self.sync()
    }

    /// Remove one thread. Returns whether anything was removed.
    pub fn delete(&mut self, thread_id: &str) -> HistoryResult<bool> {
        let before = self.threads.len();
        self.threads.retain(|t| t.id != thread_id);
        if self.threads.len() == before {
            return Ok(false);
        }
        debug!("Deleted thread {} from {}", thread_id, self.namespace);
        self.sync()?;
        Ok(true)
    }

    /// Drop every thread and erase the persisted document
    pub fn clear_all(&mut self) -> HistoryResult<()> {
        self.threads.clear();
        clear_document(self.store.as_ref(), self.namespace.storage_key())?;
        info!("Cleared {}", self.namespace);
        Ok(())
    }

    fn sync(&self) -> HistoryResult<()> {
        save_document(self.store.as_ref(), self.namespace.storage_key(), &self.threads)?;
        Ok(())
    }

    /// Creation time in epoch milliseconds, bumped past any id already taken
    fn next_thread_id(&self) -> String {
        let mut millis = Utc::now().timestamp_millis();
        while self.threads.iter().any(|t| t.id == millis.to_string()) {
            millis += 1;
        }
        millis.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, KeyValueStore};
    use std::sync::Arc;

    fn exchange(query: &str) -> Vec<Message> {
        vec![
            Message::user(query),
            Message::assistant(format!("answer to {}", query), vec![], vec![], 50, 1.0),
        ]
    }

    fn manager(store: &Arc<InMemoryStore>) -> ChatHistoryManager {
        ChatHistoryManager::open(store.clone(), HistoryNamespace::Chat).unwrap()
    }

    fn persisted(store: &InMemoryStore, namespace: HistoryNamespace) -> Option<Vec<ChatThread>> {
        load_document(store, namespace.storage_key()).unwrap()
    }

    #[test]
    fn test_title_truncation() {
        assert_eq!(thread_title("What is paracetamol?"), "What is paracetamol?");

        let exact = "a".repeat(50);
        assert_eq!(thread_title(&exact), exact);

        let long = "b".repeat(51);
        assert_eq!(thread_title(&long), format!("{}...", "b".repeat(50)));

        // Counts characters, not bytes
        let accented = "é".repeat(60);
        assert_eq!(thread_title(&accented).chars().count(), 53);
    }

    #[test]
    fn test_first_exchange_creates_thread() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = manager(&store);
        assert!(history.is_empty());

        let query = "What are the side effects of ibuprofen when taken with alcohol daily?";
        let id = history.start_or_continue(None, query, &exchange(query)).unwrap();

        assert_eq!(history.len(), 1);
        let thread = history.load(&id).unwrap();
        assert_eq!(thread.title, format!("{}...", &query[..50]));
        assert_eq!(thread.messages.len(), 2);
        assert_eq!(thread.question_count(), 1);
        assert_eq!(persisted(&store, HistoryNamespace::Chat).unwrap(), history.threads());
    }

    #[test]
    fn test_continue_appends_without_reordering() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = manager(&store);
        let first = history.start_or_continue(None, "first", &exchange("first")).unwrap();
        let second = history.start_or_continue(None, "second", &exchange("second")).unwrap();
        assert_ne!(first, second);
        assert_eq!(history.threads()[0].id, second);

        history
            .start_or_continue(Some(&first), "follow up", &exchange("follow up"))
            .unwrap();

        assert_eq!(history.threads()[0].id, second);
        assert_eq!(history.threads()[1].id, first);
        let thread = history.load(&first).unwrap();
        assert_eq!(thread.messages.len(), 4);
        assert_eq!(thread.title, "first");
        assert_eq!(persisted(&store, HistoryNamespace::Chat).unwrap(), history.threads());
    }

    #[test]
    fn test_continue_unknown_thread() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = manager(&store);
        let result = history.start_or_continue(Some("42"), "q", &exchange("q"));
        assert!(matches!(result, Err(HistoryError::NotFound(id)) if id == "42"));
    }

    #[test]
    fn test_delete_keeps_relative_order() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = manager(&store);
        let ids: Vec<String> = (0..4)
            .map(|i| {
                let q = format!("question {}", i);
                history.start_or_continue(None, &q, &exchange(&q)).unwrap()
            })
            .collect();

        assert!(history.delete(&ids[1]).unwrap());
        let remaining: Vec<&str> = history.threads().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(remaining, vec![ids[3].as_str(), ids[2].as_str(), ids[0].as_str()]);

        assert!(!history.delete("missing").unwrap());
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn test_deleting_last_thread_persists_empty_list() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = manager(&store);
        let id = history.start_or_continue(None, "only", &exchange("only")).unwrap();
        history.delete(&id).unwrap();

        assert_eq!(persisted(&store, HistoryNamespace::Chat), Some(vec![]));
        let reopened = manager(&store);
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_clear_all_removes_document() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = manager(&store);
        let id = history.start_or_continue(None, "q", &exchange("q")).unwrap();

        history.clear_all().unwrap();
        assert!(history.load(&id).is_none());
        assert!(history.load("anything").is_none());
        assert!(!store.contains_key("chatHistory"));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let store = Arc::new(InMemoryStore::new());
        let mut chat = manager(&store);
        let mut forensic =
            ChatHistoryManager::open(store.clone(), HistoryNamespace::Forensic).unwrap();

        chat.start_or_continue(None, "chat q", &exchange("chat q")).unwrap();
        forensic.start_or_continue(None, "lab q", &exchange("lab q")).unwrap();
        forensic.clear_all().unwrap();

        assert_eq!(chat.len(), 1);
        assert!(store.contains_key("chatHistory"));
        assert!(!store.contains_key("forensicHistory"));
    }

    #[test]
    fn test_reopen_loads_persisted_threads() {
        let store = Arc::new(InMemoryStore::new());
        let id = {
            let mut history = manager(&store);
            history.start_or_continue(None, "persist me", &exchange("persist me")).unwrap()
        };
        let reopened = manager(&store);
        assert_eq!(reopened.load(&id).unwrap().title, "persist me");
    }

    #[test]
    fn test_rename() {
        let store = Arc::new(InMemoryStore::new());
        let mut history = manager(&store);
        let id = history.start_or_continue(None, "q", &exchange("q")).unwrap();
        history.rename(&id, "  Paracetamol dosage ").unwrap();
        assert_eq!(history.load(&id).unwrap().title, "Paracetamol dosage");
        assert!(history.rename("nope", "x").is_err());
    }

    #[test]
    fn test_save_failure_propagates_after_memory_update() {
        let store = Arc::new(InMemoryStore::with_quota(64));
        let mut history = manager(&store);
        let long_query = "x".repeat(200);

        let result = history.start_or_continue(None, &long_query, &exchange(&long_query));
        assert!(matches!(
            result,
            Err(HistoryError::Store(StoreError::QuotaExceeded { .. }))
        ));
        // Memory moved on, the store did not
        assert_eq!(history.len(), 1);
        assert_eq!(store.get("chatHistory").unwrap(), None);
    }

    #[test]
    fn test_open_rejects_corrupt_document() {
        let store = Arc::new(InMemoryStore::new());
        store.set("chatHistory", "{oops").unwrap();
        let result = ChatHistoryManager::open(store.clone(), HistoryNamespace::Chat);
        assert!(matches!(result, Err(HistoryError::Store(StoreError::Corrupt { .. }))));
    }

    #[test]
    fn test_loads_browser_written_document() {
        let store = Arc::new(InMemoryStore::new());
        let raw = r#"[{"id":"1718000000000","title":"What is paracetamol?","timestamp":"2024-06-10T06:13:20.000Z","messages":[{"content":"What is paracetamol?","isUser":true,"timestamp":"2024-06-10T06:13:18.000Z"},{"content":"Paracetamol is an analgesic.","isUser":false,"sources":[{"content":"...","metadata":{"source":"WHO.pdf","page":3}}],"medicines":[],"timestamp":"2024-06-10T06:13:20.000Z","confidence":64,"responseTime":"1.92"}]}]"#;
        store.set("chatHistory", raw).unwrap();

        let history = manager(&store);
        let thread = history.load("1718000000000").unwrap();
        assert_eq!(thread.messages[1].confidence, Some(64));
        assert_eq!(thread.messages[1].response_time, Some(1.92));
        assert_eq!(thread.messages[1].sources[0].metadata.page, Some(3));
    }
}
