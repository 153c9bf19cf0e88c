use tracing::debug;

use crate::storage::{load_document, save_document, StoreError, StoreRef};

const SHOW_SUGGESTIONS_KEY: &str = "showSuggestions";

/// Prompts offered to a user who has not typed anything yet
pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "What medicines are mentioned in the document?",
    "Tell me about the first medicine listed",
    "What are the uses mentioned?",
    "What does the document say about dosage?",
];

/// User preferences persisted next to the chat history
#[derive(Debug, Clone)]
pub struct Preferences {
    store: StoreRef,
}

impl Preferences {
    pub fn new(store: StoreRef) -> Self {
        Self { store }
    }

    /// Whether suggested questions are shown; on until turned off
    pub fn show_suggestions(&self) -> Result<bool, StoreError> {
        Ok(load_document::<bool>(self.store.as_ref(), SHOW_SUGGESTIONS_KEY)?.unwrap_or(true))
    }

    pub fn set_show_suggestions(&self, show: bool) -> Result<(), StoreError> {
        debug!("Setting showSuggestions to {}", show);
        save_document(self.store.as_ref(), SHOW_SUGGESTIONS_KEY, &show)
    }

    /// Flip the flag and return its new value
    pub fn toggle_suggestions(&self) -> Result<bool, StoreError> {
        let show = !self.show_suggestions()?;
        self.set_show_suggestions(show)?;
        Ok(show)
    }
}
