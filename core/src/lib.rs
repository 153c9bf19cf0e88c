// Core TruthTriage client functionality:
// - HTTP client for the TruthTriage backend
// - Request/response and chat data structures
// - Confidence/risk estimation from retrieved sources
// - Session metrics, chat history, preferences
// - Configuration loading and shared error types

// Export client module - API client for the backend
pub mod client;
pub use client::*;

// Export types module - Request/response and chat data structures
pub mod types;
pub use types::*;

// Export config module - Configuration loading
pub mod config;
pub use config::*;

// Export errors module - Shared error types
pub mod errors;
pub use errors::*;

pub mod confidence;
pub mod history;
pub mod metrics;
pub mod preferences;
pub mod session;
pub mod storage;

pub use confidence::{ConfidenceEstimate, ConfidenceEstimator, StrategyKind};
pub use history::{ChatHistoryManager, ChatThread, HistoryNamespace};
pub use metrics::SessionMetrics;
pub use preferences::{Preferences, SUGGESTED_QUESTIONS};
pub use session::{ExchangeOutcome, PendingExchange, SessionProfile, TriageSession};
pub use storage::{FileStore, InMemoryStore, KeyValueStore, StoreRef};
