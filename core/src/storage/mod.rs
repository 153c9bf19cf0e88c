//! Local persistence for TruthTriage
//!
//! Everything the client keeps between runs (chat threads, preferences) is a
//! named JSON document in a `KeyValueStore`. The trait is injected so that
//! tests and ephemeral sessions can use the in-memory adapter while the CLI
//! writes files under its data directory.

pub mod adapters;
pub mod store;

pub use adapters::{FileStore, InMemoryStore};
pub use store::{clear_document, load_document, save_document, KeyValueStore, StoreError, StoreRef};
