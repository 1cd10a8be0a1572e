//! Storage module
//!
//! Durable key-value storage backing the settings store.

pub mod kv_store;

pub use kv_store::{JsonFileStore, KeyValueStore, MemoryStore};
