//! Dedup engine and durable notified-id store.

pub mod dedup;
pub mod state;

pub use state::{NotifiedSet, StateStore};
