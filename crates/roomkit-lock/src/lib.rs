//! `roomkit-lock` — per-room exclusive sections backing the inbound
//! pipeline's serialization guarantee, with an LRU-bounded registry.

pub mod manager;

pub use manager::{LockManager, Section};
