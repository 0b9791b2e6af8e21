//! kvlock Store - key-value store backends
//!
//! This crate provides:
//! - `RedisStore`: `SET NX PX` claims and a Lua compare-and-delete script
//! - `MemoryStore`: in-process store with the same atomic semantics
//! - `StoreConfig` and [`connect`] to build a backend from configuration

mod config;
mod memory;
mod redis_store;

pub use config::{StoreBackend, StoreConfig, connect};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
