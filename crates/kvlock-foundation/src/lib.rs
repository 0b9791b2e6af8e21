//! kvlock Foundation - the key-value store seam
//!
//! The lock protocol needs exactly two atomic primitives from the store it
//! runs against. This crate defines them as the [`KvStore`] trait together
//! with the compare-and-delete script that backends evaluate server-side.

pub mod ready;
pub mod script;
pub mod store;

pub use ready::{out_of_time, wait_until_ready};
pub use script::COMPARE_AND_DELETE_SCRIPT;
pub use store::{KvStore, SharedStore};
