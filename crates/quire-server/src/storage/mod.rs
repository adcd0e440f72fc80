//! Storage layer
//!
//! SQLite (embedded) for content, DashMap (in-memory) for rendered fragments.

pub mod db;
pub mod memory;

pub use db::Database;
pub use memory::MemoryCache;
