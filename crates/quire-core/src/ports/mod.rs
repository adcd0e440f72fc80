//! Ports (traits) for external dependencies

pub mod storage;

pub use storage::*;
