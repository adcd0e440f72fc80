//! Quire Core Library
//!
//! Domain error type and the storage ports the web server is written against.

// Re-export pure types from quire-types
pub use quire_types::*;

pub mod error;
pub mod ports;

pub use error::{QuireError, Result};
