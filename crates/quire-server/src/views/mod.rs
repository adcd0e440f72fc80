//! HTML views (maud)

pub mod layout;
pub mod paste;
pub mod photo;
pub mod web;

pub use layout::{error_document, Site};
