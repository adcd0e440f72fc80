//! Quire Types - Pure type definitions
//!
//! Models, status values and the small pure helpers (slugs, tag lists,
//! pagination) shared by the storage layer and the web server.

pub mod content;
pub mod pagination;
pub mod photo;
pub mod slug;
pub mod tags;
pub mod user;

pub use content::*;
pub use pagination::{PageWindow, Paginator};
pub use photo::*;
pub use slug::{numbered, slug_or_null, slugify};
pub use tags::parse_tags;
pub use user::*;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Publication status of pages and posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Public,
    Private,
    #[default]
    Draft,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Public => "public",
            Status::Private => "private",
            Status::Draft => "draft",
        }
    }

    /// Unknown values fall back to `Draft` so a bad row never becomes public.
    pub fn parse(s: &str) -> Self {
        match s {
            "public" => Status::Public,
            "private" => Status::Private,
            _ => Status::Draft,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current time truncated to whole seconds, the resolution stored in the database
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_is_lenient() {
        assert_eq!(Status::parse("public"), Status::Public);
        assert_eq!(Status::parse("private"), Status::Private);
        assert_eq!(Status::parse("draft"), Status::Draft);
        assert_eq!(Status::parse("published"), Status::Draft);
        assert_eq!(Status::default(), Status::Draft);
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&Status::Public).unwrap();
        assert_eq!(json, "\"public\"");
        let parsed: Status = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(parsed, Status::Private);
    }

    #[test]
    fn test_now_has_no_subseconds() {
        use chrono::Timelike;
        assert_eq!(now().nanosecond(), 0);
    }
}
