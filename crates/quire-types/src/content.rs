//! Site content: pages, posts, attachments, bookmarks and pastes

use crate::{tags::parse_tags, Status};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SLUG_MAX_LEN: usize = 100;
pub const ATTACHMENT_SLUG_MAX_LEN: usize = 200;
pub const TITLE_MAX_LEN: usize = 500;
pub const URL_MAX_LEN: usize = 1000;
pub const PASTE_FIELD_MAX_LEN: usize = 100;

/// A standalone page, also usable as an includable block of content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    /// Content is Markdown
    pub markup: bool,
    pub status: Status,
    pub owner: Option<String>,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

impl Page {
    pub fn url(&self) -> String {
        format!("/page/{}/", self.slug)
    }

    pub fn is_public(&self) -> bool {
        self.status == Status::Public
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Page: {}", self.title)
    }
}

/// Page creation/update request. A blank slug is derived from the title.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPage {
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub markup: bool,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Blog post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub markup: bool,
    pub status: Status,
    pub owner: Option<String>,
    /// Free-form tag string, comma or whitespace separated
    pub tags: String,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

impl Post {
    pub fn url(&self) -> String {
        format!("/post/{}/", self.slug)
    }

    pub fn is_public(&self) -> bool {
        self.status == Status::Public
    }

    pub fn tag_list(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list().iter().any(|t| t == tag)
    }
}

impl std::fmt::Display for Post {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Post: {}", self.title)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub markup: bool,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub tags: String,
    /// Backdate a post; defaults to now
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
}

/// File attached to a post, addressable from content by its slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAttachment {
    pub id: i64,
    pub post_id: i64,
    pub slug: String,
    pub name: String,
    /// Path relative to the media root
    pub file: String,
}

impl PostAttachment {
    /// Last path segment of the stored file
    pub fn file_name(&self) -> &str {
        file_name(&self.file)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAttachment {
    pub post_id: i64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
    pub file: String,
}

/// Strip everything up to the last `/`
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Saved link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub url: String,
    pub tags: String,
    pub owner: Option<String>,
    pub public: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

impl Bookmark {
    pub fn permalink(&self) -> String {
        format!("/bookmark/{}/", self.slug)
    }

    pub fn tag_list(&self) -> Vec<String> {
        parse_tags(&self.tags)
    }
}

impl std::fmt::Display for Bookmark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.slug)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookmark {
    /// Fetched from the page `<title>` when blank
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    pub url: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default = "default_true")]
    pub public: bool,
}

fn default_true() -> bool {
    true
}

/// Languages a paste can be tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lexer {
    Text,
    Py,
    Rs,
    C,
    Cpp,
    Js,
    Sh,
    Html,
    Css,
    Sql,
    Diff,
    Java,
    Go,
    Ruby,
    Lisp,
}

impl Lexer {
    pub const ALL: [Lexer; 15] = [
        Lexer::Text,
        Lexer::Py,
        Lexer::Rs,
        Lexer::C,
        Lexer::Cpp,
        Lexer::Js,
        Lexer::Sh,
        Lexer::Html,
        Lexer::Css,
        Lexer::Sql,
        Lexer::Diff,
        Lexer::Java,
        Lexer::Go,
        Lexer::Ruby,
        Lexer::Lisp,
    ];

    /// Stored code, at most five characters
    pub fn code(&self) -> &'static str {
        match self {
            Lexer::Text => "text",
            Lexer::Py => "py",
            Lexer::Rs => "rs",
            Lexer::C => "c",
            Lexer::Cpp => "cpp",
            Lexer::Js => "js",
            Lexer::Sh => "sh",
            Lexer::Html => "html",
            Lexer::Css => "css",
            Lexer::Sql => "sql",
            Lexer::Diff => "diff",
            Lexer::Java => "java",
            Lexer::Go => "go",
            Lexer::Ruby => "ruby",
            Lexer::Lisp => "lisp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Lexer::Text => "Plain text",
            Lexer::Py => "Python",
            Lexer::Rs => "Rust",
            Lexer::C => "C",
            Lexer::Cpp => "C++",
            Lexer::Js => "JavaScript",
            Lexer::Sh => "Shell",
            Lexer::Html => "HTML",
            Lexer::Css => "CSS",
            Lexer::Sql => "SQL",
            Lexer::Diff => "Diff",
            Lexer::Java => "Java",
            Lexer::Go => "Go",
            Lexer::Ruby => "Ruby",
            Lexer::Lisp => "Lisp",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.code() == code)
    }
}

/// Pasted snippet of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paste {
    pub id: i64,
    pub text: String,
    pub lexer: String,
    pub title: String,
    pub group: String,
    pub created: DateTime<Utc>,
}

impl Paste {
    pub fn url(&self) -> String {
        format!("/paste/{}/", self.id)
    }

    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            format!("Paste #{}", self.id)
        } else {
            self.title.clone()
        }
    }
}

impl std::fmt::Display for Paste {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Paste: {}", self.title)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPaste {
    pub text: String,
    pub lexer: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub group: String,
}
