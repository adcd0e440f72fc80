//! Storage traits for persistence

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use quire_types::{
    Album, Bookmark, NewAlbum, NewAttachment, NewBookmark, NewPage, NewPaste, NewPhoto, NewPost,
    Page, Paste, Photo, PhotoEntry, Post, PostAttachment, User,
};

/// Tables whose rows carry a unique slug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlugKind {
    Page,
    Post,
    Attachment,
    Bookmark,
    Album,
    Photo,
}

impl SlugKind {
    pub fn table(&self) -> &'static str {
        match self {
            SlugKind::Page => "pages",
            SlugKind::Post => "posts",
            SlugKind::Attachment => "post_attachments",
            SlugKind::Bookmark => "bookmarks",
            SlugKind::Album => "albums",
            SlugKind::Photo => "photos",
        }
    }

    pub fn max_len(&self) -> usize {
        match self {
            SlugKind::Attachment => quire_types::ATTACHMENT_SLUG_MAX_LEN,
            _ => quire_types::SLUG_MAX_LEN,
        }
    }
}

/// Date-based archive filter: a whole year or a single month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Archive {
    pub year: i32,
    pub month: Option<u32>,
}

impl Archive {
    /// `None` when the year is out of range
    pub fn year(year: i32) -> Option<Self> {
        let archive = Self { year, month: None };
        archive.range().map(|_| archive)
    }

    /// `None` when the month is not 1..=12 or the year is out of range
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let archive = Self {
            year,
            month: Some(month),
        };
        archive.range().map(|_| archive)
    }

    /// Half-open `[start, end)` interval covered by this archive
    pub fn range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (start_month, end_year, end_month) = match self.month {
            None => (1, self.year.checked_add(1)?, 1),
            Some(12) => (12, self.year.checked_add(1)?, 1),
            Some(m) => (m, self.year, m + 1),
        };
        let start = Utc
            .with_ymd_and_hms(self.year, start_month, 1, 0, 0, 0)
            .single()?;
        let end = Utc
            .with_ymd_and_hms(end_year, end_month, 1, 0, 0, 0)
            .single()?;
        Some((start, end))
    }
}

/// Distinct years of the given dates, newest first
pub fn distinct_years<I>(dates: I) -> Vec<i32>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut years: Vec<i32> = dates.into_iter().map(|d| d.year()).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

/// Slug lookups used when deriving unique slugs
#[async_trait]
pub trait SlugIndex: Send + Sync {
    async fn slug_exists(&self, kind: SlugKind, slug: &str) -> Result<bool>;
}

/// Page store
#[async_trait]
pub trait PageStore: Send + Sync {
    /// `page.slug` must already be resolved
    async fn create_page(&self, page: &NewPage) -> Result<Page>;
    async fn get_page(&self, slug: &str) -> Result<Option<Page>>;
    async fn update_page(&self, slug: &str, page: &NewPage) -> Result<Page>;
    async fn delete_page(&self, slug: &str) -> Result<()>;
    async fn list_pages(&self, public_only: bool) -> Result<Vec<Page>>;
}

/// Post store
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, post: &NewPost) -> Result<Post>;
    async fn get_post(&self, slug: &str) -> Result<Option<Post>>;
    async fn update_post(&self, slug: &str, post: &NewPost) -> Result<Post>;
    async fn delete_post(&self, slug: &str) -> Result<()>;
    async fn count_public_posts(&self, archive: Option<Archive>) -> Result<u64>;
    async fn list_public_posts(
        &self,
        archive: Option<Archive>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>>;
    /// Public posts whose tag string mentions `tag`; callers refine with `Post::has_tag`
    async fn list_public_posts_mentioning(&self, tag: &str) -> Result<Vec<Post>>;
    async fn public_post_years(&self) -> Result<Vec<i32>>;
}

/// Post attachment store
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn create_attachment(&self, attachment: &NewAttachment) -> Result<PostAttachment>;
    async fn get_attachment(&self, slug: &str) -> Result<Option<PostAttachment>>;
    async fn list_attachments(&self, post_id: i64) -> Result<Vec<PostAttachment>>;
}

/// Bookmark store
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark>;
    async fn get_bookmark(&self, slug: &str) -> Result<Option<Bookmark>>;
    async fn delete_bookmark(&self, slug: &str) -> Result<()>;
    async fn count_public_bookmarks(&self) -> Result<u64>;
    async fn list_public_bookmarks(&self, offset: u64, limit: u64) -> Result<Vec<Bookmark>>;
}

/// Paste store
#[async_trait]
pub trait PasteStore: Send + Sync {
    async fn create_paste(&self, paste: &NewPaste) -> Result<Paste>;
    async fn get_paste(&self, id: i64) -> Result<Option<Paste>>;
    async fn delete_paste(&self, id: i64) -> Result<()>;
    async fn latest_pastes(&self, limit: u64) -> Result<Vec<Paste>>;
    async fn pastes_in_group(&self, group: &str) -> Result<Vec<Paste>>;
}

/// Album store
#[async_trait]
pub trait AlbumStore: Send + Sync {
    async fn create_album(&self, album: &NewAlbum) -> Result<Album>;
    async fn get_album(&self, slug: &str) -> Result<Option<Album>>;
    async fn latest_albums(&self, limit: u64) -> Result<Vec<Album>>;
    async fn album_years(&self) -> Result<Vec<i32>>;
}

/// Photo store
#[async_trait]
pub trait PhotoStore: Send + Sync {
    async fn create_photo(&self, photo: &NewPhoto) -> Result<Photo>;
    /// Lookup scoped to one album
    async fn get_photo_in_album(&self, album_id: i64, slug: &str) -> Result<Option<Photo>>;
    async fn photos_in_album(&self, album_id: i64) -> Result<Vec<Photo>>;
    async fn latest_photos(&self, limit: u64) -> Result<Vec<PhotoEntry>>;
    async fn photo_years(&self) -> Result<Vec<i32>>;
}

/// User store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, email: &str, password_hash: &str, name: Option<&str>)
        -> Result<User>;
    async fn get_user(&self, id: &str) -> Result<Option<User>>;
    /// The user together with their password hash
    async fn get_user_by_email(&self, email: &str) -> Result<Option<(User, String)>>;
}
