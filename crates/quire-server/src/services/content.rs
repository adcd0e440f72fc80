//! Content service: validated writes with slug resolution and cache invalidation

use crate::services::bookmarks::TitleFetcher;
use crate::services::fragments::FragmentCache;
use crate::services::media::{sanitize_name, MediaStore, ATTACHMENTS_DIR, PHOTOS_DIR};
use crate::services::slugs::resolve_slug;
use crate::storage::Database;
use quire_core::ports::{
    AlbumStore, AttachmentStore, BookmarkStore, PageStore, PasteStore, PhotoStore, PostStore,
    SlugKind,
};
use quire_core::{
    now, Album, Bookmark, Lexer, NewAlbum, NewAttachment, NewBookmark, NewPage, NewPaste,
    NewPhoto, NewPost, Page, Paste, Photo, Post, PostAttachment, QuireError, Result,
    PASTE_FIELD_MAX_LEN, TITLE_MAX_LEN, URL_MAX_LEN,
};
use std::sync::Arc;
use tracing::{info, warn};

/// An uploaded file as received from a multipart form
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: bytes::Bytes,
}

pub struct ContentService {
    db: Arc<Database>,
    fragments: FragmentCache,
    media: Arc<MediaStore>,
    titles: TitleFetcher,
}

fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(QuireError::InvalidInput(format!(
            "{} longer than {} characters",
            field, max
        )));
    }
    Ok(())
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(QuireError::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

impl ContentService {
    pub fn new(
        db: Arc<Database>,
        fragments: FragmentCache,
        media: Arc<MediaStore>,
        titles: TitleFetcher,
    ) -> Self {
        Self {
            db,
            fragments,
            media,
            titles,
        }
    }

    /// Pages can be included anywhere, so any page write drops every page fragment
    fn invalidate_pages(&self) {
        self.fragments.invalidate_prefix("page:");
        self.fragments.invalidate_prefix("homepage:");
    }

    // Pages

    pub async fn create_page(&self, mut page: NewPage) -> Result<Page> {
        require("title", &page.title)?;
        check_len("title", &page.title, TITLE_MAX_LEN)?;
        page.slug = resolve_slug(&*self.db, SlugKind::Page, &page.slug, &page.title).await?;

        let page = self.db.create_page(&page).await?;
        self.invalidate_pages();
        info!("Created page {}", page.slug);
        Ok(page)
    }

    /// A blank slug keeps the current one
    pub async fn update_page(&self, slug: &str, mut page: NewPage) -> Result<Page> {
        require("title", &page.title)?;
        check_len("title", &page.title, TITLE_MAX_LEN)?;
        page.slug = if page.slug.trim().is_empty() {
            slug.to_string()
        } else {
            resolve_slug(&*self.db, SlugKind::Page, &page.slug, &page.title).await?
        };

        let page = self.db.update_page(slug, &page).await?;
        self.invalidate_pages();
        info!("Updated page {}", page.slug);
        Ok(page)
    }

    pub async fn delete_page(&self, slug: &str) -> Result<()> {
        self.db.delete_page(slug).await?;
        self.invalidate_pages();
        info!("Deleted page {}", slug);
        Ok(())
    }

    // Posts

    pub async fn create_post(&self, mut post: NewPost) -> Result<Post> {
        check_len("title", &post.title, TITLE_MAX_LEN)?;
        post.slug = resolve_slug(&*self.db, SlugKind::Post, &post.slug, &post.title).await?;

        let post = self.db.create_post(&post).await?;
        info!("Created post {}", post.slug);
        Ok(post)
    }

    pub async fn update_post(&self, slug: &str, mut post: NewPost) -> Result<Post> {
        check_len("title", &post.title, TITLE_MAX_LEN)?;
        post.slug = if post.slug.trim().is_empty() {
            slug.to_string()
        } else {
            resolve_slug(&*self.db, SlugKind::Post, &post.slug, &post.title).await?
        };

        let post = self.db.update_post(slug, &post).await?;
        info!("Updated post {}", post.slug);
        Ok(post)
    }

    /// Deletes the post, its attachments and their files
    pub async fn delete_post(&self, slug: &str) -> Result<()> {
        let post = self
            .db
            .get_post(slug)
            .await?
            .ok_or_else(|| QuireError::not_found(format!("post {}", slug)))?;
        let attachments = self.db.list_attachments(post.id).await?;

        self.db.delete_post(slug).await?;
        for attachment in attachments {
            self.fragments
                .invalidate_prefix(&format!("attachment:{}:", attachment.slug));
            if let Err(e) = self.media.remove(&attachment.file).await {
                warn!("Failed to remove {}: {}", attachment.file, e);
            }
        }
        info!("Deleted post {}", slug);
        Ok(())
    }

    pub async fn add_attachment(
        &self,
        post_slug: &str,
        name: &str,
        slug: &str,
        upload: Upload,
    ) -> Result<PostAttachment> {
        let post = self
            .db
            .get_post(post_slug)
            .await?
            .ok_or_else(|| QuireError::not_found(format!("post {}", post_slug)))?;

        let name = if name.trim().is_empty() {
            upload.file_name.clone()
        } else {
            name.trim().to_string()
        };
        check_len("name", &name, TITLE_MAX_LEN)?;
        let slug = resolve_slug(&*self.db, SlugKind::Attachment, slug, &name).await?;

        let file = self
            .media
            .save(ATTACHMENTS_DIR, &upload.file_name, &upload.data, now())
            .await?;
        let attachment = NewAttachment {
            post_id: post.id,
            slug,
            name,
            file,
        };

        match self.db.create_attachment(&attachment).await {
            Ok(created) => {
                self.fragments
                    .invalidate_prefix(&format!("attachment:{}:", created.slug));
                info!("Attached {} to post {}", created.file, post.slug);
                Ok(created)
            }
            Err(e) => {
                let _ = self.media.remove(&attachment.file).await;
                Err(e)
            }
        }
    }

    // Bookmarks

    /// A blank title is looked up from the bookmarked page, falling back to the URL
    pub async fn create_bookmark(&self, mut bookmark: NewBookmark) -> Result<Bookmark> {
        bookmark.url = bookmark.url.trim().to_string();
        require("url", &bookmark.url)?;
        check_len("url", &bookmark.url, URL_MAX_LEN)?;
        if !(bookmark.url.starts_with("http://") || bookmark.url.starts_with("https://")) {
            return Err(QuireError::InvalidInput(
                "url must start with http:// or https://".to_string(),
            ));
        }

        if bookmark.title.trim().is_empty() {
            bookmark.title = match self.titles.fetch_title(&bookmark.url).await {
                Ok(title) => title,
                Err(e) => {
                    warn!("Bookmark title lookup failed: {}", e);
                    bookmark.url.clone()
                }
            };
        }
        bookmark.title = bookmark.title.chars().take(TITLE_MAX_LEN).collect();
        bookmark.slug =
            resolve_slug(&*self.db, SlugKind::Bookmark, &bookmark.slug, &bookmark.title).await?;

        let bookmark = self.db.create_bookmark(&bookmark).await?;
        info!("Created bookmark {}", bookmark.slug);
        Ok(bookmark)
    }

    pub async fn delete_bookmark(&self, slug: &str) -> Result<()> {
        self.db.delete_bookmark(slug).await?;
        info!("Deleted bookmark {}", slug);
        Ok(())
    }

    // Pastes

    pub async fn create_paste(&self, paste: NewPaste) -> Result<Paste> {
        require("text", &paste.text)?;
        if Lexer::from_code(&paste.lexer).is_none() {
            return Err(QuireError::InvalidInput(format!(
                "unknown lexer {:?}",
                paste.lexer
            )));
        }
        check_len("title", &paste.title, PASTE_FIELD_MAX_LEN)?;
        check_len("group", &paste.group, PASTE_FIELD_MAX_LEN)?;

        let paste = self.db.create_paste(&paste).await?;
        info!("Created paste {}", paste.id);
        Ok(paste)
    }

    pub async fn delete_paste(&self, id: i64) -> Result<()> {
        self.db.delete_paste(id).await?;
        info!("Deleted paste {}", id);
        Ok(())
    }

    // Albums and photos

    pub async fn create_album(&self, mut album: NewAlbum) -> Result<Album> {
        require("title", &album.title)?;
        check_len("title", &album.title, TITLE_MAX_LEN)?;
        album.slug = resolve_slug(&*self.db, SlugKind::Album, &album.slug, &album.title).await?;

        let album = self.db.create_album(&album).await?;
        info!("Created album {}", album.slug);
        Ok(album)
    }

    pub async fn add_photo(
        &self,
        album_slug: &str,
        title: &str,
        description: &str,
        upload: Upload,
    ) -> Result<Photo> {
        let album = self
            .db
            .get_album(album_slug)
            .await?
            .ok_or_else(|| QuireError::not_found(format!("album {}", album_slug)))?;
        check_len("title", title, TITLE_MAX_LEN)?;

        let slug_source = if title.trim().is_empty() {
            sanitize_name(&upload.file_name).0
        } else {
            title.to_string()
        };
        let slug = resolve_slug(&*self.db, SlugKind::Photo, "", &slug_source).await?;
        let image = self
            .media
            .save(PHOTOS_DIR, &upload.file_name, &upload.data, now())
            .await?;

        let photo = NewPhoto {
            album_id: album.id,
            slug,
            title: title.trim().to_string(),
            description: description.to_string(),
            image,
        };
        match self.db.create_photo(&photo).await {
            Ok(created) => {
                info!("Added photo {} to album {}", created.slug, album.slug);
                Ok(created)
            }
            Err(e) => {
                let _ = self.media.remove(&photo.image).await;
                Err(e)
            }
        }
    }
}
