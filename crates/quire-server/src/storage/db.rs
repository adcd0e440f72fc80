//! SQLite database layer (embedded, no external dependencies)

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quire_core::ports::{
    distinct_years, AlbumStore, Archive, AttachmentStore, BookmarkStore, PageStore, PasteStore,
    PhotoStore, PostStore, SlugIndex, SlugKind, UserStore,
};
use quire_core::{
    now, Album, Bookmark, NewAlbum, NewAttachment, NewBookmark, NewPage, NewPaste, NewPhoto,
    NewPost, Page, Paste, Photo, PhotoEntry, Post, PostAttachment, QuireError, Result, Status,
    User,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub struct Database {
    pool: Arc<SqlitePool>,
}

/// Map sqlx failures onto domain errors; unique violations become conflicts
pub fn db_err(e: sqlx::Error) -> QuireError {
    match &e {
        sqlx::Error::RowNotFound => QuireError::NotFound("row".to_string()),
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            QuireError::Conflict(db.message().to_string())
        }
        _ => QuireError::Database(e.to_string()),
    }
}

impl Database {
    pub async fn new(database_path: &Path) -> anyhow::Result<Self> {
        tracing::info!("Opening SQLite database at: {}", database_path.display());

        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create database directory: {}", parent.display())
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .with_context(|| {
                format!(
                    "Failed to connect to SQLite database at: {}",
                    database_path.display()
                )
            })?;

        tracing::info!("SQLite connection established, running migrations...");
        Self::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        tracing::info!("Database initialization complete");

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    /// Private in-memory database; one connection so every query sees the same data
    pub async fn in_memory() -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::run_migrations(&pool).await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn run_migrations(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                name TEXT,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS pages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT UNIQUE NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                markup INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'draft',
                owner TEXT REFERENCES users(id) ON DELETE SET NULL,
                created_date TEXT NOT NULL,
                modified_date TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_pages_status ON pages(status)",
            "CREATE INDEX IF NOT EXISTS idx_pages_title ON pages(title)",
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT UNIQUE NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                markup INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'draft',
                owner TEXT REFERENCES users(id) ON DELETE SET NULL,
                tags TEXT NOT NULL DEFAULT '',
                created_date TEXT NOT NULL,
                modified_date TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_posts_status_created ON posts(status, created_date)",
            "CREATE INDEX IF NOT EXISTS idx_posts_tags ON posts(tags)",
            r#"
            CREATE TABLE IF NOT EXISTS post_attachments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                slug TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                file TEXT NOT NULL DEFAULT ''
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS bookmarks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL DEFAULT '',
                slug TEXT UNIQUE NOT NULL,
                url TEXT NOT NULL,
                tags TEXT NOT NULL DEFAULT '',
                owner TEXT REFERENCES users(id) ON DELETE SET NULL,
                public INTEGER NOT NULL DEFAULT 1,
                created_date TEXT NOT NULL,
                modified_date TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_bookmarks_url ON bookmarks(url)",
            r#"
            CREATE TABLE IF NOT EXISTS paste (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text TEXT NOT NULL,
                lexer TEXT NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                "group" TEXT NOT NULL DEFAULT '',
                created TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS albums (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug TEXT UNIQUE NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                owner TEXT REFERENCES users(id) ON DELETE SET NULL,
                created_date TEXT NOT NULL,
                modified_date TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS photos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                album_id INTEGER NOT NULL REFERENCES albums(id) ON DELETE CASCADE,
                slug TEXT UNIQUE NOT NULL,
                title TEXT NOT NULL DEFAULT '',
                description TEXT NOT NULL DEFAULT '',
                image TEXT NOT NULL,
                created_date TEXT NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_photos_album ON photos(album_id, created_date)",
        ];

        for statement in statements {
            sqlx::query(statement).execute(pool).await?;
        }
        Ok(())
    }

    async fn page_by_id(&self, id: i64) -> Result<Page> {
        let row: PageRow = sqlx::query_as(
            r#"
            SELECT id, slug, title, content, markup, status, owner, created_date, modified_date
            FROM pages WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&*self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }

    async fn post_by_id(&self, id: i64) -> Result<Post> {
        let row: PostRow = sqlx::query_as(
            r#"
            SELECT id, slug, title, content, markup, status, owner, tags,
                   created_date, modified_date
            FROM posts WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_one(&*self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.into())
    }
}

#[async_trait]
impl SlugIndex for Database {
    async fn slug_exists(&self, kind: SlugKind, slug: &str) -> Result<bool> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE slug = ?1", kind.table());
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(slug)
            .fetch_one(&*self.pool)
            .await
            .map_err(db_err)?;
        Ok(count > 0)
    }
}

// Page operations
#[async_trait]
impl PageStore for Database {
    async fn create_page(&self, page: &NewPage) -> Result<Page> {
        let ts = now();
        let id = sqlx::query(
            r#"
            INSERT INTO pages (slug, title, content, markup, status, owner, created_date, modified_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&page.content)
        .bind(page.markup)
        .bind(page.status.as_str())
        .bind(&page.owner)
        .bind(ts)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        self.page_by_id(id).await
    }

    async fn get_page(&self, slug: &str) -> Result<Option<Page>> {
        let row: Option<PageRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, content, markup, status, owner, created_date, modified_date
            FROM pages WHERE slug = ?1
            "#,
        )
        .bind(slug)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn update_page(&self, slug: &str, page: &NewPage) -> Result<Page> {
        let result = sqlx::query(
            r#"
            UPDATE pages
            SET slug = ?1, title = ?2, content = ?3, markup = ?4, status = ?5,
                owner = ?6, modified_date = ?7
            WHERE slug = ?8
            "#,
        )
        .bind(&page.slug)
        .bind(&page.title)
        .bind(&page.content)
        .bind(page.markup)
        .bind(page.status.as_str())
        .bind(&page.owner)
        .bind(now())
        .bind(slug)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(QuireError::not_found(format!("page {}", slug)));
        }
        self.get_page(&page.slug)
            .await?
            .ok_or_else(|| QuireError::not_found(format!("page {}", page.slug)))
    }

    async fn delete_page(&self, slug: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM pages WHERE slug = ?1")
            .bind(slug)
            .execute(&*self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(QuireError::not_found(format!("page {}", slug)));
        }
        Ok(())
    }

    async fn list_pages(&self, public_only: bool) -> Result<Vec<Page>> {
        let rows: Vec<PageRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, content, markup, status, owner, created_date, modified_date
            FROM pages
            WHERE (?1 = 0 OR status = 'public')
            ORDER BY title ASC
            "#,
        )
        .bind(public_only)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// Post operations
#[async_trait]
impl PostStore for Database {
    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        let ts = now();
        let created = post.created_date.unwrap_or(ts);
        let id = sqlx::query(
            r#"
            INSERT INTO posts (slug, title, content, markup, status, owner, tags,
                               created_date, modified_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.markup)
        .bind(post.status.as_str())
        .bind(&post.owner)
        .bind(&post.tags)
        .bind(created)
        .bind(ts)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        self.post_by_id(id).await
    }

    async fn get_post(&self, slug: &str) -> Result<Option<Post>> {
        let row: Option<PostRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, content, markup, status, owner, tags,
                   created_date, modified_date
            FROM posts WHERE slug = ?1
            "#,
        )
        .bind(slug)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn update_post(&self, slug: &str, post: &NewPost) -> Result<Post> {
        let existing = self
            .get_post(slug)
            .await?
            .ok_or_else(|| QuireError::not_found(format!("post {}", slug)))?;
        let created = post.created_date.unwrap_or(existing.created_date);

        sqlx::query(
            r#"
            UPDATE posts
            SET slug = ?1, title = ?2, content = ?3, markup = ?4, status = ?5,
                owner = ?6, tags = ?7, created_date = ?8, modified_date = ?9
            WHERE id = ?10
            "#,
        )
        .bind(&post.slug)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.markup)
        .bind(post.status.as_str())
        .bind(&post.owner)
        .bind(&post.tags)
        .bind(created)
        .bind(now())
        .bind(existing.id)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?;

        self.post_by_id(existing.id).await
    }

    async fn delete_post(&self, slug: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM posts WHERE slug = ?1")
            .bind(slug)
            .execute(&*self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(QuireError::not_found(format!("post {}", slug)));
        }
        Ok(())
    }

    async fn count_public_posts(&self, archive: Option<Archive>) -> Result<u64> {
        let (start, end) = archive_bounds(archive)?;
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM posts
            WHERE status = 'public'
              AND (?1 IS NULL OR created_date >= ?1)
              AND (?2 IS NULL OR created_date < ?2)
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(count.max(0) as u64)
    }

    async fn list_public_posts(
        &self,
        archive: Option<Archive>,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>> {
        let (start, end) = archive_bounds(archive)?;
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, content, markup, status, owner, tags,
                   created_date, modified_date
            FROM posts
            WHERE status = 'public'
              AND (?1 IS NULL OR created_date >= ?1)
              AND (?2 IS NULL OR created_date < ?2)
            ORDER BY created_date DESC, id DESC
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn list_public_posts_mentioning(&self, tag: &str) -> Result<Vec<Post>> {
        let rows: Vec<PostRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, content, markup, status, owner, tags,
                   created_date, modified_date
            FROM posts
            WHERE status = 'public' AND instr(tags, ?1) > 0
            ORDER BY created_date DESC, id DESC
            "#,
        )
        .bind(tag)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn public_post_years(&self) -> Result<Vec<i32>> {
        let dates: Vec<(DateTime<Utc>,)> =
            sqlx::query_as("SELECT created_date FROM posts WHERE status = 'public'")
                .fetch_all(&*self.pool)
                .await
                .map_err(db_err)?;
        Ok(distinct_years(dates.into_iter().map(|(d,)| d)))
    }
}

fn archive_bounds(
    archive: Option<Archive>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
    match archive {
        None => Ok((None, None)),
        Some(a) => {
            let (start, end) = a
                .range()
                .ok_or_else(|| QuireError::InvalidInput(format!("invalid archive {:?}", a)))?;
            Ok((Some(start), Some(end)))
        }
    }
}

// Attachment operations
#[async_trait]
impl AttachmentStore for Database {
    async fn create_attachment(&self, attachment: &NewAttachment) -> Result<PostAttachment> {
        let id = sqlx::query(
            r#"
            INSERT INTO post_attachments (post_id, slug, name, file)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(attachment.post_id)
        .bind(&attachment.slug)
        .bind(&attachment.name)
        .bind(&attachment.file)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        Ok(PostAttachment {
            id,
            post_id: attachment.post_id,
            slug: attachment.slug.clone(),
            name: attachment.name.clone(),
            file: attachment.file.clone(),
        })
    }

    async fn get_attachment(&self, slug: &str) -> Result<Option<PostAttachment>> {
        let row: Option<AttachmentRow> = sqlx::query_as(
            "SELECT id, post_id, slug, name, file FROM post_attachments WHERE slug = ?1",
        )
        .bind(slug)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn list_attachments(&self, post_id: i64) -> Result<Vec<PostAttachment>> {
        let rows: Vec<AttachmentRow> = sqlx::query_as(
            r#"
            SELECT id, post_id, slug, name, file FROM post_attachments
            WHERE post_id = ?1 ORDER BY id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// Bookmark operations
#[async_trait]
impl BookmarkStore for Database {
    async fn create_bookmark(&self, bookmark: &NewBookmark) -> Result<Bookmark> {
        let ts = now();
        let id = sqlx::query(
            r#"
            INSERT INTO bookmarks (title, slug, url, tags, owner, public, created_date, modified_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
            "#,
        )
        .bind(&bookmark.title)
        .bind(&bookmark.slug)
        .bind(&bookmark.url)
        .bind(&bookmark.tags)
        .bind(&bookmark.owner)
        .bind(bookmark.public)
        .bind(ts)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        Ok(Bookmark {
            id,
            title: bookmark.title.clone(),
            slug: bookmark.slug.clone(),
            url: bookmark.url.clone(),
            tags: bookmark.tags.clone(),
            owner: bookmark.owner.clone(),
            public: bookmark.public,
            created_date: ts,
            modified_date: ts,
        })
    }

    async fn get_bookmark(&self, slug: &str) -> Result<Option<Bookmark>> {
        let row: Option<BookmarkRow> = sqlx::query_as(
            r#"
            SELECT id, title, slug, url, tags, owner, public, created_date, modified_date
            FROM bookmarks WHERE slug = ?1
            "#,
        )
        .bind(slug)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn delete_bookmark(&self, slug: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE slug = ?1")
            .bind(slug)
            .execute(&*self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(QuireError::not_found(format!("bookmark {}", slug)));
        }
        Ok(())
    }

    async fn count_public_bookmarks(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookmarks WHERE public = 1")
            .fetch_one(&*self.pool)
            .await
            .map_err(db_err)?;
        Ok(count.max(0) as u64)
    }

    async fn list_public_bookmarks(&self, offset: u64, limit: u64) -> Result<Vec<Bookmark>> {
        let rows: Vec<BookmarkRow> = sqlx::query_as(
            r#"
            SELECT id, title, slug, url, tags, owner, public, created_date, modified_date
            FROM bookmarks WHERE public = 1
            ORDER BY created_date DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// Paste operations
#[async_trait]
impl PasteStore for Database {
    async fn create_paste(&self, paste: &NewPaste) -> Result<Paste> {
        let ts = now();
        let id = sqlx::query(
            r#"
            INSERT INTO paste (text, lexer, title, "group", created)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&paste.text)
        .bind(&paste.lexer)
        .bind(&paste.title)
        .bind(&paste.group)
        .bind(ts)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        Ok(Paste {
            id,
            text: paste.text.clone(),
            lexer: paste.lexer.clone(),
            title: paste.title.clone(),
            group: paste.group.clone(),
            created: ts,
        })
    }

    async fn get_paste(&self, id: i64) -> Result<Option<Paste>> {
        let row: Option<PasteRow> = sqlx::query_as(
            r#"SELECT id, text, lexer, title, "group", created FROM paste WHERE id = ?1"#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn delete_paste(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM paste WHERE id = ?1")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(QuireError::not_found(format!("paste {}", id)));
        }
        Ok(())
    }

    async fn latest_pastes(&self, limit: u64) -> Result<Vec<Paste>> {
        let rows: Vec<PasteRow> = sqlx::query_as(
            r#"
            SELECT id, text, lexer, title, "group", created FROM paste
            ORDER BY created DESC, id DESC LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn pastes_in_group(&self, group: &str) -> Result<Vec<Paste>> {
        let rows: Vec<PasteRow> = sqlx::query_as(
            r#"
            SELECT id, text, lexer, title, "group", created FROM paste
            WHERE "group" = ?1 ORDER BY created DESC, id DESC
            "#,
        )
        .bind(group)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }
}

// Album operations
#[async_trait]
impl AlbumStore for Database {
    async fn create_album(&self, album: &NewAlbum) -> Result<Album> {
        let ts = now();
        let id = sqlx::query(
            r#"
            INSERT INTO albums (slug, title, description, owner, created_date, modified_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
        )
        .bind(&album.slug)
        .bind(&album.title)
        .bind(&album.description)
        .bind(&album.owner)
        .bind(ts)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        Ok(Album {
            id,
            slug: album.slug.clone(),
            title: album.title.clone(),
            description: album.description.clone(),
            owner: album.owner.clone(),
            created_date: ts,
            modified_date: ts,
        })
    }

    async fn get_album(&self, slug: &str) -> Result<Option<Album>> {
        let row: Option<AlbumRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, description, owner, created_date, modified_date
            FROM albums WHERE slug = ?1
            "#,
        )
        .bind(slug)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn latest_albums(&self, limit: u64) -> Result<Vec<Album>> {
        let rows: Vec<AlbumRow> = sqlx::query_as(
            r#"
            SELECT id, slug, title, description, owner, created_date, modified_date
            FROM albums ORDER BY created_date DESC, id DESC LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn album_years(&self) -> Result<Vec<i32>> {
        let dates: Vec<(DateTime<Utc>,)> = sqlx::query_as("SELECT created_date FROM albums")
            .fetch_all(&*self.pool)
            .await
            .map_err(db_err)?;
        Ok(distinct_years(dates.into_iter().map(|(d,)| d)))
    }
}

// Photo operations
#[async_trait]
impl PhotoStore for Database {
    async fn create_photo(&self, photo: &NewPhoto) -> Result<Photo> {
        let ts = now();
        let id = sqlx::query(
            r#"
            INSERT INTO photos (album_id, slug, title, description, image, created_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(photo.album_id)
        .bind(&photo.slug)
        .bind(&photo.title)
        .bind(&photo.description)
        .bind(&photo.image)
        .bind(ts)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?
        .last_insert_rowid();

        Ok(Photo {
            id,
            album_id: photo.album_id,
            slug: photo.slug.clone(),
            title: photo.title.clone(),
            description: photo.description.clone(),
            image: photo.image.clone(),
            created_date: ts,
        })
    }

    async fn get_photo_in_album(&self, album_id: i64, slug: &str) -> Result<Option<Photo>> {
        let row: Option<PhotoRow> = sqlx::query_as(
            r#"
            SELECT id, album_id, slug, title, description, image, created_date
            FROM photos WHERE album_id = ?1 AND slug = ?2
            "#,
        )
        .bind(album_id)
        .bind(slug)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into()))
    }

    async fn photos_in_album(&self, album_id: i64) -> Result<Vec<Photo>> {
        let rows: Vec<PhotoRow> = sqlx::query_as(
            r#"
            SELECT id, album_id, slug, title, description, image, created_date
            FROM photos WHERE album_id = ?1
            ORDER BY created_date DESC, id DESC
            "#,
        )
        .bind(album_id)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn latest_photos(&self, limit: u64) -> Result<Vec<PhotoEntry>> {
        let rows: Vec<PhotoEntryRow> = sqlx::query_as(
            r#"
            SELECT p.id, p.album_id, p.slug, p.title, p.description, p.image, p.created_date,
                   a.slug AS album_slug
            FROM photos p JOIN albums a ON a.id = p.album_id
            ORDER BY p.created_date DESC, p.id DESC LIMIT ?1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    async fn photo_years(&self) -> Result<Vec<i32>> {
        let dates: Vec<(DateTime<Utc>,)> = sqlx::query_as("SELECT created_date FROM photos")
            .fetch_all(&*self.pool)
            .await
            .map_err(db_err)?;
        Ok(distinct_years(dates.into_iter().map(|(d,)| d)))
    }
}

// User operations
#[async_trait]
impl UserStore for Database {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .bind(created_at)
        .execute(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(User {
            id,
            email: email.to_string(),
            name: name.map(str::to_string),
            created_at,
        })
    }

    async fn get_user(&self, id: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(|r| r.into_user().0))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<(User, String)>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(UserRow::into_user))
    }
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct PageRow {
    id: i64,
    slug: String,
    title: String,
    content: String,
    markup: bool,
    status: String,
    owner: Option<String>,
    created_date: DateTime<Utc>,
    modified_date: DateTime<Utc>,
}

impl From<PageRow> for Page {
    fn from(r: PageRow) -> Self {
        Page {
            id: r.id,
            slug: r.slug,
            title: r.title,
            content: r.content,
            markup: r.markup,
            status: Status::parse(&r.status),
            owner: r.owner,
            created_date: r.created_date,
            modified_date: r.modified_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    slug: String,
    title: String,
    content: String,
    markup: bool,
    status: String,
    owner: Option<String>,
    tags: String,
    created_date: DateTime<Utc>,
    modified_date: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Post {
            id: r.id,
            slug: r.slug,
            title: r.title,
            content: r.content,
            markup: r.markup,
            status: Status::parse(&r.status),
            owner: r.owner,
            tags: r.tags,
            created_date: r.created_date,
            modified_date: r.modified_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AttachmentRow {
    id: i64,
    post_id: i64,
    slug: String,
    name: String,
    file: String,
}

impl From<AttachmentRow> for PostAttachment {
    fn from(r: AttachmentRow) -> Self {
        PostAttachment {
            id: r.id,
            post_id: r.post_id,
            slug: r.slug,
            name: r.name,
            file: r.file,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookmarkRow {
    id: i64,
    title: String,
    slug: String,
    url: String,
    tags: String,
    owner: Option<String>,
    public: bool,
    created_date: DateTime<Utc>,
    modified_date: DateTime<Utc>,
}

impl From<BookmarkRow> for Bookmark {
    fn from(r: BookmarkRow) -> Self {
        Bookmark {
            id: r.id,
            title: r.title,
            slug: r.slug,
            url: r.url,
            tags: r.tags,
            owner: r.owner,
            public: r.public,
            created_date: r.created_date,
            modified_date: r.modified_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PasteRow {
    id: i64,
    text: String,
    lexer: String,
    title: String,
    group: String,
    created: DateTime<Utc>,
}

impl From<PasteRow> for Paste {
    fn from(r: PasteRow) -> Self {
        Paste {
            id: r.id,
            text: r.text,
            lexer: r.lexer,
            title: r.title,
            group: r.group,
            created: r.created,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AlbumRow {
    id: i64,
    slug: String,
    title: String,
    description: String,
    owner: Option<String>,
    created_date: DateTime<Utc>,
    modified_date: DateTime<Utc>,
}

impl From<AlbumRow> for Album {
    fn from(r: AlbumRow) -> Self {
        Album {
            id: r.id,
            slug: r.slug,
            title: r.title,
            description: r.description,
            owner: r.owner,
            created_date: r.created_date,
            modified_date: r.modified_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PhotoRow {
    id: i64,
    album_id: i64,
    slug: String,
    title: String,
    description: String,
    image: String,
    created_date: DateTime<Utc>,
}

impl From<PhotoRow> for Photo {
    fn from(r: PhotoRow) -> Self {
        Photo {
            id: r.id,
            album_id: r.album_id,
            slug: r.slug,
            title: r.title,
            description: r.description,
            image: r.image,
            created_date: r.created_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PhotoEntryRow {
    #[sqlx(flatten)]
    photo: PhotoRow,
    album_slug: String,
}

impl From<PhotoEntryRow> for PhotoEntry {
    fn from(r: PhotoEntryRow) -> Self {
        PhotoEntry {
            photo: r.photo.into(),
            album_slug: r.album_slug,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> (User, String) {
        (
            User {
                id: self.id,
                email: self.email,
                name: self.name,
                created_at: self.created_at,
            },
            self.password_hash,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_post(slug: &str, status: Status, tags: &str, created: DateTime<Utc>) -> NewPost {
        NewPost {
            slug: slug.to_string(),
            title: slug.to_string(),
            content: "body".to_string(),
            status,
            tags: tags.to_string(),
            created_date: Some(created),
            ..Default::default()
        }
    }

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_page_crud() {
        let db = Database::in_memory().await.unwrap();
        let page = db
            .create_page(&NewPage {
                slug: "about".to_string(),
                title: "About".to_string(),
                content: "Hi".to_string(),
                status: Status::Public,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.slug, "about");
        assert_eq!(page.created_date, page.modified_date);
        assert!(db.slug_exists(SlugKind::Page, "about").await.unwrap());

        let updated = db
            .update_page(
                "about",
                &NewPage {
                    slug: "about-me".to_string(),
                    title: "About me".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, page.id);
        assert_eq!(updated.status, Status::Draft);
        assert!(db.get_page("about").await.unwrap().is_none());

        db.delete_page("about-me").await.unwrap();
        assert!(matches!(
            db.delete_page("about-me").await,
            Err(QuireError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let db = Database::in_memory().await.unwrap();
        let page = NewPage {
            slug: "same".to_string(),
            title: "Same".to_string(),
            ..Default::default()
        };
        db.create_page(&page).await.unwrap();
        assert!(matches!(
            db.create_page(&page).await,
            Err(QuireError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_public_posts_archive_and_order() {
        let db = Database::in_memory().await.unwrap();
        db.create_post(&new_post("old", Status::Public, "", day(2011, 3, 1)))
            .await
            .unwrap();
        db.create_post(&new_post("mid", Status::Public, "", day(2012, 6, 15)))
            .await
            .unwrap();
        db.create_post(&new_post("new", Status::Public, "", day(2012, 12, 31)))
            .await
            .unwrap();
        db.create_post(&new_post("hidden", Status::Draft, "", day(2012, 6, 1)))
            .await
            .unwrap();

        assert_eq!(db.count_public_posts(None).await.unwrap(), 3);
        let all = db.list_public_posts(None, 0, 10).await.unwrap();
        let slugs: Vec<_> = all.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["new", "mid", "old"]);

        let in_2012 = Archive::year(2012);
        assert_eq!(db.count_public_posts(in_2012).await.unwrap(), 2);

        let june = Archive::month(2012, 6);
        let posts = db.list_public_posts(june, 0, 10).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "mid");

        let page_two = db.list_public_posts(None, 2, 2).await.unwrap();
        assert_eq!(page_two.len(), 1);
        assert_eq!(page_two[0].slug, "old");

        assert_eq!(db.public_post_years().await.unwrap(), vec![2012, 2011]);
    }

    #[tokio::test]
    async fn test_update_post_keeps_created_date() {
        let db = Database::in_memory().await.unwrap();
        let created = day(2010, 1, 1);
        db.create_post(&new_post("p", Status::Public, "", created))
            .await
            .unwrap();
        let mut change = new_post("p", Status::Public, "rust", created);
        change.created_date = None;
        let updated = db.update_post("p", &change).await.unwrap();
        assert_eq!(updated.created_date, created);
        assert_eq!(updated.tags, "rust");
        assert!(updated.modified_date > created);
    }

    #[tokio::test]
    async fn test_posts_mentioning_tag() {
        let db = Database::in_memory().await.unwrap();
        db.create_post(&new_post("a", Status::Public, "rust, web", day(2012, 1, 1)))
            .await
            .unwrap();
        db.create_post(&new_post("b", Status::Public, "python", day(2012, 1, 2)))
            .await
            .unwrap();
        let found = db.list_public_posts_mentioning("rust").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].slug, "a");
    }

    #[tokio::test]
    async fn test_attachments_belong_to_post() {
        let db = Database::in_memory().await.unwrap();
        let post = db
            .create_post(&new_post("p", Status::Public, "", day(2012, 1, 1)))
            .await
            .unwrap();
        db.create_attachment(&NewAttachment {
            post_id: post.id,
            slug: "notes".to_string(),
            name: "Notes".to_string(),
            file: "attachments/2012/01/01/notes.pdf".to_string(),
        })
        .await
        .unwrap();

        let found = db.get_attachment("notes").await.unwrap().unwrap();
        assert_eq!(found.file_name(), "notes.pdf");
        assert_eq!(db.list_attachments(post.id).await.unwrap().len(), 1);

        db.delete_post("p").await.unwrap();
        assert!(db.get_attachment("notes").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bookmarks_public_only() {
        let db = Database::in_memory().await.unwrap();
        for (slug, public) in [("a", true), ("b", false), ("c", true)] {
            db.create_bookmark(&NewBookmark {
                title: slug.to_string(),
                slug: slug.to_string(),
                url: format!("https://example.com/{}", slug),
                tags: String::new(),
                owner: None,
                public,
            })
            .await
            .unwrap();
        }
        assert_eq!(db.count_public_bookmarks().await.unwrap(), 2);
        assert_eq!(db.list_public_bookmarks(0, 10).await.unwrap().len(), 2);
        assert!(db.get_bookmark("b").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pastes_and_groups() {
        let db = Database::in_memory().await.unwrap();
        let first = db
            .create_paste(&NewPaste {
                text: "print(1)".to_string(),
                lexer: "py".to_string(),
                title: String::new(),
                group: "snippets".to_string(),
            })
            .await
            .unwrap();
        db.create_paste(&NewPaste {
            text: "fn main() {}".to_string(),
            lexer: "rs".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

        assert_eq!(db.get_paste(first.id).await.unwrap().unwrap().lexer, "py");
        assert_eq!(db.pastes_in_group("snippets").await.unwrap().len(), 1);
        let latest = db.latest_pastes(20).await.unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].lexer, "rs");
    }

    #[tokio::test]
    async fn test_photo_lookup_is_scoped_to_album() {
        let db = Database::in_memory().await.unwrap();
        let trips = db
            .create_album(&NewAlbum {
                slug: "trips".to_string(),
                title: "Trips".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let family = db
            .create_album(&NewAlbum {
                slug: "family".to_string(),
                title: "Family".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.create_photo(&NewPhoto {
            album_id: trips.id,
            slug: "beach".to_string(),
            title: "Beach".to_string(),
            description: String::new(),
            image: "photos/2012/01/01/beach.jpg".to_string(),
        })
        .await
        .unwrap();

        assert!(db
            .get_photo_in_album(trips.id, "beach")
            .await
            .unwrap()
            .is_some());
        assert!(db
            .get_photo_in_album(family.id, "beach")
            .await
            .unwrap()
            .is_none());

        let latest = db.latest_photos(20).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].url(), "/photo/album/trips/beach/");
        assert_eq!(db.photo_years().await.unwrap().len(), 1);
        assert_eq!(db.album_years().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_users() {
        let db = Database::in_memory().await.unwrap();
        let user = db
            .create_user("me@example.com", "hash", Some("Me"))
            .await
            .unwrap();
        let (found, hash) = db
            .get_user_by_email("me@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(hash, "hash");
        assert!(db.get_user(&user.id).await.unwrap().is_some());
        assert!(matches!(
            db.create_user("me@example.com", "x", None).await,
            Err(QuireError::Conflict(_))
        ));
    }
}
