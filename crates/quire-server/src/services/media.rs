//! Uploaded files under the media root

use chrono::{DateTime, Utc};
use quire_core::{slugify, QuireError, Result};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::info;

pub const ATTACHMENTS_DIR: &str = "attachments";
pub const PHOTOS_DIR: &str = "photos";

pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Write `data` to `<root>/<prefix>/YYYY/MM/DD/<name>` and return the
    /// media-relative path. Existing files are never overwritten.
    pub async fn save(
        &self,
        prefix: &str,
        original_name: &str,
        data: &[u8],
        at: DateTime<Utc>,
    ) -> Result<String> {
        if data.is_empty() {
            return Err(QuireError::InvalidInput("empty upload".to_string()));
        }

        let dir = format!("{}/{}", prefix, at.format("%Y/%m/%d"));
        tokio::fs::create_dir_all(self.root.join(&dir)).await?;

        let (stem, ext) = sanitize_name(original_name);
        let mut n = 0u32;
        loop {
            let file_name = match (n, ext.as_str()) {
                (0, "") => stem.clone(),
                (0, ext) => format!("{}.{}", stem, ext),
                (n, "") => format!("{}_{}", stem, n),
                (n, ext) => format!("{}_{}.{}", stem, n, ext),
            };
            let relative = format!("{}/{}", dir, file_name);
            let result = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.root.join(&relative))
                .await;

            match result {
                Ok(mut file) => {
                    file.write_all(data).await?;
                    file.flush().await?;
                    info!("Stored upload {} ({} bytes)", relative, data.len());
                    return Ok(relative);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn remove(&self, relative: &str) -> Result<()> {
        match tokio::fs::remove_file(self.root.join(relative)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Slugified stem and lowercased extension of an uploaded file name
pub fn sanitize_name(original: &str) -> (String, String) {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, ext),
        _ => (base, ""),
    };

    let mut stem = slugify(stem);
    if stem.is_empty() {
        stem = "file".to_string();
    }
    let ext: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase();
    (stem, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(
            sanitize_name("My Photo.JPG"),
            ("my-photo".to_string(), "jpg".to_string())
        );
        assert_eq!(
            sanitize_name("../../etc/passwd"),
            ("passwd".to_string(), String::new())
        );
        assert_eq!(
            sanitize_name(".bashrc"),
            ("bashrc".to_string(), String::new())
        );
        assert_eq!(sanitize_name("¿?.pdf"), ("file".to_string(), "pdf".to_string()));
    }

    #[tokio::test]
    async fn test_save_dated_and_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf());
        let at = Utc.with_ymd_and_hms(2012, 5, 4, 10, 0, 0).unwrap();

        let first = store.save(ATTACHMENTS_DIR, "Notes.pdf", b"one", at).await.unwrap();
        let second = store.save(ATTACHMENTS_DIR, "Notes.pdf", b"two", at).await.unwrap();

        assert_eq!(first, "attachments/2012/05/04/notes.pdf");
        assert_eq!(second, "attachments/2012/05/04/notes_1.pdf");
        assert_eq!(std::fs::read(dir.path().join(&first)).unwrap(), b"one");

        store.remove(&second).await.unwrap();
        assert!(!dir.path().join(&second).exists());
        store.remove(&second).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path().to_path_buf());
        assert!(store.save(PHOTOS_DIR, "a.jpg", b"", Utc::now()).await.is_err());
    }
}
