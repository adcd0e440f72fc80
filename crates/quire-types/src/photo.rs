//! Photo gallery types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named group of photos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub owner: Option<String>,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

impl Album {
    pub fn url(&self) -> String {
        format!("/photo/album/{}/", self.slug)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAlbum {
    #[serde(default)]
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub owner: Option<String>,
}

/// Single image inside an album
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    pub album_id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Path relative to the media root
    pub image: String,
    pub created_date: DateTime<Utc>,
}

impl Photo {
    /// Photos are addressed through their album
    pub fn url_in(&self, album: &Album) -> String {
        format!("/photo/album/{}/{}/", album.slug, self.slug)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPhoto {
    pub album_id: i64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: String,
}

/// Photo joined with the slug of its album, for cross-album listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoEntry {
    pub photo: Photo,
    pub album_slug: String,
}

impl PhotoEntry {
    pub fn url(&self) -> String {
        format!("/photo/album/{}/{}/", self.album_slug, self.photo.slug)
    }
}
