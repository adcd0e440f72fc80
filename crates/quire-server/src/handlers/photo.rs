//! Photo gallery handlers

use super::AppError;
use crate::app::AppState;
use crate::views::photo as views;
use axum::extract::{Path, State};
use maud::Markup;
use quire_core::ports::{distinct_years, AlbumStore, PhotoStore};
use quire_core::QuireError;

const LATEST: u64 = 20;

pub async fn index(State(state): State<AppState>) -> Result<Markup, AppError> {
    let photos = state.db.latest_photos(LATEST).await?;
    let years = state.db.photo_years().await?;
    Ok(views::photo_index(&state.site(), &photos, &years))
}

pub async fn albums(State(state): State<AppState>) -> Result<Markup, AppError> {
    let albums = state.db.latest_albums(LATEST).await?;
    let years = state.db.album_years().await?;
    Ok(views::album_index(&state.site(), &albums, &years))
}

pub async fn album(
    State(state): State<AppState>,
    Path(aslug): Path<String>,
) -> Result<Markup, AppError> {
    let album = state
        .db
        .get_album(&aslug)
        .await?
        .ok_or_else(|| QuireError::not_found(format!("album {}", aslug)))?;
    let photos = state.db.photos_in_album(album.id).await?;
    let years = distinct_years(photos.iter().map(|p| p.created_date));
    Ok(views::album_detail(&state.site(), &album, &photos, &years))
}

/// A photo is only found through its own album
pub async fn photo(
    State(state): State<AppState>,
    Path((aslug, pslug)): Path<(String, String)>,
) -> Result<Markup, AppError> {
    let album = state
        .db
        .get_album(&aslug)
        .await?
        .ok_or_else(|| QuireError::not_found(format!("album {}", aslug)))?;
    let photo = state
        .db
        .get_photo_in_album(album.id, &pslug)
        .await?
        .ok_or_else(|| QuireError::not_found(format!("photo {}/{}", aslug, pslug)))?;
    Ok(views::photo_detail(&state.site(), &album, &photo))
}
