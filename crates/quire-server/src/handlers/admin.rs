//! Admin JSON API: content writes behind a bearer token

use super::ApiError;
use crate::app::AppState;
use crate::extractors::AuthUser;
use crate::services::Upload;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use quire_core::ports::PageStore;
use quire_core::{
    Album, Bookmark, NewAlbum, NewBookmark, NewPage, NewPost, Page, Photo, Post, PostAttachment,
    QuireError,
};
use std::collections::HashMap;
use tracing::info;

/// Text fields and the `file` part of a multipart upload
struct UploadForm {
    fields: HashMap<String, String>,
    file: Option<Upload>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, QuireError> {
        let mut fields = HashMap::new();
        let mut file = None;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| QuireError::InvalidInput(format!("Malformed upload: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| QuireError::InvalidInput(format!("Malformed upload: {}", e)))?;
                file = Some(Upload { file_name, data });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| QuireError::InvalidInput(format!("Malformed upload: {}", e)))?;
                fields.insert(name, value);
            }
        }

        Ok(Self { fields, file })
    }

    fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or_default()
    }

    fn take_file(&mut self) -> Result<Upload, QuireError> {
        self.file
            .take()
            .ok_or_else(|| QuireError::InvalidInput("missing file".to_string()))
    }
}

// Pages

/// Every page, drafts and private ones included
pub async fn list_pages(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Vec<Page>>, ApiError> {
    Ok(Json(state.db.list_pages(false).await?))
}

pub async fn create_page(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut req): Json<NewPage>,
) -> Result<(StatusCode, Json<Page>), ApiError> {
    req.owner.get_or_insert(user.user_id);
    let page = state.content.create_page(req).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

pub async fn update_page(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(slug): Path<String>,
    Json(req): Json<NewPage>,
) -> Result<Json<Page>, ApiError> {
    Ok(Json(state.content.update_page(&slug, req).await?))
}

pub async fn delete_page(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.content.delete_page(&slug).await?;
    info!("Page {} deleted by {}", slug, user.email);
    Ok(StatusCode::NO_CONTENT)
}

// Posts

pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut req): Json<NewPost>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    req.owner.get_or_insert(user.user_id);
    let post = state.content.create_post(req).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn update_post(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(slug): Path<String>,
    Json(req): Json<NewPost>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(state.content.update_post(&slug, req).await?))
}

pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.content.delete_post(&slug).await?;
    info!("Post {} deleted by {}", slug, user.email);
    Ok(StatusCode::NO_CONTENT)
}

/// Multipart: `file`, optional `name` and `slug`
pub async fn add_attachment(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostAttachment>), ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let attachment = state
        .content
        .add_attachment(&slug, form.field("name"), form.field("slug"), file)
        .await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

// Bookmarks

pub async fn create_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut req): Json<NewBookmark>,
) -> Result<(StatusCode, Json<Bookmark>), ApiError> {
    req.owner.get_or_insert(user.user_id);
    let bookmark = state.content.create_bookmark(req).await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

pub async fn delete_bookmark(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.content.delete_bookmark(&slug).await?;
    Ok(StatusCode::NO_CONTENT)
}

// Albums and photos

pub async fn create_album(
    State(state): State<AppState>,
    user: AuthUser,
    Json(mut req): Json<NewAlbum>,
) -> Result<(StatusCode, Json<Album>), ApiError> {
    req.owner.get_or_insert(user.user_id);
    let album = state.content.create_album(req).await?;
    Ok((StatusCode::CREATED, Json(album)))
}

/// Multipart: `file`, optional `title` and `description`
pub async fn add_photo(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Photo>), ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    let photo = state
        .content
        .add_photo(&slug, form.field("title"), form.field("description"), file)
        .await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

// Pastes

pub async fn delete_paste(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.content.delete_paste(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
