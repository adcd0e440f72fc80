//! Home, pages, posts and bookmarks

use super::AppError;
use crate::app::AppState;
use crate::views::web as views;
use axum::extract::{Path, Query, State};
use maud::Markup;
use quire_core::ports::{Archive, AttachmentStore, BookmarkStore, PageStore, PostStore};
use quire_core::{PageWindow, Paginator, QuireError};
use serde::Deserialize;

const HOME_LATEST_POSTS: u64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

/// Resolve `?page=`; out of range or malformed values are a 404
pub fn window(total: u64, per_page: u64, query: &PageQuery) -> Result<PageWindow, QuireError> {
    Paginator::new(total, per_page)
        .page_from_query(query.page.as_deref())
        .ok_or_else(|| QuireError::not_found("page"))
}

pub async fn home(State(state): State<AppState>) -> Result<Markup, AppError> {
    let body = state.renderer.homepage().await?;
    let latest = state
        .db
        .list_public_posts(None, 0, HOME_LATEST_POSTS)
        .await?;
    Ok(views::home(&state.site(), body, &latest))
}

pub async fn page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Markup, AppError> {
    let page = state
        .db
        .get_page(&slug)
        .await?
        .filter(|p| p.is_public())
        .ok_or_else(|| QuireError::not_found(format!("page {}", slug)))?;

    let body = state
        .renderer
        .render_content(&page.content, page.markup)
        .await?;
    Ok(views::page(&state.site(), &page, body))
}

async fn archive_listing(
    state: &AppState,
    archive: Option<Archive>,
    heading: String,
    base: String,
    query: &PageQuery,
) -> Result<Markup, AppError> {
    let total = state.db.count_public_posts(archive).await?;
    let window = window(total, state.config.page_size, query)?;
    let posts = state
        .db
        .list_public_posts(archive, window.offset(), window.limit())
        .await?;
    let years = state.db.public_post_years().await?;

    Ok(views::post_list(
        &state.site(),
        &heading,
        &posts,
        &window,
        &base,
        &years,
    ))
}

pub async fn posts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Markup, AppError> {
    archive_listing(&state, None, "Posts".to_string(), "/posts/".to_string(), &query).await
}

pub async fn posts_by_year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Markup, AppError> {
    let archive =
        Archive::year(year).ok_or_else(|| QuireError::not_found(format!("archive {}", year)))?;
    archive_listing(
        &state,
        Some(archive),
        format!("Posts from {}", year),
        format!("/posts/{}/", year),
        &query,
    )
    .await
}

pub async fn posts_by_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(i32, u32)>,
    Query(query): Query<PageQuery>,
) -> Result<Markup, AppError> {
    let archive = Archive::month(year, month)
        .ok_or_else(|| QuireError::not_found(format!("archive {}/{}", year, month)))?;
    archive_listing(
        &state,
        Some(archive),
        format!("Posts from {}-{:02}", year, month),
        format!("/posts/{}/{}/", year, month),
        &query,
    )
    .await
}

pub async fn posts_by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Markup, AppError> {
    let tagged: Vec<_> = state
        .db
        .list_public_posts_mentioning(&tag)
        .await?
        .into_iter()
        .filter(|p| p.has_tag(&tag))
        .collect();

    let window = window(tagged.len() as u64, state.config.page_size, &query)?;
    let years = state.db.public_post_years().await?;
    let base = crate::services::markup::tag_url(&tag);

    Ok(views::post_list(
        &state.site(),
        &format!("Posts tagged {}", tag),
        window.slice(&tagged),
        &window,
        &base,
        &years,
    ))
}

pub async fn post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Markup, AppError> {
    let post = state
        .db
        .get_post(&slug)
        .await?
        .filter(|p| p.is_public())
        .ok_or_else(|| QuireError::not_found(format!("post {}", slug)))?;

    let body = state
        .renderer
        .render_content(&post.content, post.markup)
        .await?;
    let attachments = state.db.list_attachments(post.id).await?;
    Ok(views::post_detail(&state.site(), &post, body, &attachments))
}

pub async fn bookmarks(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Markup, AppError> {
    let total = state.db.count_public_bookmarks().await?;
    let window = window(total, state.config.page_size, &query)?;
    let bookmarks = state
        .db
        .list_public_bookmarks(window.offset(), window.limit())
        .await?;
    Ok(views::bookmark_list(&state.site(), &bookmarks, &window))
}

pub async fn bookmark(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Markup, AppError> {
    let bookmark = state
        .db
        .get_bookmark(&slug)
        .await?
        .filter(|b| b.public)
        .ok_or_else(|| QuireError::not_found(format!("bookmark {}", slug)))?;
    Ok(views::bookmark_detail(&state.site(), &bookmark))
}
