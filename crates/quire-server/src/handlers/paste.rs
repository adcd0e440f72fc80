//! Pastebin handlers

use super::AppError;
use crate::app::AppState;
use crate::views::paste::{self as views, PasteForm};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use maud::Markup;
use quire_core::ports::PasteStore;
use quire_core::{NewPaste, QuireError};

const LATEST_PASTES: u64 = 20;

pub async fn index(State(state): State<AppState>) -> Result<Markup, AppError> {
    let latest = state.db.latest_pastes(LATEST_PASTES).await?;
    Ok(views::paste_index(
        &state.site(),
        &PasteForm::default(),
        None,
        &latest,
    ))
}

/// Create a paste and redirect to it; invalid input re-renders the form
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<PasteForm>,
) -> Result<Response, AppError> {
    let new_paste = NewPaste {
        text: form.text.clone(),
        lexer: form.lexer.clone(),
        title: form.title.trim().to_string(),
        group: form.group.trim().to_string(),
    };

    match state.content.create_paste(new_paste).await {
        Ok(paste) => Ok(Redirect::to(&paste.url()).into_response()),
        Err(QuireError::InvalidInput(message)) => {
            let latest = state.db.latest_pastes(LATEST_PASTES).await?;
            let page = views::paste_index(&state.site(), &form, Some(message.as_str()), &latest);
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Markup, AppError> {
    let paste = state
        .db
        .get_paste(id)
        .await?
        .ok_or_else(|| QuireError::not_found(format!("paste {}", id)))?;
    Ok(views::paste_detail(&state.site(), &paste))
}

pub async fn group(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Markup, AppError> {
    let pastes = state.db.pastes_in_group(&group).await?;
    if pastes.is_empty() {
        return Err(QuireError::not_found(format!("paste group {}", group)).into());
    }
    Ok(views::paste_group(&state.site(), &group, &pastes))
}
