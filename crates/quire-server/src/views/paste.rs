//! Pastebin views

use super::layout::{document, Site};
use maud::{html, Markup};
use quire_core::{Lexer, Paste};
use serde::Deserialize;

/// Paste form as submitted, re-rendered when validation fails
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasteForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub lexer: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub group: String,
}

fn paste_links(pastes: &[Paste]) -> Markup {
    html! {
        ul.pastes {
            @for paste in pastes {
                li {
                    a href=(paste.url()) { (paste.display_title()) }
                    " "
                    span.lexer { (paste.lexer) }
                    @if !paste.group.is_empty() {
                        " in "
                        a href={ "/paste/group/" (crate::services::markup::encode_path_segment(&paste.group)) "/" } {
                            (paste.group)
                        }
                    }
                }
            }
        }
    }
}

pub fn paste_index(site: &Site, form: &PasteForm, error: Option<&str>, latest: &[Paste]) -> Markup {
    let selected = if form.lexer.is_empty() { Lexer::Text.code() } else { form.lexer.as_str() };
    let content = html! {
        h1 { "Paste" }
        @if let Some(error) = error {
            p.error { (error) }
        }
        form.paste-form method="post" action="/paste/" {
            p {
                label for="title" { "Title" }
                input #title type="text" name="title" maxlength="100" value=(form.title);
            }
            p {
                label for="group" { "Group" }
                input #group type="text" name="group" maxlength="100" value=(form.group);
            }
            p {
                label for="lexer" { "Language" }
                select #lexer name="lexer" {
                    @for lexer in Lexer::ALL {
                        option value=(lexer.code()) selected[lexer.code() == selected] {
                            (lexer.label())
                        }
                    }
                }
            }
            p {
                textarea #text name="text" rows="20" cols="80" { (form.text) }
            }
            button type="submit" { "Paste" }
        }
        @if !latest.is_empty() {
            h2 { "Latest" }
            (paste_links(latest))
        }
    };
    document(site, "Paste", Some("paste-index"), content)
}

pub fn paste_detail(site: &Site, paste: &Paste) -> Markup {
    let title = paste.display_title();
    let content = html! {
        h1 { (title) }
        p.meta {
            (paste.created.format("%Y-%m-%d %H:%M"))
            @if let Some(lexer) = Lexer::from_code(&paste.lexer) {
                " · " (lexer.label())
            }
        }
        pre class={ "paste lexer-" (paste.lexer) } {
            @for (n, line) in paste.text.lines().enumerate() {
                span.line id={ "L" (n + 1) } {
                    span.lineno { (n + 1) }
                    (line) "\n"
                }
            }
        }
    };
    document(site, &title, Some("paste"), content)
}

pub fn paste_group(site: &Site, group: &str, pastes: &[Paste]) -> Markup {
    let content = html! {
        h1 { "Group: " (group) }
        (paste_links(pastes))
    };
    document(site, group, Some("paste-group"), content)
}
