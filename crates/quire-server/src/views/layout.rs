//! Base document, navigation and shared fragments

use maud::{html, Markup, PreEscaped, DOCTYPE};
use quire_core::PageWindow;

/// Per-request site context the templates need
pub struct Site<'a> {
    pub title: &'a str,
    pub media_url: &'a str,
    /// Pre-rendered analytics snippet, empty when not configured
    pub analytics: String,
}

impl Site<'_> {
    pub fn media(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.media_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }
}

const NAV: [(&str, &str); 5] = [
    ("/", "Home"),
    ("/posts/", "Posts"),
    ("/bookmarks/", "Bookmarks"),
    ("/photo/", "Photos"),
    ("/paste/", "Paste"),
];

/// Renders the base HTML document structure
pub fn document(site: &Site, title: &str, body_class: Option<&str>, content: Markup) -> Markup {
    let full_title = if title.is_empty() {
        site.title.to_string()
    } else {
        format!("{} | {}", title, site.title)
    };

    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (full_title) }
                link rel="stylesheet" href="/static/site.css";
            }
            body class=[body_class] {
                header.site-header {
                    a.site-title href="/" { (site.title) }
                    nav.site-nav {
                        ul {
                            @for (href, label) in NAV {
                                li { a href=(href) { (label) } }
                            }
                        }
                    }
                }
                main {
                    (content)
                }
                (PreEscaped(&site.analytics))
            }
        }
    }
}

/// Standalone error page, rendered without database access
pub fn error_document(status: u16, message: &str) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                title { (status) }
            }
            body.error-page {
                h1 { (status) }
                p { (message) }
                p { a href="/" { "Back to the home page" } }
            }
        }
    }
}

/// Previous/next links for a paginated listing at `base`
pub fn pagination(window: &PageWindow, base: &str) -> Markup {
    html! {
        @if window.num_pages > 1 {
            nav.pagination {
                @if let Some(prev) = window.previous_number() {
                    a.prev href={ (base) "?page=" (prev) } { "« newer" }
                }
                span.current { "Page " (window.number) " of " (window.num_pages) }
                @if let Some(next) = window.next_number() {
                    a.next href={ (base) "?page=" (next) } { "older »" }
                }
            }
        }
    }
}

/// Links to per-year listings under `base`
pub fn year_links(years: &[i32], base: &str) -> Markup {
    html! {
        @if !years.is_empty() {
            ul.years {
                @for year in years {
                    li { a href={ (base) (year) "/" } { (year) } }
                }
            }
        }
    }
}

/// Years that have content, newest first
pub fn year_list(years: &[i32]) -> Markup {
    html! {
        @if !years.is_empty() {
            ul.years {
                @for year in years { li { (year) } }
            }
        }
    }
}
