//! Pages, posts and bookmarks

use super::layout::{document, pagination, year_links, Site};
use crate::services::markup::{tag_links, trusted};
use maud::{html, Markup};
use quire_core::{Bookmark, Page, PageWindow, Post, PostAttachment};

fn post_summary(post: &Post) -> Markup {
    html! {
        article.post-summary {
            h2 { a href=(post.url()) { (post.title) } }
            p.meta {
                time datetime=(post.created_date.to_rfc3339()) {
                    (post.created_date.format("%Y-%m-%d"))
                }
                @if !post.tags.trim().is_empty() {
                    " · " (tag_links(&post.tags))
                }
            }
        }
    }
}

pub fn home(site: &Site, body: String, latest: &[Post]) -> Markup {
    let content = html! {
        section.homepage { (trusted(body)) }
        @if !latest.is_empty() {
            section.latest-posts {
                h2 { "Latest posts" }
                @for post in latest { (post_summary(post)) }
                p { a href="/posts/" { "All posts" } }
            }
        }
    };
    document(site, "", Some("home"), content)
}

/// `body` is the page content already expanded and converted
pub fn page(site: &Site, page: &Page, body: String) -> Markup {
    let content = html! {
        article.page {
            h1 { (page.title) }
            div.content { (trusted(body)) }
        }
    };
    document(site, &page.title, Some("page"), content)
}

pub fn post_list(
    site: &Site,
    heading: &str,
    posts: &[Post],
    window: &PageWindow,
    base: &str,
    years: &[i32],
) -> Markup {
    let content = html! {
        h1 { (heading) }
        @if posts.is_empty() {
            p.empty { "No posts yet." }
        }
        @for post in posts { (post_summary(post)) }
        (pagination(window, base))
        aside.archive {
            (year_links(years, "/posts/"))
        }
    };
    document(site, heading, Some("post-list"), content)
}

pub fn post_detail(
    site: &Site,
    post: &Post,
    body: String,
    attachments: &[PostAttachment],
) -> Markup {
    let content = html! {
        article.post {
            h1 { (post.title) }
            p.meta {
                time datetime=(post.created_date.to_rfc3339()) {
                    (post.created_date.format("%Y-%m-%d %H:%M"))
                }
            }
            div.content { (trusted(body)) }
            @if !post.tags.trim().is_empty() {
                p.tags { "Tags: " (tag_links(&post.tags)) }
            }
            @if !attachments.is_empty() {
                section.attachments {
                    h2 { "Files" }
                    ul {
                        @for attachment in attachments {
                            li {
                                a href=(site.media(&attachment.file)) { (attachment.name) }
                                " (" (attachment.file_name()) ")"
                            }
                        }
                    }
                }
            }
        }
    };
    document(site, &post.title, Some("post"), content)
}

pub fn bookmark_list(site: &Site, bookmarks: &[Bookmark], window: &PageWindow) -> Markup {
    let content = html! {
        h1 { "Bookmarks" }
        ul.bookmarks {
            @for bookmark in bookmarks {
                li {
                    a href=(bookmark.url) rel="nofollow" { (bookmark.title) }
                    " "
                    a.permalink href=(bookmark.permalink()) { "#" }
                }
            }
        }
        (pagination(window, "/bookmarks/"))
    };
    document(site, "Bookmarks", Some("bookmark-list"), content)
}

pub fn bookmark_detail(site: &Site, bookmark: &Bookmark) -> Markup {
    let tags = bookmark.tag_list();
    let content = html! {
        article.bookmark {
            h1 { a href=(bookmark.url) rel="nofollow" { (bookmark.title) } }
            p.url { (bookmark.url) }
            @if !tags.is_empty() {
                ul.tags {
                    @for tag in &tags { li { (tag) } }
                }
            }
            p.meta { "Saved " (bookmark.created_date.format("%Y-%m-%d")) }
        }
    };
    document(site, &bookmark.title, Some("bookmark"), content)
}
