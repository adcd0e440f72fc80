//! Content filters: Markdown, tag links, file names

use maud::{html, Markup, PreEscaped};
use pulldown_cmark::{html as md_html, Options, Parser};
use quire_core::parse_tags;

/// Render Markdown to HTML. Raw HTML in the source passes through, as the
/// content is written by the site owner.
pub fn markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    md_html::push_html(&mut out, parser);
    out
}

/// Comma separated links to the tag listing of each tag
pub fn tag_links(tags: &str) -> Markup {
    let tags = parse_tags(tags);
    html! {
        @for (i, tag) in tags.iter().enumerate() {
            @if i > 0 { ", " }
            a href=(tag_url(tag)) { (tag) }
        }
    }
}

pub fn tag_url(tag: &str) -> String {
    format!("/posts/tag/{}/", encode_path_segment(tag))
}

/// Percent-encode everything outside the RFC 3986 unreserved set
pub fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Trusted HTML produced by the renderer
pub fn trusted(html: String) -> PreEscaped<String> {
    PreEscaped(html)
}
