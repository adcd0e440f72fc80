//! Title lookup for bookmarks saved without one

use once_cell::sync::Lazy;
use quire_core::{QuireError, Result};
use regex::Regex;
use std::time::Duration;
use tracing::debug;

static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"));

/// Only this much of a page is inspected for a `<title>`
const MAX_BODY_BYTES: usize = 512 * 1024;

pub struct TitleFetcher {
    client: reqwest::Client,
}

impl TitleFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quire/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QuireError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    /// GET `url` and return its HTML title
    pub async fn fetch_title(&self, url: &str) -> Result<String> {
        debug!("Fetching title for {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| QuireError::Fetch(format!("{}: {}", url, e)))?;

        let mut head: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| QuireError::Fetch(format!("{}: {}", url, e)))?
        {
            let scanned = head.len();
            let room = MAX_BODY_BYTES - head.len();
            head.extend_from_slice(&chunk[..chunk.len().min(room)]);
            if head.len() >= MAX_BODY_BYTES || has_title_end(&head, scanned) {
                break;
            }
        }

        extract_title(&String::from_utf8_lossy(&head))
            .ok_or_else(|| QuireError::Fetch(format!("{}: no <title>", url)))
    }
}

/// Whether `</title>` occurs in `buf`, looking only at bytes from `from` on
/// plus enough overlap to catch a tag split across reads
fn has_title_end(buf: &[u8], from: usize) -> bool {
    const END: &[u8] = b"</title>";
    buf[from.saturating_sub(END.len() - 1)..]
        .windows(END.len())
        .any(|w| w.eq_ignore_ascii_case(END))
}

/// Serve `html` at `/` on an ephemeral local port and return its base URL
#[cfg(test)]
pub(crate) async fn serve_html(html: String) -> String {
    use axum::{response::Html, routing::get, Router};

    let app = Router::new().route("/", get(move || async move { Html(html) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}/", addr)
}

/// First `<title>` of an HTML document, whitespace collapsed and common
/// entities decoded. `None` when absent or blank.
pub fn extract_title(html: &str) -> Option<String> {
    let raw = TITLE.captures(html)?.get(1)?.as_str();
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let decoded = decode_entities(&collapsed);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}
