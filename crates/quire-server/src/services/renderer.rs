//! Template tags in stored content
//!
//! Page and post bodies may embed `{% tag args %}` directives. They are
//! expanded at request time, before Markdown conversion:
//!
//! - `{% show_page "slug" %}` - include another page (cached)
//! - `{% post_file_url "slug" %}` - URL of a post attachment (cached)
//! - `{% post_file_link "slug" %}` - anchor to a post attachment (cached)
//! - `{% homepage %}` - the configured home page (cached)
//! - `{% analytics %}` - analytics snippet, when configured
//!
//! Unknown tags are left untouched.

use crate::config::ServerConfig;
use crate::services::fragments::FragmentCache;
use crate::services::markup;
use crate::storage::Database;
use futures::future::BoxFuture;
use maud::html;
use quire_core::ports::{AttachmentStore, PageStore};
use quire_core::{QuireError, Result};
use std::sync::Arc;
use tracing::warn;

/// Nested `show_page` expansions allowed before giving up
pub const MAX_INCLUDE_DEPTH: usize = 8;

/// Settings the tags read
#[derive(Debug, Clone, Default)]
pub struct RenderSettings {
    pub media_url: String,
    pub homepage: String,
    pub analytics_code: Option<String>,
    pub analytics_domain: Option<String>,
}

impl From<&ServerConfig> for RenderSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            media_url: config.media_url.clone(),
            homepage: config.homepage.clone(),
            analytics_code: config.analytics_code.clone(),
            analytics_domain: config.analytics_domain.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node<'a> {
    Text(&'a str),
    Tag {
        raw: &'a str,
        name: String,
        args: Vec<String>,
    },
}

/// Split content into text runs and `{% ... %}` tags.
/// An unterminated `{%` is kept as text.
fn parse(content: &str) -> Vec<Node<'_>> {
    let mut nodes = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find("{%") {
        let Some(close) = rest[open + 2..].find("%}") else {
            break;
        };
        let close = open + 2 + close;

        if open > 0 {
            nodes.push(Node::Text(&rest[..open]));
        }
        let raw = &rest[open..close + 2];
        let mut words = split_args(&rest[open + 2..close]);
        if words.is_empty() {
            nodes.push(Node::Text(raw));
        } else {
            let name = words.remove(0);
            nodes.push(Node::Tag {
                raw,
                name,
                args: words,
            });
        }
        rest = &rest[close + 2..];
    }

    if !rest.is_empty() {
        nodes.push(Node::Text(rest));
    }
    nodes
}

/// Whitespace separated words; single or double quotes group a word
fn split_args(inner: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = inner.trim().chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut word = String::new();
        if c == '"' || c == '\'' {
            chars.next();
            for ch in chars.by_ref() {
                if ch == c {
                    break;
                }
                word.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                word.push(ch);
                chars.next();
            }
        }
        words.push(word);
    }
    words
}

fn single_arg<'a>(name: &str, args: &'a [String]) -> Result<&'a str> {
    match args {
        [one] => Ok(one.as_str()),
        _ => Err(QuireError::Render(format!(
            "'{}' tag requires a single argument",
            name
        ))),
    }
}

fn no_args(name: &str, args: &[String]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(QuireError::Render(format!("'{}' tag takes no arguments", name)))
    }
}

pub struct ContentRenderer {
    db: Arc<Database>,
    fragments: FragmentCache,
    settings: RenderSettings,
}

impl ContentRenderer {
    pub fn new(db: Arc<Database>, fragments: FragmentCache, settings: RenderSettings) -> Self {
        Self {
            db,
            fragments,
            settings,
        }
    }

    #[cfg(test)]
    pub fn fragments(&self) -> &FragmentCache {
        &self.fragments
    }

    /// Expand tags in `content`, then convert Markdown when `markup` is set
    pub async fn render_content(&self, content: &str, markup: bool) -> Result<String> {
        self.render_at(content.to_string(), markup, 0).await
    }

    fn render_at(&self, content: String, markup: bool, depth: usize) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let expanded = self.expand(&content, depth).await?;
            Ok(if markup {
                markup::markdown(&expanded)
            } else {
                expanded
            })
        })
    }

    async fn expand(&self, content: &str, depth: usize) -> Result<String> {
        let mut out = String::with_capacity(content.len());
        for node in parse(content) {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Tag { raw, name, args } => match name.as_str() {
                    "show_page" => {
                        let slug = single_arg(&name, &args)?;
                        out.push_str(&self.show_page(slug, depth + 1).await?);
                    }
                    "post_file_url" => {
                        let slug = single_arg(&name, &args)?;
                        out.push_str(&self.post_file_url(slug).await?);
                    }
                    "post_file_link" => {
                        let slug = single_arg(&name, &args)?;
                        out.push_str(&self.post_file_link(slug).await?);
                    }
                    "homepage" => {
                        no_args(&name, &args)?;
                        if depth < MAX_INCLUDE_DEPTH {
                            out.push_str(&self.homepage_at(depth + 1).await?);
                        } else {
                            warn!("Include depth exceeded expanding homepage tag");
                        }
                    }
                    "analytics" => {
                        no_args(&name, &args)?;
                        out.push_str(&self.analytics());
                    }
                    _ => out.push_str(raw),
                },
            }
        }
        Ok(out)
    }

    async fn render_page(&self, slug: &str, depth: usize) -> Result<String> {
        match self.db.get_page(slug).await? {
            Some(page) => self.render_at(page.content, page.markup, depth).await,
            None => Ok(String::new()),
        }
    }

    /// Render another page in place; a missing page renders as nothing.
    /// Only top-level includes are cached, nested ones see a smaller depth budget.
    async fn show_page(&self, slug: &str, depth: usize) -> Result<String> {
        if depth > MAX_INCLUDE_DEPTH {
            warn!("Include depth exceeded at page {}", slug);
            return Ok(String::new());
        }
        if depth > 1 {
            return self.render_page(slug, depth).await;
        }
        let key = format!("page:{}:show", slug);
        self.fragments
            .get_or_render(key, || self.render_page(slug, depth))
            .await
    }

    /// Body of the configured home page
    pub async fn homepage(&self) -> Result<String> {
        self.homepage_at(0).await
    }

    /// Cached only when rendered from the top, like `show_page`
    async fn homepage_at(&self, depth: usize) -> Result<String> {
        let slug = self.settings.homepage.trim();
        if slug.is_empty() {
            return Ok(String::new());
        }
        if depth > 0 {
            return self.render_page(slug, depth).await;
        }
        let key = format!("homepage:{}", slug);
        self.fragments
            .get_or_render(key, || self.render_page(slug, depth))
            .await
    }

    pub async fn post_file_url(&self, slug: &str) -> Result<String> {
        let key = format!("attachment:{}:url", slug);
        self.fragments
            .get_or_render(key, || async move {
                Ok(self
                    .db
                    .get_attachment(slug)
                    .await?
                    .map(|a| self.media_url(&a.file))
                    .unwrap_or_default())
            })
            .await
    }

    pub async fn post_file_link(&self, slug: &str) -> Result<String> {
        let key = format!("attachment:{}:link", slug);
        self.fragments
            .get_or_render(key, || async move {
                Ok(match self.db.get_attachment(slug).await? {
                    Some(a) => html! {
                        a href=(self.media_url(&a.file)) class="post-file-link" { (a.name) }
                    }
                    .into_string(),
                    None => String::new(),
                })
            })
            .await
    }

    pub fn analytics(&self) -> String {
        match &self.settings.analytics_code {
            Some(code) if !code.is_empty() => {
                let domain = self.settings.analytics_domain.as_deref().unwrap_or("auto");
                html! {
                    script defer src=(format!("https://www.googletagmanager.com/gtag/js?id={}", code)) {}
                    script {
                        (maud::PreEscaped(format!(
                            "window.dataLayer=window.dataLayer||[];function gtag(){{dataLayer.push(arguments);}}gtag('js',new Date());gtag('config',{},{{'cookie_domain':{}}});",
                            serde_json::Value::from(code.as_str()),
                            serde_json::Value::from(domain),
                        )))
                    }
                }
                .into_string()
            }
            _ => String::new(),
        }
    }

    pub fn media_url(&self, relative: &str) -> String {
        format!(
            "{}/{}",
            self.settings.media_url.trim_end_matches('/'),
            relative.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryCache;
    use quire_core::ports::PostStore;
    use quire_core::{NewAttachment, NewPage, NewPost, Status};
    use std::time::Duration;

    async fn renderer(homepage: &str) -> (Arc<Database>, ContentRenderer) {
        let db = Arc::new(Database::in_memory().await.unwrap());
        let fragments = FragmentCache::new(Arc::new(MemoryCache::new()), Duration::from_secs(30));
        let settings = RenderSettings {
            media_url: "/media".to_string(),
            homepage: homepage.to_string(),
            ..Default::default()
        };
        (db.clone(), ContentRenderer::new(db, fragments, settings))
    }

    async fn add_page(db: &Database, slug: &str, content: &str, markup: bool) {
        db.create_page(&NewPage {
            slug: slug.to_string(),
            title: slug.to_string(),
            content: content.to_string(),
            markup,
            status: Status::Public,
            owner: None,
        })
        .await
        .unwrap();
    }

    #[test]
    fn test_parse_nodes() {
        let nodes = parse("a {% show_page \"x y\" %} b {% broken");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], Node::Text("a "));
        assert_eq!(
            nodes[1],
            Node::Tag {
                raw: "{% show_page \"x y\" %}",
                name: "show_page".to_string(),
                args: vec!["x y".to_string()],
            }
        );
        assert_eq!(nodes[2], Node::Text(" b {% broken"));
    }

    #[test]
    fn test_split_args_quotes() {
        assert_eq!(split_args(" a 'b c'  \"d\" "), vec!["a", "b c", "d"]);
        assert!(split_args("   ").is_empty());
    }

    #[tokio::test]
    async fn test_show_page_includes_and_marks_up() {
        let (db, r) = renderer("").await;
        add_page(&db, "sidebar", "*side*", true).await;

        let html = r
            .render_content("before {% show_page \"sidebar\" %} after", false)
            .await
            .unwrap();
        assert_eq!(html, "before <p><em>side</em></p>\n after");
    }

    #[tokio::test]
    async fn test_missing_page_and_unknown_tag() {
        let (_db, r) = renderer("").await;
        let html = r
            .render_content("{% show_page missing %}{% url 'x' %}", false)
            .await
            .unwrap();
        assert_eq!(html, "{% url 'x' %}");
    }

    #[tokio::test]
    async fn test_wrong_arity_is_render_error() {
        let (_db, r) = renderer("").await;
        let err = r.render_content("{% show_page %}", false).await.unwrap_err();
        assert!(matches!(err, QuireError::Render(_)));
    }

    #[tokio::test]
    async fn test_self_including_page_terminates() {
        let (db, r) = renderer("").await;
        add_page(&db, "loop", "x{% show_page loop %}", false).await;
        let html = r.render_content("{% show_page loop %}", false).await.unwrap();
        assert_eq!(html, "x".repeat(MAX_INCLUDE_DEPTH));
    }

    #[tokio::test]
    async fn test_deep_include_does_not_poison_cache() {
        let (db, r) = renderer("").await;
        for i in 0..10 {
            add_page(&db, &format!("p{}", i), &format!("{{% show_page p{} %}}", i + 1), false).await;
        }
        add_page(&db, "p10", "end", false).await;

        // p0 runs out of include depth before reaching p10
        assert_eq!(r.render_content("{% show_page p0 %}", false).await.unwrap(), "");
        assert_eq!(r.render_content("{% show_page p5 %}", false).await.unwrap(), "end");
    }

    #[tokio::test]
    async fn test_nested_homepage_does_not_poison_cache() {
        let (db, r) = renderer("welcome").await;
        add_page(&db, "welcome", "{% show_page hi %}", false).await;
        add_page(&db, "hi", "hi", false).await;
        for i in 0..6 {
            add_page(&db, &format!("a{}", i), &format!("{{% show_page a{} %}}", i + 1), false).await;
        }
        add_page(&db, "a6", "{% homepage %}", false).await;

        assert_eq!(r.render_content("{% show_page a0 %}", false).await.unwrap(), "");
        assert_eq!(r.homepage().await.unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_show_page_is_cached() {
        let (db, r) = renderer("").await;
        add_page(&db, "block", "v1", false).await;
        assert_eq!(r.render_content("{% show_page block %}", false).await.unwrap(), "v1");

        db.update_page(
            "block",
            &NewPage {
                slug: "block".to_string(),
                title: "block".to_string(),
                content: "v2".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(r.render_content("{% show_page block %}", false).await.unwrap(), "v1");

        r.fragments().invalidate_prefix("page:");
        assert_eq!(r.render_content("{% show_page block %}", false).await.unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_attachment_tags() {
        let (db, r) = renderer("").await;
        let post = db
            .create_post(&NewPost {
                slug: "p".to_string(),
                title: "P".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.create_attachment(&NewAttachment {
            post_id: post.id,
            slug: "slides".to_string(),
            name: "Slides & notes".to_string(),
            file: "attachments/2012/05/04/slides.pdf".to_string(),
        })
        .await
        .unwrap();

        let url = r.render_content("{% post_file_url slides %}", false).await.unwrap();
        assert_eq!(url, "/media/attachments/2012/05/04/slides.pdf");

        let link = r.render_content("{% post_file_link slides %}", false).await.unwrap();
        assert_eq!(
            link,
            "<a href=\"/media/attachments/2012/05/04/slides.pdf\" class=\"post-file-link\">Slides &amp; notes</a>"
        );

        let missing = r.render_content("{% post_file_link nope %}", false).await.unwrap();
        assert_eq!(missing, "");
    }

    #[tokio::test]
    async fn test_homepage() {
        let (db, r) = renderer("welcome").await;
        assert_eq!(r.homepage().await.unwrap(), "");
        r.fragments().invalidate_prefix("homepage:");

        add_page(&db, "welcome", "Hello {% show_page footer %}", false).await;
        add_page(&db, "footer", "bye", false).await;
        assert_eq!(r.homepage().await.unwrap(), "Hello bye");
    }

    #[tokio::test]
    async fn test_analytics_only_when_configured() {
        let (_db, r) = renderer("").await;
        assert_eq!(r.analytics(), "");

        let db = Arc::new(Database::in_memory().await.unwrap());
        let fragments = FragmentCache::new(Arc::new(MemoryCache::new()), Duration::from_secs(30));
        let r = ContentRenderer::new(
            db,
            fragments,
            RenderSettings {
                analytics_code: Some("UA-1".to_string()),
                analytics_domain: Some("example.com".to_string()),
                ..Default::default()
            },
        );
        let html = r.render_content("{% analytics %}", false).await.unwrap();
        assert!(html.contains("UA-1"));
        assert!(html.contains("example.com"));
    }
}
