//! Unique slug derivation

use quire_core::ports::{SlugIndex, SlugKind};
use quire_core::{numbered, slug_or_null, slugify, QuireError, Result};
use tracing::debug;

/// Slugify `value` and probe `base`, `base-1`, `base-2`, ... until one is free.
/// An empty slug falls back to `null`.
pub async fn unique_slug<I>(index: &I, kind: SlugKind, value: &str) -> Result<String>
where
    I: SlugIndex + ?Sized,
{
    let mut base = slug_or_null(value);
    base.truncate(kind.max_len() - 8);
    let base = base.trim_end_matches('-').to_string();

    let mut candidate = base.clone();
    let mut suffix = 0u32;
    while index.slug_exists(kind, &candidate).await? {
        suffix += 1;
        candidate = numbered(&base, suffix);
    }

    debug!("Resolved {:?} slug {:?} -> {}", kind, value, candidate);
    Ok(candidate)
}

/// Slug for a new row: an explicit slug is normalized and kept as is,
/// a blank one is derived from `title`.
pub async fn resolve_slug<I>(index: &I, kind: SlugKind, explicit: &str, title: &str) -> Result<String>
where
    I: SlugIndex + ?Sized,
{
    if explicit.trim().is_empty() {
        return unique_slug(index, kind, title).await;
    }

    let slug = slugify(explicit);
    if slug.is_empty() {
        return Err(QuireError::InvalidInput(format!(
            "slug {:?} has no usable characters",
            explicit
        )));
    }
    if slug.len() > kind.max_len() {
        return Err(QuireError::InvalidInput(format!(
            "slug longer than {} characters",
            kind.max_len()
        )));
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct FixedIndex(HashSet<&'static str>);

    #[async_trait]
    impl SlugIndex for FixedIndex {
        async fn slug_exists(&self, _kind: SlugKind, slug: &str) -> Result<bool> {
            Ok(self.0.contains(slug))
        }
    }

    #[tokio::test]
    async fn test_free_slug_is_used_directly() {
        let index = FixedIndex(HashSet::new());
        let slug = unique_slug(&index, SlugKind::Post, "Hello World").await.unwrap();
        assert_eq!(slug, "hello-world");
    }

    #[tokio::test]
    async fn test_probes_numbered_suffixes() {
        let index = FixedIndex(["hello", "hello-1", "hello-2"].into_iter().collect());
        let slug = unique_slug(&index, SlugKind::Post, "Hello").await.unwrap();
        assert_eq!(slug, "hello-3");
    }

    #[tokio::test]
    async fn test_empty_title_becomes_null() {
        let index = FixedIndex(["null"].into_iter().collect());
        let slug = unique_slug(&index, SlugKind::Page, "¿?").await.unwrap();
        assert_eq!(slug, "null-1");
    }

    #[tokio::test]
    async fn test_long_titles_leave_room_for_suffix() {
        let index = FixedIndex(HashSet::new());
        let title = "word ".repeat(60);
        let slug = unique_slug(&index, SlugKind::Page, &title).await.unwrap();
        assert!(slug.len() <= SlugKind::Page.max_len());
        assert!(!slug.ends_with('-'));
    }

    #[tokio::test]
    async fn test_explicit_slug_is_normalized_not_probed() {
        let index = FixedIndex(["taken"].into_iter().collect());
        let slug = resolve_slug(&index, SlugKind::Page, "Taken", "ignored")
            .await
            .unwrap();
        assert_eq!(slug, "taken");
        assert!(resolve_slug(&index, SlugKind::Page, "!!", "x").await.is_err());
    }
}
