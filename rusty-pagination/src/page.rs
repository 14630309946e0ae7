//! Page payloads and lazy page resolution.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, try_join_all};
use twilight_model::channel::message::Component;
use twilight_model::channel::message::embed::Embed;

use crate::error::{PaginationError, PaginationResult};

/// A fully resolved page payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageData {
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub components: Vec<Component>,
    /// Marks the page for delivery as an ephemeral interaction response.
    pub ephemeral: bool,
}

impl PageData {
    /// Create a page from plain text content.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Create a page from a single embed.
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }
}

/// A deferred page producer.
///
/// Invoked every time its page is accessed, so the produced content may
/// change between cursor moves. Producers may return further producers;
/// resolution keeps going until a static payload is reached.
pub type DynamicPageFn =
    Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<PageResolvable>> + Send + Sync>;

/// Any input that can be turned into a [`PageData`].
#[derive(Clone)]
pub enum PageResolvable {
    /// Plain text, wrapped as a text-only payload.
    Text(String),
    /// A rich embed, wrapped as a single-embed payload.
    Embed(Embed),
    /// A fully-formed payload, passed through unchanged.
    Page(PageData),
    /// A deferred producer, invoked on access.
    Dynamic(DynamicPageFn),
}

impl PageResolvable {
    /// Wrap a zero-argument async producer as a dynamic page.
    pub fn dynamic<F, Fut>(producer: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<PageResolvable>> + Send + 'static,
    {
        Self::Dynamic(Arc::new(move || Box::pin(producer())))
    }
}

impl fmt::Debug for PageResolvable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Embed(embed) => f.debug_tuple("Embed").field(embed).finish(),
            Self::Page(page) => f.debug_tuple("Page").field(page).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for PageResolvable {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PageResolvable {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Embed> for PageResolvable {
    fn from(value: Embed) -> Self {
        Self::Embed(value)
    }
}

impl From<PageData> for PageResolvable {
    fn from(value: PageData) -> Self {
        Self::Page(value)
    }
}

/// Storage form of a page: resolved up front, or still deferred.
#[derive(Clone)]
pub enum Page {
    Resolved(PageData),
    Dynamic(DynamicPageFn),
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolved(page) => f.debug_tuple("Resolved").field(page).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&Page> for PageResolvable {
    fn from(value: &Page) -> Self {
        match value {
            Page::Resolved(page) => Self::Page(page.clone()),
            Page::Dynamic(producer) => Self::Dynamic(Arc::clone(producer)),
        }
    }
}

/// Resolve a stored page into its payload.
///
/// Deferred producers are invoked and their results resolved again until a
/// static payload is reached. Producer failures surface as
/// [`PaginationError::PageProducer`].
pub async fn resolve_page(page: &Page) -> PaginationResult<PageData> {
    let mut current = match page {
        Page::Resolved(page) => return Ok(page.clone()),
        Page::Dynamic(producer) => producer().await.map_err(PaginationError::PageProducer)?,
    };

    loop {
        current = match current {
            PageResolvable::Text(content) => return Ok(PageData::text(content)),
            PageResolvable::Embed(embed) => return Ok(PageData::embed(embed)),
            PageResolvable::Page(page) => return Ok(page),
            PageResolvable::Dynamic(producer) => {
                producer().await.map_err(PaginationError::PageProducer)?
            }
        };
    }
}

/// Resolve a list of stored pages concurrently.
///
/// The output order always matches the input order, regardless of the order
/// in which individual resolutions complete.
pub async fn resolve_pages(pages: &[Page]) -> PaginationResult<Vec<PageData>> {
    try_join_all(pages.iter().map(resolve_page)).await
}

/// Normalize raw page inputs into storage form.
///
/// Static inputs are resolved eagerly; deferred producers are stored as-is so
/// that pages never visited are never fetched.
pub fn resolve_static_pages(pages: impl IntoIterator<Item = PageResolvable>) -> Vec<Page> {
    pages
        .into_iter()
        .map(|page| match page {
            PageResolvable::Text(content) => Page::Resolved(PageData::text(content)),
            PageResolvable::Embed(embed) => Page::Resolved(PageData::embed(embed)),
            PageResolvable::Page(page) => Page::Resolved(page),
            PageResolvable::Dynamic(producer) => Page::Dynamic(producer),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use twilight_util::builder::embed::EmbedBuilder;

    use super::*;

    fn sample_embed() -> Embed {
        EmbedBuilder::new().description("sample").build()
    }

    #[test]
    fn text_input_becomes_text_payload() {
        let pages = resolve_static_pages([PageResolvable::from("hello")]);

        let Page::Resolved(page) = &pages[0] else {
            panic!("expected resolved page");
        };
        assert_eq!(page.content.as_deref(), Some("hello"));
        assert!(page.embeds.is_empty());
        assert!(page.components.is_empty());
    }

    #[test]
    fn embed_input_becomes_single_embed_payload() {
        let pages = resolve_static_pages([PageResolvable::from(sample_embed())]);

        let Page::Resolved(page) = &pages[0] else {
            panic!("expected resolved page");
        };
        assert_eq!(page.content, None);
        assert_eq!(page.embeds.len(), 1);
    }

    #[test]
    fn dynamic_input_is_not_forced_eagerly() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let producer = PageResolvable::dynamic(|| async {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Ok(PageResolvable::from("produced"))
        });
        let pages = resolve_static_pages([producer]);

        assert!(matches!(pages[0], Page::Dynamic(_)));
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn dynamic_page_resolves_through_nested_producers() {
        let page = resolve_static_pages([PageResolvable::dynamic(|| async {
            Ok(PageResolvable::dynamic(|| async {
                Ok(PageResolvable::from("inner"))
            }))
        })])
        .remove(0);

        let resolved = resolve_page(&page).await.expect("resolution");
        assert_eq!(resolved.content.as_deref(), Some("inner"));
    }

    #[tokio::test]
    async fn producer_error_surfaces_as_resolution_error() {
        let page = resolve_static_pages([PageResolvable::dynamic(|| async {
            anyhow::bail!("backing store unavailable")
        })])
        .remove(0);

        let err = resolve_page(&page).await.expect_err("producer error");
        assert!(matches!(err, PaginationError::PageProducer(_)));
    }

    #[tokio::test]
    async fn batch_resolution_preserves_input_order() {
        let pages = resolve_static_pages([
            PageResolvable::from("first"),
            PageResolvable::dynamic(|| async {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                Ok(PageResolvable::from("second"))
            }),
            PageResolvable::from("third"),
        ]);

        let resolved = resolve_pages(&pages).await.expect("resolution");
        let contents: Vec<_> = resolved
            .iter()
            .map(|page| page.content.as_deref().unwrap())
            .collect();
        assert_eq!(contents, ["first", "second", "third"]);
    }
}
