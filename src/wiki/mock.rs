use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::cache::key::strip_category_prefix;
use crate::wiki::{
    client::WikiClient,
    error::{FetchError, RequestError},
};

/// In-memory [`WikiClient`] that records how often it is called.
///
/// Categories and failing pages can be changed between calls to simulate a
/// wiki that is edited while results are cached.
#[derive(Debug, Default)]
pub struct MockWikiClient {
    categories: RwLock<HashMap<String, Vec<String>>>,
    pages: HashMap<String, String>,
    web: HashMap<String, String>,
    failing: RwLock<HashSet<String>>,
    list_calls: AtomicUsize,
    content_calls: AtomicUsize,
    page_calls: AtomicUsize,
}

impl MockWikiClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category<I, S>(mut self, name: &str, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.get_mut().insert(
            name.to_string(),
            titles.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn with_page(mut self, title: &str, text: &str) -> Self {
        self.pages.insert(title.to_string(), text.to_string());
        self
    }

    /// Serves `body` for requests to `url`.
    pub fn with_web_page(mut self, url: &str, body: &str) -> Self {
        self.web.insert(url.to_string(), body.to_string());
        self
    }

    /// Makes every content request for `title` fail.
    pub fn with_failing_page(mut self, title: &str) -> Self {
        self.failing.get_mut().insert(title.to_string());
        self
    }

    /// Replaces the members of `name`.
    pub async fn set_category<I, S>(&self, name: &str, titles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories.write().await.insert(
            name.to_string(),
            titles.into_iter().map(Into::into).collect(),
        );
    }

    pub async fn set_failing(&self, title: &str, failing: bool) {
        let mut set = self.failing.write().await;
        if failing {
            set.insert(title.to_string());
        } else {
            set.remove(title);
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn content_calls(&self) -> usize {
        self.content_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn reset_counts(&self) {
        self.list_calls.store(0, Ordering::SeqCst);
        self.content_calls.store(0, Ordering::SeqCst);
        self.page_calls.store(0, Ordering::SeqCst);
    }
}

#[async_trait]
impl WikiClient for MockWikiClient {
    async fn list_pages(&self, category: &str) -> Result<Vec<String>, FetchError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        self.categories
            .read()
            .await
            .get(strip_category_prefix(category.trim()))
            .cloned()
            .ok_or_else(|| FetchError::PageList {
                category: category.to_string(),
                attempts: 1,
                source: RequestError::Status(404),
            })
    }

    async fn fetch_content(&self, title: &str) -> Result<String, FetchError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.read().await.contains(title) {
            return Err(FetchError::Content {
                title: title.to_string(),
                attempts: 1,
                source: RequestError::Status(503),
            });
        }

        Ok(self.pages.get(title).cloned().unwrap_or_default())
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);

        self.web.get(url).cloned().ok_or_else(|| FetchError::Page {
            url: url.to_string(),
            attempts: 1,
            source: RequestError::Status(404),
        })
    }
}
