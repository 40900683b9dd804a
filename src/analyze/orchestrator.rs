use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::analyze::{
    error::{AnalyzeError, PartialContent},
    types::{Analysis, PageContent, PageList, PageText, Source},
};
use crate::cache::{
    key::{strip_category_prefix, CacheKey},
    record::Namespace,
    store::CacheStore,
};
use crate::text::{
    pipeline::{html_to_text, TextPipeline},
    types::FrequencyResult,
};
use crate::wiki::client::WikiClient;

/// Longest title the remote API accepts, in bytes.
const MAX_IDENTIFIER_LEN: usize = 255;
const FORBIDDEN_CHARS: &[char] = &['#', '<', '>', '[', ']', '{', '}', '|'];

/// Cache-first word frequency analysis of categories, web pages and text.
///
/// Each call walks the cache layers cheapest first: a frequency hit returns
/// immediately, a page-list hit skips listing and a content hit skips every
/// remote request. `force_refresh` drops all three layers for the key before
/// rebuilding them, so a forced result is exactly what the next call returns.
pub struct Analyzer {
    store: CacheStore,
    client: Arc<dyn WikiClient>,
    pipeline: TextPipeline,
    /// One mutex per key. Unbounded: evicting a mutex that is still held would
    /// let a later caller lock a fresh one and analyze the same key concurrently.
    in_flight: Cache<CacheKey, Arc<Mutex<()>>>,
    fetch_concurrency: usize,
}

impl Analyzer {
    pub fn new(store: CacheStore, client: Arc<dyn WikiClient>, pipeline: TextPipeline) -> Self {
        Self {
            store,
            client,
            pipeline,
            in_flight: Cache::builder().build(),
            fetch_concurrency: 1,
        }
    }

    /// Number of article requests kept in flight while resolving content.
    pub fn with_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.fetch_concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Analyzes a category by name.
    pub async fn analyze(
        &self,
        identifier: &str,
        force_refresh: bool,
    ) -> Result<Analysis, AnalyzeError> {
        self.analyze_source(Source::Category(identifier.to_string()), force_refresh)
            .await
    }

    /// Analyzes the visible text of the web page at `url`.
    pub async fn analyze_url(&self, url: &str, force_refresh: bool) -> Result<Analysis, AnalyzeError> {
        self.analyze_source(Source::Url(url.to_string()), force_refresh)
            .await
    }

    pub async fn analyze_source(
        &self,
        source: Source,
        force_refresh: bool,
    ) -> Result<Analysis, AnalyzeError> {
        let source = validate_source(source)?;
        let key = source.key();
        let name = source.name().to_string();

        // one analysis per key at a time; racing callers wait and then hit the cache
        let lock = self.lock_for(&key).await;
        let _guard = lock.lock().await;

        let analysis = |result: FrequencyResult,
                        computed_at: DateTime<Utc>,
                        from_cache: bool,
                        skipped_pages: Vec<String>| Analysis {
            key: key.clone(),
            kind: source.kind(),
            name: name.clone(),
            result,
            computed_at,
            from_cache,
            skipped_pages,
        };

        if force_refresh {
            info!("forced refresh of {} '{name}'", source.kind());
            self.invalidate_all(&key).await;
        } else if let Some(record) = self
            .store
            .get::<FrequencyResult>(&key, Namespace::Frequency)
            .await
        {
            info!("using cached word frequencies for '{name}'");
            return Ok(analysis(record.payload, record.created_at, true, Vec::new()));
        }

        let (content, skipped_pages) = match &source {
            Source::Category(category) => {
                let pages = self.resolve_pages(&key, category, force_refresh).await?;
                if pages.titles.is_empty() {
                    warn!("no pages found in category '{category}'");
                    return Ok(analysis(FrequencyResult::default(), Utc::now(), false, Vec::new()));
                }
                self.resolve_content(&key, &pages, force_refresh).await
            }
            Source::Url(url) => (self.resolve_web_page(&key, url, force_refresh).await?, Vec::new()),
            Source::Text { name, text } => (
                PageContent {
                    pages: vec![PageText::new(name.clone(), text.clone())],
                },
                Vec::new(),
            ),
        };

        info!("analyzing word frequencies across {} documents", content.len());
        let result = self.pipeline.process(content.documents());

        if content.is_empty() {
            warn!("no content retrieved for '{name}', result not cached");
        } else {
            self.save(&key, Namespace::Frequency, &result).await;
        }

        Ok(analysis(result, Utc::now(), false, skipped_pages))
    }

    async fn lock_for(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        self.in_flight
            .get_with(key.clone(), async { Arc::new(Mutex::new(())) })
            .await
    }

    /// Drops every layer for `key`, so nothing from before a forced refresh
    /// can be rebuilt by a later call.
    async fn invalidate_all(&self, key: &CacheKey) {
        for namespace in Namespace::ALL {
            if let Err(e) = self.store.invalidate(key, namespace).await {
                warn!("failed to invalidate cached {namespace} for {key}: {e}");
            }
        }
    }

    async fn resolve_pages(
        &self,
        key: &CacheKey,
        category: &str,
        force_refresh: bool,
    ) -> Result<PageList, AnalyzeError> {
        if !force_refresh {
            if let Some(record) = self.store.get::<PageList>(key, Namespace::Pages).await {
                info!(
                    "using cached page list for '{category}' ({} pages)",
                    record.payload.titles.len()
                );
                return Ok(record.payload);
            }
        }

        let pages = PageList {
            titles: self.client.list_pages(category).await?,
        };

        if !pages.titles.is_empty() {
            self.save(key, Namespace::Pages, &pages).await;
        }
        Ok(pages)
    }

    async fn resolve_content(
        &self,
        key: &CacheKey,
        pages: &PageList,
        force_refresh: bool,
    ) -> (PageContent, Vec<String>) {
        if !force_refresh {
            if let Some(record) = self.store.get::<PageContent>(key, Namespace::Content).await {
                info!("loaded {} pages from content cache", record.payload.len());
                return (record.payload, Vec::new());
            }
        }

        info!("fetching content for {} pages", pages.titles.len());
        let fetched: Vec<_> = stream::iter(pages.titles.iter().cloned())
            .map(|title| {
                let client = Arc::clone(&self.client);
                async move {
                    let outcome = client.fetch_content(&title).await;
                    (title, outcome)
                }
            })
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let mut content = PageContent::default();
        let mut skipped = Vec::new();
        for (title, outcome) in fetched {
            match outcome {
                Ok(text) => content.pages.push(PageText::new(title, text)),
                Err(source) => {
                    let partial = PartialContent { title, source };
                    warn!("{partial}: {}", partial.source);
                    skipped.push(partial.title);
                }
            }
        }

        if content.is_empty() {
            warn!("every content request failed, content not cached");
        } else {
            self.save(key, Namespace::Content, &content).await;
        }

        debug!(
            "resolved content: {} fetched, {} skipped",
            content.len(),
            skipped.len()
        );
        (content, skipped)
    }

    async fn resolve_web_page(
        &self,
        key: &CacheKey,
        url: &str,
        force_refresh: bool,
    ) -> Result<PageContent, AnalyzeError> {
        if !force_refresh {
            if let Some(record) = self.store.get::<PageContent>(key, Namespace::Content).await {
                info!("using cached text of {url}");
                return Ok(record.payload);
            }
        }

        let html = self.client.fetch_page(url).await?;
        let content = PageContent {
            pages: vec![PageText::new(url.to_string(), html_to_text(&html))],
        };
        self.save(key, Namespace::Content, &content).await;

        Ok(content)
    }

    async fn save<T: serde::Serialize>(&self, key: &CacheKey, namespace: Namespace, payload: &T) {
        if let Err(e) = self.store.put(key, namespace, payload).await {
            warn!("failed to cache {namespace} for {key}: {e}");
        }
    }
}

/// Checks a user supplied category name and returns it trimmed.
pub fn validate_identifier(identifier: &str) -> Result<String, AnalyzeError> {
    let invalid = |reason| AnalyzeError::InvalidIdentifier {
        identifier: identifier.to_string(),
        reason,
    };

    let trimmed = identifier.trim();
    if trimmed.is_empty() {
        return Err(invalid("name is empty"));
    }
    if trimmed.len() > MAX_IDENTIFIER_LEN {
        return Err(invalid("name is too long"));
    }
    if trimmed.chars().any(|c| c.is_control() || FORBIDDEN_CHARS.contains(&c)) {
        return Err(invalid("name contains characters not allowed in titles"));
    }
    if strip_category_prefix(trimmed).trim().is_empty() {
        return Err(invalid("name has no category after the prefix"));
    }

    Ok(trimmed.to_string())
}

/// Checks that `url` is an absolute http(s) URL and returns it trimmed.
pub fn validate_url(url: &str) -> Result<String, AnalyzeError> {
    let invalid = |reason| AnalyzeError::InvalidIdentifier {
        identifier: url.to_string(),
        reason,
    };

    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(invalid("URL is empty"));
    }
    let parsed = reqwest::Url::parse(trimmed).map_err(|_| invalid("URL is not valid"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("only http and https URLs are supported"));
    }
    if parsed.host_str().is_none() {
        return Err(invalid("URL has no host"));
    }

    Ok(trimmed.to_string())
}

fn validate_source(source: Source) -> Result<Source, AnalyzeError> {
    match source {
        Source::Category(category) => validate_identifier(&category).map(Source::Category),
        Source::Url(url) => validate_url(&url).map(Source::Url),
        Source::Text { name, text } => {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(AnalyzeError::InvalidIdentifier {
                    identifier: name,
                    reason: "file name is empty",
                });
            }
            Ok(Source::text(trimmed, text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::derive_key;
    use crate::wiki::MockWikiClient;

    #[test]
    fn test_validate_identifier() {
        assert_eq!(validate_identifier("  Physics ").unwrap(), "Physics");
        assert_eq!(
            validate_identifier("Category:Quantum mechanics").unwrap(),
            "Category:Quantum mechanics"
        );

        let too_long = "x".repeat(256);
        for bad in ["", "   ", "Category:", "a|b", "x{{y}}", "tab\there", too_long.as_str()] {
            assert!(
                matches!(
                    validate_identifier(bad),
                    Err(AnalyzeError::InvalidIdentifier { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_url() {
        assert_eq!(
            validate_url(" https://example.org/wiki/Atom ").unwrap(),
            "https://example.org/wiki/Atom"
        );

        for bad in ["", "example.org/page", "ftp://example.org/file", "file:///etc/passwd"] {
            assert!(
                matches!(validate_url(bad), Err(AnalyzeError::InvalidIdentifier { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    fn analyzer() -> Analyzer {
        Analyzer::new(
            CacheStore::in_memory(),
            Arc::new(MockWikiClient::new()),
            TextPipeline::default(),
        )
    }

    #[tokio::test]
    async fn test_key_lock_survives_many_other_keys() {
        let analyzer = analyzer();
        let key = derive_key("Physics");
        let held = analyzer.lock_for(&key).await;
        let _guard = held.lock().await;

        for i in 0..2_000 {
            analyzer.lock_for(&derive_key(&format!("Topic {i}"))).await;
        }
        analyzer.in_flight.run_pending_tasks().await;

        let again = analyzer.lock_for(&key).await;
        assert!(Arc::ptr_eq(&held, &again));
        assert!(again.try_lock().is_err());
    }

    #[test]
    fn test_analyze_future_is_send() {
        fn assert_send<T: Send>(_: &T) {}

        let analyzer = analyzer();
        let future = analyzer.analyze("Physics", false);
        assert_send(&future);
    }
}
