use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::cache::key::strip_category_prefix;
use crate::wiki::{
    client::WikiClient,
    config::WikiConfig,
    error::{FetchError, RequestError},
    types::{ApiError, CategoryMembersResponse, ExtractResponse, ARTICLE_NAMESPACE},
};

/// MediaWiki `api.php` client.
pub struct LiveWikiClient {
    config: WikiConfig,
    http: Client,
}

impl LiveWikiClient {
    pub fn new(config: WikiConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &WikiConfig {
        &self.config
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, RequestError> {
        let response = self
            .http
            .get(&self.config.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await?;

        let body = checked_body(response).await?;
        serde_json::from_str(&body).map_err(|e| RequestError::Malformed(e.to_string()))
    }

    async fn get_page(&self, url: &str) -> Result<String, RequestError> {
        let response = self.http.get(url).send().await?;
        checked_body(response).await
    }

    async fn members_batch(
        &self,
        title: &str,
        cursor: Option<&str>,
    ) -> Result<(Vec<String>, Option<String>), RequestError> {
        let limit = self.config.effective_page_limit().to_string();
        let mut params = vec![
            ("list", "categorymembers"),
            ("cmtitle", title),
            ("cmlimit", limit.as_str()),
        ];
        if let Some(cursor) = cursor {
            params.push(("cmcontinue", cursor));
        }

        let response: CategoryMembersResponse = self.get_json(&params).await?;
        if let Some(ApiError { code, info }) = response.error {
            return Err(RequestError::Api { code, info });
        }

        let titles = response
            .query
            .map(|q| q.categorymembers)
            .unwrap_or_default()
            .into_iter()
            .filter(|member| member.ns == ARTICLE_NAMESPACE)
            .map(|member| member.title)
            .collect();
        let next = response.continuation.and_then(|c| c.cmcontinue);

        Ok((titles, next))
    }

    async fn extract(&self, title: &str) -> Result<String, RequestError> {
        let response: ExtractResponse = self
            .get_json(&[
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        if let Some(ApiError { code, info }) = response.error {
            return Err(RequestError::Api { code, info });
        }

        let page = response.query.and_then(|q| q.pages.into_iter().next());
        Ok(match page {
            Some(page) if !page.missing => page.extract.unwrap_or_default(),
            _ => {
                debug!("no extract for '{title}'");
                String::new()
            }
        })
    }
}

async fn checked_body(response: reqwest::Response) -> Result<String, RequestError> {
    match response.status() {
        StatusCode::TOO_MANY_REQUESTS => Err(RequestError::RateLimited),
        status if !status.is_success() => Err(RequestError::Status(status.as_u16())),
        _ => Ok(response.text().await?),
    }
}

#[async_trait]
impl WikiClient for LiveWikiClient {
    async fn list_pages(&self, category: &str) -> Result<Vec<String>, FetchError> {
        let title = format!("Category:{}", strip_category_prefix(category.trim()));
        info!("fetching pages in {title}");

        let mut pages = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let (batch, next) = self
                .config
                .retry
                .run(&title, || self.members_batch(&title, cursor.as_deref()))
                .await
                .map_err(|e| FetchError::PageList {
                    category: category.to_string(),
                    attempts: e.attempts,
                    source: e.error,
                })?;

            debug!("received {} members of {title}", batch.len());
            pages.extend(batch);

            match next {
                Some(next) => {
                    cursor = Some(next);
                    tokio::time::sleep(self.config.request_delay).await;
                }
                None => break,
            }
        }

        info!("found {} pages in {title}", pages.len());
        Ok(pages)
    }

    async fn fetch_content(&self, title: &str) -> Result<String, FetchError> {
        let text = self
            .config
            .retry
            .run(title, || self.extract(title))
            .await
            .map_err(|e| FetchError::Content {
                title: title.to_string(),
                attempts: e.attempts,
                source: e.error,
            })?;

        tokio::time::sleep(self.config.request_delay).await;
        Ok(text)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        info!("fetching {url}");
        self.config
            .retry
            .run(url, || self.get_page(url))
            .await
            .map_err(|e| FetchError::Page {
                url: url.to_string(),
                attempts: e.attempts,
                source: e.error,
            })
    }
}
