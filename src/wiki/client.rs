use async_trait::async_trait;

use crate::wiki::error::FetchError;

/// Source of category listings, article text and standalone web pages.
#[async_trait]
pub trait WikiClient: Send + Sync {
    /// Titles of the articles in `category`, in the order the API returns them.
    async fn list_pages(&self, category: &str) -> Result<Vec<String>, FetchError>;

    /// Plain text of the article `title`; empty when the page has no text.
    async fn fetch_content(&self, title: &str) -> Result<String, FetchError>;

    /// Raw body of the web page at `url`.
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}
