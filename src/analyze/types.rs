use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::cache::key::{derive_key, derive_text_key, derive_url_key, CacheKey};
use crate::text::types::FrequencyResult;

/// What an analysis reads its documents from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A wiki category; every article in it is one document.
    Category(String),
    /// A single web page, reduced to its visible text.
    Url(String),
    /// Text handed over by the caller, such as a local `.txt` file.
    Text { name: String, text: String },
}

impl Source {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Source::Text {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Category(_) => SourceKind::Category,
            Source::Url(_) => SourceKind::Url,
            Source::Text { .. } => SourceKind::File,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Source::Category(name) | Source::Url(name) | Source::Text { name, .. } => name,
        }
    }

    pub fn key(&self) -> CacheKey {
        match self {
            Source::Category(category) => derive_key(category),
            Source::Url(url) => derive_url_key(url),
            Source::Text { name, text } => derive_text_key(name, text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[display("category")]
    Category,
    #[display("URL")]
    Url,
    #[display("file")]
    File,
}

/// Titles of a category's articles, stored in the page-list namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageList {
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageText {
    pub title: String,
    pub text: String,
    pub raw_word_count: usize,
}

impl PageText {
    pub fn new(title: String, text: String) -> Self {
        let raw_word_count = text.split_whitespace().count();
        Self {
            title,
            text,
            raw_word_count,
        }
    }
}

/// Article text for a category, stored in the content namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub pages: Vec<PageText>,
}

impl PageContent {
    pub fn documents(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pages
            .iter()
            .map(|page| (page.title.as_str(), page.text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Outcome of [`crate::analyze::Analyzer::analyze_source`].
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub key: CacheKey,
    pub kind: SourceKind,
    /// Category name, URL or file name as given by the caller.
    pub name: String,
    pub result: FrequencyResult,
    pub computed_at: DateTime<Utc>,
    pub from_cache: bool,
    /// Pages left out because their content could not be fetched.
    pub skipped_pages: Vec<String>,
}
