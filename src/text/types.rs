use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Maximum number of terms materialized for presentation.
pub const MAX_RENDERED_TERMS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    pub word: String,
    pub count: u64,
}

/// Term counts across all documents, kept in first-encountered order.
///
/// The full table is what gets cached; ranking and truncation happen in
/// [`FrequencyTable::ranked`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TermCount>", into = "Vec<TermCount>")]
pub struct FrequencyTable {
    terms: Vec<TermCount>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, word: &str, count: u64) {
        match self.index.get(word) {
            Some(&i) => self.terms[i].count += count,
            None => {
                self.index.insert(word.to_string(), self.terms.len());
                self.terms.push(TermCount {
                    word: word.to_string(),
                    count,
                });
            }
        }
    }

    pub fn get(&self, word: &str) -> Option<u64> {
        self.index.get(word).map(|&i| self.terms[i].count)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms in first-encountered order.
    pub fn iter(&self) -> impl Iterator<Item = &TermCount> {
        self.terms.iter()
    }

    /// Most frequent terms first; ties keep first-encountered order.
    pub fn ranked(&self, limit: usize) -> Vec<TermCount> {
        let mut ranked = self.terms.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(limit);
        ranked
    }
}

impl From<Vec<TermCount>> for FrequencyTable {
    fn from(entries: Vec<TermCount>) -> Self {
        let mut table = Self::new();
        for entry in entries {
            table.add(&entry.word, entry.count);
        }
        table
    }
}

impl From<FrequencyTable> for Vec<TermCount> {
    fn from(table: FrequencyTable) -> Self {
        table.terms
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStat {
    pub title: String,
    pub total_words: usize,
    pub filtered_words: usize,
}

impl ArticleStat {
    /// Share of the article's tokens that survived filtering, in percent.
    pub fn percentage_used(&self) -> f64 {
        if self.total_words == 0 {
            return 0.0;
        }
        self.filtered_words as f64 / self.total_words as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleStats {
    pub articles: Vec<ArticleStat>,
}

impl ArticleStats {
    pub fn total_articles(&self) -> usize {
        self.articles.len()
    }

    pub fn total_raw_words(&self) -> usize {
        self.articles.iter().map(|a| a.total_words).sum()
    }

    pub fn total_filtered_words(&self) -> usize {
        self.articles.iter().map(|a| a.filtered_words).sum()
    }

    /// Articles ordered by raw word count, largest first.
    pub fn by_size(&self) -> Vec<&ArticleStat> {
        let mut articles: Vec<_> = self.articles.iter().collect();
        articles.sort_by(|a, b| b.total_words.cmp(&a.total_words));
        articles
    }
}

/// Terminal artifact of an analysis, stored in the frequency namespace.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyResult {
    pub terms: FrequencyTable,
    pub article_stats: ArticleStats,
}
