use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use smart_default::SmartDefault;
use tracing::debug;

use crate::text::stopwords::StopwordSet;
use crate::text::types::{ArticleStat, ArticleStats, FrequencyResult, FrequencyTable};

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid regex"));
static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[(?:\d+|[a-z]|citation needed|clarification needed)\]").expect("valid regex")
});
static TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{.*?\}\}").expect("valid regex"));
static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:[^|\]]*\|)?([^\]]*)\]\]").expect("valid regex"));
static EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>|<!--.*?-->")
        .expect("valid regex")
});
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{Alphabetic}\p{N}'\s]+").expect("valid regex"));

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
];

#[derive(Debug, Clone, SmartDefault)]
pub struct PipelineConfig {
    pub stopwords: StopwordSet,

    /// Tokens with fewer characters than this are discarded.
    #[default = 3]
    pub min_token_len: usize,

    /// Fold simple English plurals onto their singular.
    #[default = false]
    pub fold_plurals: bool,
}

/// Tokens of one document before and after filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTerms {
    pub raw_count: usize,
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TextPipeline {
    config: PipelineConfig,
}

impl TextPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Cleans, tokenizes and filters a single document.
    pub fn document_terms(&self, text: &str) -> DocumentTerms {
        let cleaned = clean(text);
        let tokens: Vec<&str> = cleaned.split_whitespace().collect();

        let terms = tokens
            .iter()
            .map(|token| token.trim_matches('\''))
            .filter(|token| self.keep(token))
            .map(|token| {
                if self.config.fold_plurals {
                    fold_plural(token)
                } else {
                    token.to_string()
                }
            })
            .collect();

        DocumentTerms {
            raw_count: tokens.len(),
            terms,
        }
    }

    fn keep(&self, token: &str) -> bool {
        !token.is_empty()
            && token.chars().count() >= self.config.min_token_len
            && !token.chars().all(|c| c.is_numeric())
            && !self.config.stopwords.contains(token)
    }

    /// Counts terms across `documents`, preserving document order.
    pub fn process<'a, I>(&self, documents: I) -> FrequencyResult
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut terms = FrequencyTable::new();
        let mut articles = Vec::new();

        for (title, text) in documents {
            let document = self.document_terms(text);

            let mut counts: HashMap<&str, u64> = HashMap::new();
            let mut order = Vec::new();
            for term in &document.terms {
                let count = counts.entry(term.as_str()).or_insert(0);
                if *count == 0 {
                    order.push(term.as_str());
                }
                *count += 1;
            }
            for term in order {
                terms.add(term, counts[term]);
            }

            articles.push(ArticleStat {
                title: title.to_string(),
                total_words: document.raw_count,
                filtered_words: document.terms.len(),
            });
        }

        debug!(
            "processed {} documents into {} distinct terms",
            articles.len(),
            terms.len()
        );

        FrequencyResult {
            terms,
            article_stats: ArticleStats { articles },
        }
    }
}

fn clean(text: &str) -> String {
    let mut text = text.to_lowercase();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }

    let text = URL.replace_all(&text, " ");
    let text = HTML_TAG.replace_all(&text, " ");
    let text = CITATION.replace_all(&text, "");
    let text = TEMPLATE.replace_all(&text, " ");
    let text = WIKI_LINK.replace_all(&text, "$1");
    NON_WORD.replace_all(&text, " ").into_owned()
}

/// Visible text of an HTML page: scripts, styles and comments are dropped,
/// tags become whitespace and entities are decoded.
pub fn html_to_text(html: &str) -> String {
    let text = EMBEDDED.replace_all(html, " ");
    let mut text = HTML_TAG.replace_all(&text, " ").into_owned();
    for (entity, replacement) in ENTITIES {
        text = text.replace(entity, replacement);
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn fold_plural(token: &str) -> String {
    if let Some(stem) = token.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return format!("{stem}y");
        }
    }

    let keeps_s = ["ss", "us", "is"].iter().any(|suffix| token.ends_with(suffix));
    match token.strip_suffix('s') {
        Some(stem) if !keeps_s && stem.chars().count() >= 3 => stem.to_string(),
        _ => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pipeline_with(stopwords: &[&str]) -> TextPipeline {
        TextPipeline::new(PipelineConfig {
            stopwords: StopwordSet::new(stopwords),
            ..PipelineConfig::default()
        })
    }

    #[test]
    fn test_stopword_filtering() {
        let pipeline = pipeline_with(&["the", "and"]);
        let document = pipeline.document_terms("the cat and the dog");

        assert_eq!(document.terms, vec!["cat", "dog"]);
        assert_eq!(document.raw_count, 5);
        assert_eq!(document.terms.len(), 2);
    }

    #[test]
    fn test_aggregation_across_documents() {
        let pipeline = pipeline_with(&[]);
        let result = pipeline.process([("One", "alpha alpha beta"), ("Two", "beta gamma")]);

        let entries: Vec<_> = result
            .terms
            .iter()
            .map(|t| (t.word.as_str(), t.count))
            .collect();
        assert_eq!(entries, vec![("alpha", 2), ("beta", 2), ("gamma", 1)]);

        let ranked: Vec<_> = result.terms.ranked(10).into_iter().map(|t| t.word).collect();
        assert_eq!(ranked, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_html_to_text_keeps_visible_text_only() {
        let html = r#"<html><head><title>Atoms</title>
            <style>body { color: red; }</style>
            <script type="text/javascript">var tracking = "nucleus";</script></head>
            <body><!-- hidden note --><h1>Atoms&nbsp;&amp; ions</h1>
            <p>Electrons orbit the <b>nucleus</b>.</p></body></html>"#;

        assert_eq!(
            html_to_text(html),
            "Atoms Atoms & ions Electrons orbit the nucleus ."
        );
    }

    #[test]
    fn test_empty_document() {
        let pipeline = TextPipeline::default();
        let result = pipeline.process([("Blank", "")]);

        assert!(result.terms.is_empty());
        let stat = &result.article_stats.articles[0];
        assert_eq!(stat.total_words, 0);
        assert_eq!(stat.filtered_words, 0);
        assert_eq!(stat.percentage_used(), 0.0);
    }

    #[test]
    fn test_only_stopwords() {
        let pipeline = TextPipeline::default();
        let result = pipeline.process([("Filler", "the and of it was")]);

        let stat = &result.article_stats.articles[0];
        assert_eq!(stat.total_words, 5);
        assert_eq!(stat.filtered_words, 0);
        assert_eq!(stat.percentage_used(), 0.0);
    }

    #[test]
    fn test_markup_is_stripped() {
        let pipeline = pipeline_with(&[]);
        let document = pipeline.document_terms(
            "<p>Quantum <b>field</b></p> theory[12] {{cite web|url=x}} [[Photon|photons]] \
             see https://example.org/wiki/Foo &amp; more",
        );

        assert_eq!(
            document.terms,
            vec!["quantum", "field", "theory", "photons", "see", "more"]
        );
    }

    #[test]
    fn test_short_and_numeric_tokens_dropped() {
        let pipeline = pipeline_with(&[]);
        let document = pipeline.document_terms("an ox ran 1905 3.14 'quoted' far");

        assert_eq!(document.terms, vec!["ran", "quoted", "far"]);
    }

    #[test]
    fn test_filtered_never_exceeds_total() {
        let pipeline = TextPipeline::default();
        let result = pipeline.process([
            ("A", "Electrons orbit the nucleus of an atom."),
            ("B", "!!! ??? ..."),
            ("C", "The 1918 flu pandemic; 'influenza'."),
        ]);

        for stat in &result.article_stats.articles {
            assert!(stat.filtered_words <= stat.total_words);
            let pct = stat.percentage_used();
            assert!((0.0..=100.0).contains(&pct));
        }
    }

    #[test]
    fn test_fold_plurals() {
        let pipeline = TextPipeline::new(PipelineConfig {
            stopwords: StopwordSet::empty(),
            fold_plurals: true,
            ..PipelineConfig::default()
        });
        let result = pipeline.process([("A", "photon photons theories theory class analysis")]);

        assert_eq!(result.terms.get("photon"), Some(2));
        assert_eq!(result.terms.get("theory"), Some(2));
        assert_eq!(result.terms.get("class"), Some(1));
        assert_eq!(result.terms.get("analysis"), Some(1));
    }

    #[test]
    fn test_unicode_letters_survive() {
        let pipeline = pipeline_with(&[]);
        let document = pipeline.document_terms("Café Zürich—naïve");

        assert_eq!(document.terms, vec!["café", "zürich", "naïve"]);
    }
}
