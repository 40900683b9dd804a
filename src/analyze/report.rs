use std::fmt::{self, Write};

use chrono::Utc;
use serde::Serialize;

use crate::analyze::types::{Analysis, SourceKind};
use crate::text::types::{ArticleStat, TermCount, MAX_RENDERED_TERMS};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleStatsView {
    pub total_articles: usize,
    pub total_raw_words: usize,
    pub total_filtered_words: usize,
    pub articles: Vec<ArticleStat>,
}

/// Shape handed to renderers and HTTP clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    pub source_type: SourceKind,
    pub source_name: String,
    pub terms: Vec<TermCount>,
    pub article_stats: ArticleStatsView,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_pages: Vec<String>,
}

impl Analysis {
    /// Materializes the top `limit` terms, never more than [`MAX_RENDERED_TERMS`].
    pub fn to_response(&self, limit: usize) -> AnalysisResponse {
        let stats = &self.result.article_stats;

        AnalysisResponse {
            source_type: self.kind,
            source_name: self.name.clone(),
            terms: self.result.terms.ranked(limit.min(MAX_RENDERED_TERMS)),
            article_stats: ArticleStatsView {
                total_articles: stats.total_articles(),
                total_raw_words: stats.total_raw_words(),
                total_filtered_words: stats.total_filtered_words(),
                articles: stats.articles.clone(),
            },
            from_cache: self.from_cache,
            skipped_pages: self.skipped_pages.clone(),
        }
    }
}

/// Plain-text report: ranked terms followed by per-article statistics.
pub fn render_text_report(analysis: &Analysis) -> String {
    let mut out = String::new();
    // formatting into a String never fails
    let _ = write_report(&mut out, analysis);
    out
}

fn write_report(out: &mut impl Write, analysis: &Analysis) -> fmt::Result {
    let stats = &analysis.result.article_stats;
    let source = if analysis.from_cache {
        "cache"
    } else {
        "fresh analysis"
    };

    writeln!(
        out,
        "Word frequency analysis for {}: {}",
        analysis.kind, analysis.name
    )?;
    writeln!(out, "Analysis date: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(
        out,
        "Computed at: {}",
        analysis.computed_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, "Source: {source}\n")?;

    writeln!(
        out,
        "WORD FREQUENCIES (sorted by frequency - top {MAX_RENDERED_TERMS}):"
    )?;
    writeln!(out, "==============================================\n")?;
    for term in analysis.result.terms.ranked(MAX_RENDERED_TERMS) {
        writeln!(out, "{}: {}", term.word, term.count)?;
    }

    writeln!(out, "\n\nARTICLE STATISTICS:")?;
    writeln!(out, "===================\n")?;
    writeln!(out, "Total articles analyzed: {}\n", stats.total_articles())?;
    writeln!(out, "Total words across all articles: {}", stats.total_raw_words())?;
    writeln!(
        out,
        "Total filtered words used for analysis: {}\n",
        stats.total_filtered_words()
    )?;

    writeln!(out, "Per-article word counts:")?;
    writeln!(out, "-----------------------")?;
    for article in stats.by_size() {
        writeln!(
            out,
            "{}: {} words ({} after filtering, {:.1}% used)",
            article.title,
            article.total_words,
            article.filtered_words,
            article.percentage_used()
        )?;
    }

    if !analysis.skipped_pages.is_empty() {
        writeln!(out, "\nSkipped pages ({}):", analysis.skipped_pages.len())?;
        for title in &analysis.skipped_pages {
            writeln!(out, "{title}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::key::derive_key;
    use crate::text::pipeline::{PipelineConfig, TextPipeline};
    use crate::text::stopwords::StopwordSet;

    fn analysis(from_cache: bool) -> Analysis {
        let pipeline = TextPipeline::new(PipelineConfig {
            stopwords: StopwordSet::new(["the"]),
            ..PipelineConfig::default()
        });
        let result = pipeline.process([
            ("Short", "photon photon"),
            ("Long", "the photon and the electron orbit"),
        ]);

        Analysis {
            key: derive_key("Physics"),
            kind: SourceKind::Category,
            name: "Physics".into(),
            result,
            computed_at: Utc::now(),
            from_cache,
            skipped_pages: vec!["Broken".into()],
        }
    }

    #[test]
    fn test_response_shape() {
        let response = analysis(true).to_response(2);

        assert_eq!(response.terms.len(), 2);
        assert_eq!(response.terms[0].word, "photon");
        assert_eq!(response.terms[0].count, 3);
        assert_eq!(response.article_stats.total_articles, 2);
        assert_eq!(response.article_stats.total_raw_words, 8);
        assert!(response.from_cache);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["source_type"], "category");
        assert_eq!(json["source_name"], "Physics");
        assert_eq!(json["terms"][0]["word"], "photon");
        assert_eq!(json["article_stats"]["articles"][1]["title"], "Long");
    }

    #[test]
    fn test_response_limit_is_capped() {
        let response = analysis(false).to_response(10_000);
        assert!(response.terms.len() <= MAX_RENDERED_TERMS);
    }

    #[test]
    fn test_text_report() {
        let report = render_text_report(&analysis(false));

        assert!(report.starts_with("Word frequency analysis for category: Physics"));
        assert!(report.contains("Source: fresh analysis"));
        assert!(report.contains("photon: 3"));
        assert!(report.contains("Total articles analyzed: 2"));
        // larger article listed first
        let long = report.find("Long: 6 words").unwrap();
        let short = report.find("Short: 2 words").unwrap();
        assert!(long < short);
        assert!(report.contains("Skipped pages (1):"));
    }

    #[test]
    fn test_report_header_names_source_kind() {
        let mut page = analysis(false);
        page.kind = SourceKind::Url;
        page.name = "https://example.org/Atom".into();

        let report = render_text_report(&page);
        assert!(report.starts_with("Word frequency analysis for URL: https://example.org/Atom\n"));
    }

    #[test]
    fn test_report_writer_errors_propagate() {
        struct Full;

        impl Write for Full {
            fn write_str(&mut self, _: &str) -> fmt::Result {
                Err(fmt::Error)
            }
        }

        assert!(write_report(&mut Full, &analysis(false)).is_err());
    }
}
