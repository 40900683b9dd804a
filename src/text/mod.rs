pub mod pipeline;
pub mod stopwords;
pub mod types;

pub use pipeline::{html_to_text, DocumentTerms, PipelineConfig, TextPipeline};
pub use stopwords::StopwordSet;
pub use types::{
    ArticleStat, ArticleStats, FrequencyResult, FrequencyTable, TermCount, MAX_RENDERED_TERMS,
};
