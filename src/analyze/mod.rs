pub mod error;
pub mod orchestrator;
pub mod report;
pub mod types;

pub use error::{AnalyzeError, PartialContent};
pub use orchestrator::{validate_identifier, validate_url, Analyzer};
pub use report::{render_text_report, AnalysisResponse};
pub use types::{Analysis, PageContent, PageList, PageText, Source, SourceKind};
