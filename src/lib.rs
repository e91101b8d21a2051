pub mod batch;
pub mod config;
pub mod discovery;
pub mod exclusions;
pub mod highlight;
pub mod page;
pub mod rewriter;
pub mod session;

// Re-export main types for convenient access
pub use config::Config;
pub use exclusions::{DomainOracle, ExcludedDomain, ExclusionList};
pub use highlight::Highlighter;
pub use page::{Page, RewriteSummary, Segment, SegmentKind};
pub use session::{PageRewriter, Session, Status, StatusReport, ToggleTarget};

// Re-export the text rewriting engine
pub use rewriter::{
    change_markup, fix_verb_number, fix_verb_number_with, Analyzer, Classifier, Document,
    IrregularVerbTable, LexiconAnalyzer, MatchContext, PronounEntry, PronounRewriter, PronounTable, RewriterConfig, SubstitutionEngine,
};

// Re-export batch processing for the CLI and benchmarks
pub use batch::{generate_output_path, process_page_file, write_run_stats, FileStats, RunStats};
pub use discovery::{collect_discovered_files, find_page_files, DiscoveryConfig, FileValidation};
