// WHY: Per-file processing for the CLI, separated from main.rs so integration tests can drive it
// Each file gets a fresh session; failures are recorded in stats instead of aborting the run

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

use crate::discovery::OUTPUT_MARKER;
use crate::session::{PageRewriter, Status};

/// Per-file processing statistics
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileStats {
    /// Source file path
    pub path: String,
    /// Where the processed page was written, if anything was written
    pub output_path: Option<String>,
    /// Size of the source file
    pub bytes_processed: u64,
    /// Classification outcome; absent when the file could not be processed
    pub status: Option<Status>,
    /// Reason the host is excluded, when it is
    pub why_excluded: Option<String>,
    /// Text segments changed by the processing pass
    pub segments_rewritten: usize,
    /// Text segments left unchanged because analysis failed
    pub segments_failed: usize,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
    /// Error message if processing failed
    pub error: Option<String>,
}

impl FileStats {
    /// Stats for a file that failed before or during processing
    pub fn failed(path: &Path, error: &anyhow::Error, elapsed_ms: u64) -> Self {
        Self {
            path: path.display().to_string(),
            output_path: None,
            bytes_processed: 0,
            status: None,
            why_excluded: None,
            segments_rewritten: 0,
            segments_failed: 0,
            processing_time_ms: elapsed_ms,
            error: Some(format!("{error:#}")),
        }
    }
}

/// Whole-run statistics written by `--stats-out`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RunStats {
    /// Run start as seconds since the Unix epoch
    pub run_start: u64,
    pub total_processing_time_ms: u64,
    pub total_bytes_processed: u64,
    /// Files whose pronouns were rewritten
    pub files_rewritten: usize,
    /// Files processed without rewriting (excluded, highlighted or nothing to change)
    pub files_unchanged: usize,
    pub files_failed: usize,
    pub file_stats: Vec<FileStats>,
}

impl RunStats {
    pub fn new() -> Self {
        let run_start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            run_start,
            ..Self::default()
        }
    }

    pub fn record(&mut self, stats: FileStats) {
        self.total_bytes_processed += stats.bytes_processed;
        match (&stats.error, stats.status) {
            (Some(_), _) | (None, None) => self.files_failed += 1,
            (None, Some(Status::ReplacedPronouns)) => self.files_rewritten += 1,
            (None, Some(_)) => self.files_unchanged += 1,
        }
        self.file_stats.push(stats);
    }

    pub fn finish(&mut self, started: Instant) {
        self.total_processing_time_ms = started.elapsed().as_millis() as u64;
    }
}

/// Output path next to the source: `page.html` -> `page.neutral.html`
pub fn generate_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match source.extension() {
        Some(ext) => format!("{stem}{OUTPUT_MARKER}{}", ext.to_string_lossy()),
        None => format!("{stem}{}html", OUTPUT_MARKER),
    };
    source.with_file_name(name)
}

/// Read, process and write one page
pub async fn process_page_file(
    rewriter: &PageRewriter,
    source: &Path,
    output: &Path,
    host: Option<&str>,
) -> Result<FileStats> {
    let start_time = Instant::now();
    debug!("Processing page: {}", source.display());

    let body = tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read page {}", source.display()))?;

    let session = rewriter.start(host, &body);
    let summary = session.summary();
    if summary.failed > 0 {
        warn!(
            "{} segments of {} could not be analyzed and were left unchanged",
            summary.failed,
            source.display()
        );
    }

    tokio::fs::write(output, session.body())
        .await
        .with_context(|| format!("Failed to write output {}", output.display()))?;

    let stats = FileStats {
        path: source.display().to_string(),
        output_path: Some(output.display().to_string()),
        bytes_processed: body.len() as u64,
        status: Some(session.status()),
        why_excluded: session.report().why_excluded,
        segments_rewritten: summary.rewritten,
        segments_failed: summary.failed,
        processing_time_ms: start_time.elapsed().as_millis() as u64,
        error: None,
    };
    info!(
        "Processed {}: {:?}, {} segments rewritten",
        stats.path, session.status(), stats.segments_rewritten
    );
    Ok(stats)
}

/// Serialize run statistics as pretty JSON
pub async fn write_run_stats(stats: &RunStats, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(stats).context("Failed to serialize run stats")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write stats file {}", path.display()))?;
    info!("Run statistics written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_output_path() {
        assert_eq!(
            generate_output_path(Path::new("site/index.html")),
            PathBuf::from("site/index.neutral.html")
        );
        assert_eq!(generate_output_path(Path::new("a.HTM")), PathBuf::from("a.neutral.HTM"));
        assert_eq!(generate_output_path(Path::new("page")), PathBuf::from("page.neutral.html"));
    }

    #[test]
    fn test_record_counts_outcomes() {
        let mut run = RunStats::new();
        let mut ok = FileStats::failed(Path::new("a.html"), &anyhow::anyhow!("x"), 0);
        ok.error = None;
        ok.status = Some(Status::ReplacedPronouns);
        ok.bytes_processed = 10;
        run.record(ok.clone());
        ok.status = Some(Status::NoGenderedPronouns);
        run.record(ok);
        run.record(FileStats::failed(Path::new("b.html"), &anyhow::anyhow!("unreadable"), 1));

        assert_eq!(run.files_rewritten, 1);
        assert_eq!(run.files_unchanged, 1);
        assert_eq!(run.files_failed, 1);
        assert_eq!(run.total_bytes_processed, 20);
        assert_eq!(run.file_stats.len(), 3);
    }

    #[tokio::test]
    async fn test_process_page_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("bio.html");
        tokio::fs::write(&source, "<p>He writes code.</p>").await.unwrap();
        let output = generate_output_path(&source);

        let rewriter = PageRewriter::with_defaults().unwrap();
        let stats = process_page_file(&rewriter, &source, &output, None).await.unwrap();

        assert_eq!(stats.status, Some(Status::ReplacedPronouns));
        assert_eq!(stats.segments_rewritten, 1);
        let written = tokio::fs::read_to_string(&output).await.unwrap();
        assert_eq!(written, "<p>They write code.</p>");
    }

    #[tokio::test]
    async fn test_missing_source_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let rewriter = PageRewriter::with_defaults().unwrap();
        let source = temp_dir.path().join("missing.html");
        let result = process_page_file(&rewriter, &source, &temp_dir.path().join("out.html"), None).await;
        assert!(result.is_err());
    }
}
